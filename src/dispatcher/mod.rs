//! Execution dispatcher: per-firing orchestration of claim, launch, and
//! telemetry.
//!
//! A selection event pairs a job with the node chosen to run it. The
//! dispatcher inspects the job's overlap policy, claims the name through the
//! registry when overlapping runs are forbidden, launches the work on the
//! node, awaits the single terminal signal, and releases the claim on
//! completion, on crash, and on launch failure alike. Internal failures are
//! contained and reported through telemetry; `dispatch` never fails from
//! the caller's point of view.

mod pipeline;

pub use pipeline::DispatchPipeline;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use crate::config::DispatcherConfig;
use crate::job::{Job, NodeId, SelectionEvent};
use crate::launcher::{Fault, TaskLauncher, TerminalSignal};
use crate::registry::{ClaimOutcome, ExecutionRegistry};
use crate::telemetry::{SpanTags, TelemetryEvent, TelemetrySink};

/// Dispatches firings produced by the node selector.
#[derive(Clone)]
pub struct Dispatcher {
    launcher: Arc<dyn TaskLauncher>,
    registry: Arc<dyn ExecutionRegistry>,
    telemetry: Arc<dyn TelemetrySink>,
    scheduler_id: String,
    debug_logging: bool,
}

impl Dispatcher {
    pub fn new(
        config: DispatcherConfig,
        launcher: Arc<dyn TaskLauncher>,
        registry: Arc<dyn ExecutionRegistry>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            launcher,
            registry,
            telemetry,
            scheduler_id: config.scheduler_id,
            debug_logging: config.debug_logging,
        }
    }

    /// Dispatch one firing of `job` on `node`.
    ///
    /// Overlap-allowed jobs are launched and forgotten: the call returns
    /// immediately and the span is recorded asynchronously, with no registry
    /// interaction. No-overlap jobs run the claim protocol and suspend the
    /// calling task until the terminal signal arrives, so the claim is
    /// released exactly when the job finishes, not sooner.
    pub async fn dispatch(&self, job: Job, node: NodeId) {
        let firing = Uuid::new_v4();
        if job.overlap_allowed {
            let this = self.clone();
            tokio::spawn(async move {
                this.invoke(firing, &job, &node).await;
            });
        } else {
            self.dispatch_exclusive(firing, job, node).await;
        }
    }

    /// Dispatch a selection event. One event, one firing.
    pub async fn dispatch_event(&self, event: SelectionEvent) {
        self.dispatch(event.job, event.node).await;
    }

    /// Claim → run → release for jobs that forbid overlapping runs.
    ///
    /// A rejected claim drops the firing: at-most-one-instance, never
    /// queued-retry. An accepted claim is released on every terminal signal
    /// with no exception; a leaked claim would permanently wedge the job
    /// name.
    async fn dispatch_exclusive(&self, firing: Uuid, job: Job, node: NodeId) {
        match self.registry.mark_running(&job.name, &node).await {
            ClaimOutcome::Rejected => {
                self.debug_log(firing, &job.name, &node, "claim rejected, firing dropped");
            }
            ClaimOutcome::Accepted => {
                self.debug_log(firing, &job.name, &node, "claim accepted, launching");
                self.invoke(firing, &job, &node).await;
                self.debug_log(firing, &job.name, &node, "releasing claim");
                self.registry.mark_finished(&job.name, &node).await;
            }
        }
    }

    /// Launch the work unit on `node` and emit the span events around it.
    ///
    /// Exactly one `job.start` is emitted, then exactly one of `job.stop` /
    /// `job.exception`. A launch failure is reported the same way as a
    /// post-launch fault, so the exclusive path above still reaches its
    /// release.
    async fn invoke(&self, firing: Uuid, job: &Job, node: &NodeId) -> TerminalSignal {
        let tags = SpanTags {
            job: job.name.clone(),
            node: node.clone(),
            scheduler: self.scheduler_id.clone(),
        };
        let started = Instant::now();
        self.telemetry.emit(TelemetryEvent::JobStart {
            tags: tags.clone(),
            system_time: Utc::now(),
        });

        let signal = match self.launcher.launch(node, job.work.clone()).await {
            Ok(handle) => handle.wait().await,
            Err(err) => {
                self.debug_log(firing, &job.name, node, "launch failed");
                TerminalSignal::Crashed(Fault::new(err.to_string(), String::new()))
            }
        };

        // Monotonic delta, insulated from wall-clock adjustments.
        let duration = started.elapsed();
        match &signal {
            TerminalSignal::Completed(result) => {
                self.telemetry.emit(TelemetryEvent::JobStop {
                    tags,
                    duration,
                    result: result.clone(),
                });
            }
            TerminalSignal::Crashed(fault) => {
                self.telemetry.emit(TelemetryEvent::JobException {
                    tags,
                    duration,
                    reason: fault.reason.clone(),
                    stacktrace: fault.stacktrace.clone(),
                });
            }
        }
        signal
    }

    fn debug_log(&self, firing: Uuid, job: &str, node: &NodeId, message: &str) {
        if self.debug_logging {
            tracing::debug!(firing = %firing, job = %job, node = %node, "{}", message);
        }
    }
}
