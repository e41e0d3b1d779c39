//! Shared helpers for dispatcher integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tokio::time::{sleep, Instant};

use quartz_lite::config::DispatcherConfig;
use quartz_lite::dispatcher::Dispatcher;
use quartz_lite::error::{QuartzError, Result};
use quartz_lite::job::{NodeId, WorkUnit};
use quartz_lite::launcher::{ExecutionHandle, TaskLauncher};
use quartz_lite::registry::{ClaimOutcome, ExecutionRegistry, InMemoryRegistry};
use quartz_lite::telemetry::CollectingSink;

/// Build a dispatcher wired to a collecting telemetry sink.
pub fn dispatcher_with(
    launcher: Arc<dyn TaskLauncher>,
    registry: Arc<dyn ExecutionRegistry>,
) -> (Dispatcher, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let dispatcher = Dispatcher::new(
        DispatcherConfig::new("test-scheduler").with_debug_logging(true),
        launcher,
        registry,
        sink.clone(),
    );
    (dispatcher, sink)
}

/// Work unit that completes immediately with `value`.
#[allow(dead_code)]
pub fn quick_work(value: Value) -> WorkUnit {
    WorkUnit::callable(move || {
        let value = value.clone();
        async move { value }
    })
}

/// Work unit that stays in flight until `gate` is notified.
#[allow(dead_code)]
pub fn gated_work(gate: Arc<Notify>) -> WorkUnit {
    WorkUnit::callable(move || {
        let gate = gate.clone();
        async move {
            gate.notified().await;
            json!("released")
        }
    })
}

/// Work unit that panics with `reason` when executed.
#[allow(dead_code)]
pub fn faulting_work(reason: &'static str) -> WorkUnit {
    WorkUnit::callable(move || async move {
        let missing: Option<Value> = None;
        missing.expect(reason)
    })
}

/// Registry wrapper that counts contract calls.
#[allow(dead_code)]
#[derive(Default)]
pub struct CountingRegistry {
    inner: InMemoryRegistry,
    running: AtomicUsize,
    finished: AtomicUsize,
}

#[allow(dead_code)]
impl CountingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_running_calls(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    pub fn mark_finished_calls(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionRegistry for CountingRegistry {
    async fn mark_running(&self, job: &str, node: &NodeId) -> ClaimOutcome {
        self.running.fetch_add(1, Ordering::SeqCst);
        self.inner.mark_running(job, node).await
    }

    async fn mark_finished(&self, job: &str, node: &NodeId) {
        self.finished.fetch_add(1, Ordering::SeqCst);
        self.inner.mark_finished(job, node).await;
    }
}

/// Launcher whose target node is never reachable.
#[allow(dead_code)]
pub struct UnreachableLauncher;

#[async_trait]
impl TaskLauncher for UnreachableLauncher {
    async fn launch(&self, node: &NodeId, _work: WorkUnit) -> Result<ExecutionHandle> {
        Err(QuartzError::NodeUnreachable(node.to_string()))
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub async fn assert_eventually<F, Fut>(timeout: Duration, description: &str, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition().await {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {}", description);
}
