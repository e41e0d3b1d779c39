//! Span events emitted around every job invocation.
//!
//! Observability is a side channel: emission never influences dispatch
//! outcomes, and operators observe job failures exclusively through these
//! events.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::job::NodeId;

/// Identifying tags attached to every span event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanTags {
    pub job: String,
    pub node: NodeId,
    pub scheduler: String,
}

/// Every launch emits exactly one `JobStart` and then exactly one of
/// `JobStop` / `JobException`, never both, never neither.
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    /// Emitted immediately before the work unit is launched.
    JobStart {
        tags: SpanTags,
        system_time: DateTime<Utc>,
    },
    /// Normal return. `result` is the job's return value, uninterpreted:
    /// an error-shaped value still counts as a normal stop.
    JobStop {
        tags: SpanTags,
        duration: Duration,
        result: Value,
    },
    /// The work unit faulted, or could not be launched at all.
    JobException {
        tags: SpanTags,
        duration: Duration,
        reason: String,
        stacktrace: String,
    },
}

impl TelemetryEvent {
    pub fn tags(&self) -> &SpanTags {
        match self {
            TelemetryEvent::JobStart { tags, .. }
            | TelemetryEvent::JobStop { tags, .. }
            | TelemetryEvent::JobException { tags, .. } => tags,
        }
    }
}

/// Receives span events from the dispatcher.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: TelemetryEvent);
}

/// Renders span events as structured `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn emit(&self, event: TelemetryEvent) {
        match event {
            TelemetryEvent::JobStart { tags, system_time } => {
                tracing::info!(
                    job = %tags.job,
                    node = %tags.node,
                    scheduler = %tags.scheduler,
                    system_time = %system_time,
                    "job.start"
                );
            }
            TelemetryEvent::JobStop {
                tags,
                duration,
                result,
            } => {
                tracing::info!(
                    job = %tags.job,
                    node = %tags.node,
                    scheduler = %tags.scheduler,
                    duration_ms = duration.as_millis() as u64,
                    result = %result,
                    "job.stop"
                );
            }
            TelemetryEvent::JobException {
                tags,
                duration,
                reason,
                stacktrace,
            } => {
                tracing::error!(
                    job = %tags.job,
                    node = %tags.node,
                    scheduler = %tags.scheduler,
                    duration_ms = duration.as_millis() as u64,
                    reason = %reason,
                    stacktrace = %stacktrace,
                    "job.exception"
                );
            }
        }
    }
}

/// Accumulates events in memory so tests can assert on exact emission.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().expect("telemetry sink poisoned").clone()
    }

    pub fn starts(&self) -> usize {
        self.count(|e| matches!(e, TelemetryEvent::JobStart { .. }))
    }

    pub fn stops(&self) -> usize {
        self.count(|e| matches!(e, TelemetryEvent::JobStop { .. }))
    }

    pub fn exceptions(&self) -> usize {
        self.count(|e| matches!(e, TelemetryEvent::JobException { .. }))
    }

    fn count(&self, pred: impl Fn(&TelemetryEvent) -> bool) -> usize {
        self.events
            .lock()
            .expect("telemetry sink poisoned")
            .iter()
            .filter(|e| pred(e))
            .count()
    }
}

impl TelemetrySink for CollectingSink {
    fn emit(&self, event: TelemetryEvent) {
        self.events
            .lock()
            .expect("telemetry sink poisoned")
            .push(event);
    }
}
