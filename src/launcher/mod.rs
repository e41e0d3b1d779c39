//! Remote execution substrate contract.
//!
//! A launcher runs a unit of work on a cluster node and hands back a handle
//! the dispatcher can await. The handle resolves to exactly one terminal
//! signal: the work returned a value, or the work died without producing
//! one.

mod local;

pub use local::{FunctionTable, LocalLauncher};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::Result;
use crate::job::{NodeId, WorkUnit};

/// Fault captured from a work unit that terminated without a completion
/// value.
#[derive(Debug, Clone)]
pub struct Fault {
    pub reason: String,
    pub stacktrace: String,
}

impl Fault {
    pub fn new(reason: impl Into<String>, stacktrace: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            stacktrace: stacktrace.into(),
        }
    }
}

/// The single completion-or-crash event that ends a firing's execution.
#[derive(Debug, Clone)]
pub enum TerminalSignal {
    Completed(Value),
    Crashed(Fault),
}

/// An in-flight remote computation. Created at launch, consumed exactly
/// once by the waiting dispatch call.
#[derive(Debug)]
pub struct ExecutionHandle {
    rx: oneshot::Receiver<TerminalSignal>,
}

impl ExecutionHandle {
    /// Pair a handle with the sender its substrate resolves it through.
    /// The oneshot guarantees at-most-one resolution.
    pub fn channel() -> (oneshot::Sender<TerminalSignal>, ExecutionHandle) {
        let (tx, rx) = oneshot::channel();
        (tx, ExecutionHandle { rx })
    }

    /// Suspend until the terminal signal arrives.
    ///
    /// A substrate that drops its sender without resolving counts as a
    /// crash: the work demonstrably ended without a completion value.
    pub async fn wait(self) -> TerminalSignal {
        match self.rx.await {
            Ok(signal) => signal,
            Err(_) => TerminalSignal::Crashed(Fault::new(
                "execution substrate dropped the handle before resolving it",
                String::new(),
            )),
        }
    }
}

#[async_trait]
pub trait TaskLauncher: Send + Sync {
    /// Start `work` on `node`. An error means the work could not be started
    /// at all (unknown function, unreachable node); post-launch faults
    /// arrive through the returned handle instead.
    async fn launch(&self, node: &NodeId, work: WorkUnit) -> Result<ExecutionHandle>;
}
