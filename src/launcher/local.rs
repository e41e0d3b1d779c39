use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::task::JoinError;

use super::{ExecutionHandle, Fault, TaskLauncher, TerminalSignal};
use crate::error::{QuartzError, Result};
use crate::job::{NodeId, WorkFuture, WorkUnit};

/// Handler invoked for `(module, function)` work units.
pub type FunctionHandler = Arc<dyn Fn(Vec<Value>) -> WorkFuture + Send + Sync>;

/// Name-keyed table of dynamically invocable functions.
///
/// The runtime has no reflection; dynamic `module.function` dispatch is a
/// lookup in this table, populated at substrate construction. An unknown
/// name is a launch failure, not a crash of the dispatching task.
#[derive(Default, Clone)]
pub struct FunctionTable {
    handlers: HashMap<String, FunctionHandler>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `module.function`, replacing any previous
    /// handler with the same name.
    pub fn register<F, Fut>(
        mut self,
        module: impl Into<String>,
        function: impl Into<String>,
        handler: F,
    ) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        self.handlers.insert(
            Self::key(&module.into(), &function.into()),
            Arc::new(move |args: Vec<Value>| -> WorkFuture { Box::pin(handler(args)) }),
        );
        self
    }

    pub fn resolve(&self, module: &str, function: &str) -> Option<FunctionHandler> {
        self.handlers.get(&Self::key(module, function)).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn key(module: &str, function: &str) -> String {
        format!("{}.{}", module, function)
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("FunctionTable").field("handlers", &names).finish()
    }
}

/// Executes work units on the local runtime.
///
/// The single-node rendition of the remote execution substrate: the chosen
/// node is trusted to be this process. Each work unit runs in its own task,
/// so a panicking work unit surfaces as a `Crashed` signal instead of
/// unwinding through the dispatcher.
#[derive(Debug, Default, Clone)]
pub struct LocalLauncher {
    functions: Arc<FunctionTable>,
}

impl LocalLauncher {
    pub fn new(functions: FunctionTable) -> Self {
        Self {
            functions: Arc::new(functions),
        }
    }
}

#[async_trait]
impl TaskLauncher for LocalLauncher {
    async fn launch(&self, node: &NodeId, work: WorkUnit) -> Result<ExecutionHandle> {
        // Resolution failures are launch errors; everything past this point
        // is reported through the handle.
        let task = match work {
            WorkUnit::Callable(f) => tokio::spawn(async move { f().await }),
            WorkUnit::ModuleFunctionArgs {
                module,
                function,
                args,
            } => match self.functions.resolve(&module, &function) {
                Some(handler) => tokio::spawn(async move { handler(args).await }),
                None => return Err(QuartzError::UnknownFunction { module, function }),
            },
        };

        let (tx, handle) = ExecutionHandle::channel();
        let node = node.clone();
        tokio::spawn(async move {
            let signal = match task.await {
                Ok(value) => TerminalSignal::Completed(value),
                Err(err) => TerminalSignal::Crashed(fault_from_join_error(err)),
            };
            if tx.send(signal).is_err() {
                tracing::debug!(node = %node, "terminal signal dropped, waiter went away");
            }
        });

        Ok(handle)
    }
}

fn fault_from_join_error(err: JoinError) -> Fault {
    if err.is_panic() {
        let reason = match err.into_panic().downcast::<String>() {
            Ok(msg) => *msg,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(msg) => (*msg).to_string(),
                Err(_) => "work unit panicked".to_string(),
            },
        };
        Fault::new(reason, Backtrace::force_capture().to_string())
    } else {
        Fault::new(err.to_string(), String::new())
    }
}
