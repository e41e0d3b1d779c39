use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque cluster-member identifier (address or name). Carries no ownership
/// semantics; used only to route execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(addr: &str) -> Self {
        Self(addr.to_string())
    }
}

/// Future produced by a work unit, resolving to the job's return value.
pub type WorkFuture = Pin<Box<dyn Future<Output = Value> + Send>>;

/// Zero-argument callable form of a work unit.
pub type Callable = Arc<dyn Fn() -> WorkFuture + Send + Sync>;

/// Unit of work carried by a job.
///
/// Closed over exactly two shapes: a zero-argument callable invoked as-is,
/// and a named `(module, function, args)` invocation resolved against the
/// execution substrate's function table at launch time.
#[derive(Clone)]
pub enum WorkUnit {
    Callable(Callable),
    ModuleFunctionArgs {
        module: String,
        function: String,
        args: Vec<Value>,
    },
}

impl WorkUnit {
    /// Wrap an async closure as a callable work unit.
    pub fn callable<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        WorkUnit::Callable(Arc::new(move || -> WorkFuture { Box::pin(f()) }))
    }

    /// A dynamic invocation of `module.function` with exactly `args`.
    pub fn module_function_args(
        module: impl Into<String>,
        function: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        WorkUnit::ModuleFunctionArgs {
            module: module.into(),
            function: function.into(),
            args,
        }
    }
}

impl fmt::Debug for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkUnit::Callable(_) => f.write_str("WorkUnit::Callable"),
            WorkUnit::ModuleFunctionArgs {
                module,
                function,
                args,
            } => f
                .debug_struct("WorkUnit::ModuleFunctionArgs")
                .field("module", module)
                .field("function", function)
                .field("args", args)
                .finish(),
        }
    }
}

/// A job definition. Immutable once dispatched.
///
/// `overlap_allowed` decides the dispatch path: overlap-allowed jobs are
/// launched and forgotten, no-overlap jobs run the cluster-wide claim
/// protocol so at most one firing of the name executes at a time.
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub overlap_allowed: bool,
    pub work: WorkUnit,
}

impl Job {
    pub fn new(name: impl Into<String>, work: WorkUnit) -> Self {
        Self {
            name: name.into(),
            overlap_allowed: true,
            work,
        }
    }

    pub fn with_overlap(mut self, allowed: bool) -> Self {
        self.overlap_allowed = allowed;
        self
    }
}

/// A job paired with the node chosen to run it, as emitted by the node
/// selector. One event triggers exactly one dispatch; the pairing exists
/// only for the duration of that firing and is never persisted.
#[derive(Debug, Clone)]
pub struct SelectionEvent {
    pub job: Job,
    pub node: NodeId,
}

impl SelectionEvent {
    pub fn new(job: Job, node: NodeId) -> Self {
        Self { job, node }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_allows_overlap_by_default() {
        let job = Job::new("metrics", WorkUnit::callable(|| async { json!(null) }));
        assert!(job.overlap_allowed);
        assert_eq!(job.name, "metrics");
    }

    #[test]
    fn job_with_overlap_disallowed() {
        let job = Job::new("report", WorkUnit::callable(|| async { json!(null) }))
            .with_overlap(false);
        assert!(!job.overlap_allowed);
    }

    #[test]
    fn node_id_display_and_accessors() {
        let node = NodeId::from("worker-3:7070");
        assert_eq!(node.as_str(), "worker-3:7070");
        assert_eq!(node.to_string(), "worker-3:7070");
        assert_eq!(node, NodeId::new("worker-3:7070"));
    }

    #[test]
    fn module_function_args_keeps_arguments() {
        let work = WorkUnit::module_function_args("reports", "aggregate", vec![json!(7)]);
        match work {
            WorkUnit::ModuleFunctionArgs {
                module,
                function,
                args,
            } => {
                assert_eq!(module, "reports");
                assert_eq!(function, "aggregate");
                assert_eq!(args, vec![json!(7)]);
            }
            WorkUnit::Callable(_) => panic!("expected a module/function work unit"),
        }
    }

    #[test]
    fn work_unit_debug_is_opaque_for_callables() {
        let work = WorkUnit::callable(|| async { json!(null) });
        assert_eq!(format!("{:?}", work), "WorkUnit::Callable");
    }
}
