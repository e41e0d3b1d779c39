/// Construction-time settings for a [`Dispatcher`](crate::Dispatcher).
///
/// The collaborator references (execution substrate, registry, telemetry
/// sink) are handed to `Dispatcher::new` directly; nothing is read from
/// global or environment state.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Identifier tag stamped on every telemetry span this scheduler emits.
    pub scheduler_id: String,
    /// Enable per-firing state transition logs (claim accepted, releasing,
    /// rejected-and-dropped). Off by default; rejections are expected
    /// outcomes, not faults.
    pub debug_logging: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            scheduler_id: "quartz".to_string(),
            debug_logging: false,
        }
    }
}

impl DispatcherConfig {
    pub fn new(scheduler_id: impl Into<String>) -> Self {
        Self {
            scheduler_id: scheduler_id.into(),
            ..Default::default()
        }
    }

    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }
}
