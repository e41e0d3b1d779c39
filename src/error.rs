use thiserror::Error;

/// Errors raised by an execution substrate when a unit of work cannot be
/// started at all. Post-launch faults travel through the execution handle
/// instead, and nothing here ever reaches the dispatcher's caller: every
/// variant is contained and surfaced as a `job.exception` telemetry event.
#[derive(Error, Debug)]
pub enum QuartzError {
    #[error("no handler registered for {module}.{function}")]
    UnknownFunction { module: String, function: String },

    #[error("node {0} unreachable")]
    NodeUnreachable(String),

    #[error("execution substrate error: {0}")]
    Substrate(String),
}

pub type Result<T> = std::result::Result<T, QuartzError>;
