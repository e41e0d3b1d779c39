pub mod config;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod launcher;
pub mod registry;
pub mod shutdown;
pub mod telemetry;

pub use config::DispatcherConfig;
pub use dispatcher::{DispatchPipeline, Dispatcher};
pub use job::{Job, NodeId, SelectionEvent, WorkUnit};
