//! Cluster-wide running-state registry contract.
//!
//! The registry is the authoritative store of "is job X currently running"
//! across the cluster. The dispatcher only speaks this two-phase contract
//! and never replicates the registry's consensus logic: `mark_running` is
//! trusted to be atomic cluster-wide for a given job name.

mod memory;

pub use memory::InMemoryRegistry;

use async_trait::async_trait;

use crate::job::NodeId;

/// Outcome of a claim attempt for a `(job name, node)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The firing now holds the claim and must release it when it ends.
    Accepted,
    /// Another instance already holds (or is concurrently claiming) the same
    /// job name somewhere in the cluster. The firing is dropped.
    Rejected,
}

#[async_trait]
pub trait ExecutionRegistry: Send + Sync {
    /// Attempt to mark `job` as running on `node`.
    async fn mark_running(&self, job: &str, node: &NodeId) -> ClaimOutcome;

    /// Release a previously accepted claim. The dispatcher does not await
    /// cluster-wide acknowledgment beyond this call returning.
    async fn mark_finished(&self, job: &str, node: &NodeId);
}
