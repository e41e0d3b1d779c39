use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ClaimOutcome, ExecutionRegistry};
use crate::job::NodeId;

/// In-process registry used for single-node deployments and tests.
///
/// Claims are a `job name → node` map behind a mutex; insert-if-absent is
/// the whole accept/reject decision, which makes `mark_running` atomic for
/// a given name within this process.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    claims: Mutex<HashMap<String, NodeId>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current holder of the claim on `job`, if any.
    pub async fn holder(&self, job: &str) -> Option<NodeId> {
        self.claims.lock().await.get(job).cloned()
    }
}

#[async_trait]
impl ExecutionRegistry for InMemoryRegistry {
    async fn mark_running(&self, job: &str, node: &NodeId) -> ClaimOutcome {
        let mut claims = self.claims.lock().await;
        if claims.contains_key(job) {
            ClaimOutcome::Rejected
        } else {
            claims.insert(job.to_string(), node.clone());
            ClaimOutcome::Accepted
        }
    }

    async fn mark_finished(&self, job: &str, node: &NodeId) {
        let mut claims = self.claims.lock().await;
        // A release from a node that does not hold the claim is stale;
        // it must not evict the current holder.
        if claims.get(job) == Some(node) {
            claims.remove(job);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_claim_is_accepted() {
        let registry = InMemoryRegistry::new();
        let node = NodeId::from("node-a");

        assert_eq!(
            registry.mark_running("report", &node).await,
            ClaimOutcome::Accepted
        );
        assert_eq!(registry.holder("report").await, Some(node));
    }

    #[tokio::test]
    async fn second_claim_is_rejected_regardless_of_node() {
        let registry = InMemoryRegistry::new();
        let a = NodeId::from("node-a");
        let b = NodeId::from("node-b");

        assert_eq!(
            registry.mark_running("report", &a).await,
            ClaimOutcome::Accepted
        );
        assert_eq!(
            registry.mark_running("report", &b).await,
            ClaimOutcome::Rejected
        );
        assert_eq!(
            registry.mark_running("report", &a).await,
            ClaimOutcome::Rejected
        );
    }

    #[tokio::test]
    async fn distinct_job_names_are_independent() {
        let registry = InMemoryRegistry::new();
        let node = NodeId::from("node-a");

        assert_eq!(
            registry.mark_running("report", &node).await,
            ClaimOutcome::Accepted
        );
        assert_eq!(
            registry.mark_running("cleanup", &node).await,
            ClaimOutcome::Accepted
        );
    }

    #[tokio::test]
    async fn release_allows_reclaim() {
        let registry = InMemoryRegistry::new();
        let node = NodeId::from("node-a");

        registry.mark_running("report", &node).await;
        registry.mark_finished("report", &node).await;

        assert_eq!(registry.holder("report").await, None);
        assert_eq!(
            registry.mark_running("report", &node).await,
            ClaimOutcome::Accepted
        );
    }

    #[tokio::test]
    async fn release_from_non_holder_is_a_no_op() {
        let registry = InMemoryRegistry::new();
        let a = NodeId::from("node-a");
        let b = NodeId::from("node-b");

        registry.mark_running("report", &a).await;
        registry.mark_finished("report", &b).await;

        assert_eq!(registry.holder("report").await, Some(a));
    }
}
