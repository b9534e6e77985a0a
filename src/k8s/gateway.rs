//! Cluster API gateway abstraction
//!
//! The orchestrator only talks to the cluster through this trait, which keeps
//! it testable without a live API server.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::chaos::{PodRef, Workload};
use crate::error::GatewayResult;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterGateway: Send + Sync {
    /// List deployments across all namespaces
    async fn list_deployments(&self) -> GatewayResult<Vec<Workload>>;

    /// List pods in `namespace` matching `label_selector`
    async fn list_pods(&self, namespace: &str, label_selector: &str) -> GatewayResult<Vec<PodRef>>;

    /// Delete the pod at `self_link`
    async fn delete_pod(&self, self_link: &str) -> GatewayResult<()>;
}

#[async_trait]
impl<G> ClusterGateway for Arc<G>
where
    G: ClusterGateway + ?Sized,
{
    async fn list_deployments(&self) -> GatewayResult<Vec<Workload>> {
        (**self).list_deployments().await
    }

    async fn list_pods(&self, namespace: &str, label_selector: &str) -> GatewayResult<Vec<PodRef>> {
        (**self).list_pods(namespace, label_selector).await
    }

    async fn delete_pod(&self, self_link: &str) -> GatewayResult<()> {
        (**self).delete_pod(self_link).await
    }
}
