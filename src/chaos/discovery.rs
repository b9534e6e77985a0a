//! Pod discovery for eligible workloads

use tracing::debug;

use super::types::{PodRef, Workload};
use crate::error::GatewayResult;
use crate::k8s::ClusterGateway;

/// List the pods of `workload` through its `app` label.
///
/// Workloads without an `app` label have no addressable pods; they yield an
/// empty list without touching the API.
pub async fn discover_pods<G>(gateway: &G, workload: &Workload) -> GatewayResult<Vec<PodRef>>
where
    G: ClusterGateway + ?Sized,
{
    let Some(selector) = workload.label_selector() else {
        debug!(workload = %workload.qualified_name(), "No app label, no pods to target");
        return Ok(Vec::new());
    };

    gateway.list_pods(&workload.namespace, &selector).await
}
