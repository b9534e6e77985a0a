//! Kubernetes integration module
//!
//! This module handles all interactions with the cluster:
//! - Listing deployments and the pods behind them
//! - Deleting victim pods
//! - Converting API objects into fault injection types

mod client;
mod gateway;
mod resources;

pub use client::{
    GatewayConfig, KubeGateway, DEFAULT_CA_CERT_PATH, DEFAULT_LOCATION, DEFAULT_TOKEN_PATH,
};
pub use gateway::ClusterGateway;
#[cfg(test)]
pub use gateway::MockClusterGateway;
pub use resources::{pod_ref_from_pod, workload_from_deployment};
