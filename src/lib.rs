//! Pod Fault Injector Library
//!
//! Randomly terminates pods of opted-in Kubernetes deployments to check that
//! services survive instance loss.

pub mod chaos;
pub mod cli;
pub mod config;
pub mod error;
pub mod k8s;

use crate::chaos::{FaultInjectionPolicy, InjectionResult, Injector, RandomSource};
use crate::error::InjectionError;
use crate::k8s::ClusterGateway;

/// Run a single injection pass with the given gateway and random source
pub async fn inject_faults<G, R>(
    gateway: G,
    random: R,
    policy: &FaultInjectionPolicy,
    dry_run: bool,
) -> Result<InjectionResult, InjectionError>
where
    G: ClusterGateway,
    R: RandomSource,
{
    Injector::new(gateway, random).run(policy, dry_run).await
}
