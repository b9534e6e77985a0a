//! Injection orchestrator
//!
//! One run is a straight pipeline: list deployments, filter them, look up the
//! pods of each eligible deployment, pick victims and kill them (unless dry
//! run). Only the initial listing can fail the run; lookup and deletion
//! failures are recorded and the run moves on.

use tracing::{debug, info, warn};

use super::discovery::discover_pods;
use super::eligibility::evaluate;
use super::selector::{deletion_count, select_victims, RandomSource};
use super::types::*;
use crate::error::InjectionError;
use crate::k8s::ClusterGateway;

/// Drives fault injection against a cluster
pub struct Injector<G, R> {
    gateway: G,
    random: R,
}

impl<G, R> Injector<G, R>
where
    G: ClusterGateway,
    R: RandomSource,
{
    pub fn new(gateway: G, random: R) -> Self {
        Self { gateway, random }
    }

    /// Run one discovery and injection pass
    pub async fn run(
        &mut self,
        policy: &FaultInjectionPolicy,
        dry_run: bool,
    ) -> Result<InjectionResult, InjectionError> {
        let workloads = self
            .gateway
            .list_deployments()
            .await
            .map_err(InjectionError::Discovery)?;

        info!(
            count = workloads.len(),
            include_by_default = policy.include_by_default,
            dry_run,
            "Discovered deployments"
        );

        let mut result = InjectionResult::new(dry_run);
        result.workloads_scanned = workloads.len();

        for workload in &workloads {
            let decision = evaluate(workload, policy);
            if !decision.is_eligible() {
                debug!(workload = %workload.qualified_name(), reason = %decision, "Skipping deployment");
                result.record_skipped(workload, decision);
                continue;
            }

            let outcome = self.inject(workload, dry_run).await;
            result.record(outcome);
        }

        let result = result.finish();
        info!(
            considered = result.considered_pods,
            selected = result.selected_pods,
            deleted = result.deleted_pods,
            failed = result.failed_deletions,
            "Fault injection run complete"
        );
        Ok(result)
    }

    async fn inject(&mut self, workload: &Workload, dry_run: bool) -> WorkloadResult {
        let requested = deletion_count(&workload.annotations);

        let pods = match discover_pods(&self.gateway, workload).await {
            Ok(pods) => pods,
            Err(e) => {
                warn!(workload = %workload.qualified_name(), error = %e, "Pod lookup failed");
                return WorkloadResult::lookup_failed(workload, requested, e);
            }
        };

        let victims = select_victims(&pods, requested, &mut self.random);
        let mut outcome = WorkloadResult::new(workload, pods.len(), requested);
        outcome.selected = victims.iter().map(|pod| pod.name.clone()).collect();

        info!(
            workload = %workload.qualified_name(),
            selected = victims.len(),
            total = pods.len(),
            pods = %outcome.selected.join(", "),
            "Selected victims"
        );

        if dry_run {
            return outcome;
        }

        for pod in &victims {
            match self.gateway.delete_pod(&pod.self_link).await {
                Ok(()) => {
                    info!(pod = %pod.name, self_link = %pod.self_link, "Deleted pod");
                    outcome.deletions.push(DeletionOutcome::Deleted {
                        pod: pod.name.clone(),
                        self_link: pod.self_link.clone(),
                    });
                }
                Err(e) => {
                    warn!(pod = %pod.name, self_link = %pod.self_link, error = %e, "Failed to delete pod");
                    outcome.deletions.push(DeletionOutcome::Failed {
                        pod: pod.name.clone(),
                        self_link: pod.self_link.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chaos::selector::RngSource;
    use crate::error::GatewayError;
    use crate::k8s::MockClusterGateway;
    use mockall::predicate::eq;

    fn pods(app: &str, namespace: &str, n: usize) -> Vec<PodRef> {
        (0..n)
            .map(|i| PodRef::new(format!("{}-{}", app, i), namespace))
            .collect()
    }

    fn opted_in(name: &str) -> Workload {
        Workload::new(name, "default")
            .with_app_label(name)
            .with_annotation(OPT_IN_ANNOTATION, "true")
    }

    #[tokio::test]
    async fn test_discovery_failure_is_fatal() {
        let mut gateway = MockClusterGateway::new();
        gateway.expect_list_deployments().returning(|| {
            Err(GatewayError::Config("connection refused".to_string()))
        });
        gateway.expect_list_pods().times(0);

        let mut injector = Injector::new(gateway, RngSource::seeded(1));
        let err = injector
            .run(&FaultInjectionPolicy::default(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, InjectionError::Discovery(_)));
    }

    #[tokio::test]
    async fn test_dry_run_never_deletes() {
        let mut gateway = MockClusterGateway::new();
        gateway
            .expect_list_deployments()
            .returning(|| Ok(vec![opted_in("web"), opted_in("api")]));
        gateway
            .expect_list_pods()
            .returning(|ns, selector| {
                let app = selector.trim_start_matches("app=");
                Ok(pods(app, ns, 3))
            });
        gateway.expect_delete_pod().times(0);

        let mut injector = Injector::new(gateway, RngSource::seeded(3));
        let result = injector
            .run(&FaultInjectionPolicy::default(), true)
            .await
            .unwrap();

        assert!(result.dry_run);
        assert_eq!(result.considered_pods, 6);
        assert_eq!(result.selected_pods, 2);
        assert_eq!(result.deleted_pods, 0);
        assert_eq!(result.attempted_deletions(), 0);
    }

    #[tokio::test]
    async fn test_excluded_workloads_get_no_pod_lookup() {
        let mut gateway = MockClusterGateway::new();
        gateway.expect_list_deployments().returning(|| {
            Ok(vec![
                Workload::new("plain", "default").with_app_label("plain"),
                opted_in("web"),
            ])
        });
        gateway
            .expect_list_pods()
            .with(eq("default"), eq("app=web"))
            .times(1)
            .returning(|ns, _| Ok(pods("web", ns, 2)));
        gateway.expect_delete_pod().times(1).returning(|_| Ok(()));

        let mut injector = Injector::new(gateway, RngSource::seeded(5));
        let result = injector
            .run(&FaultInjectionPolicy::default(), false)
            .await
            .unwrap();

        assert_eq!(result.workloads_scanned, 2);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].reason, EligibilityDecision::NotOptedIn);
        assert_eq!(result.deleted_pods, 1);
    }

    #[tokio::test]
    async fn test_failed_delete_does_not_stop_siblings() {
        let mut gateway = MockClusterGateway::new();
        gateway.expect_list_deployments().returning(|| {
            Ok(vec![opted_in("web").with_annotation(MAX_TO_DELETE_ANNOTATION, "3")])
        });
        gateway
            .expect_list_pods()
            .returning(|ns, _| Ok(pods("web", ns, 3)));
        gateway
            .expect_delete_pod()
            .times(3)
            .returning(|link| {
                if link.ends_with("web-1") {
                    Err(GatewayError::InvalidSelfLink(link.to_string()))
                } else {
                    Ok(())
                }
            });

        let mut injector = Injector::new(gateway, RngSource::seeded(9));
        let result = injector
            .run(&FaultInjectionPolicy::default(), false)
            .await
            .unwrap();

        assert_eq!(result.selected_pods, 3);
        assert_eq!(result.deleted_pods, 2);
        assert_eq!(result.failed_deletions, 1);
        assert_eq!(result.workloads[0].deletions.len(), 3);
    }
}
