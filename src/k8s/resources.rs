//! Conversions from Kubernetes API objects into fault injection types
//!
//! Missing metadata never fails a conversion: names fall back to sentinels,
//! annotations and labels to empty maps.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;

use crate::chaos::{
    canonical_pod_path, PodRef, Workload, MISSING_NAME, MISSING_NAMESPACE, POD_SELECTOR_LABEL,
};

/// Build a [`Workload`] from a Deployment.
///
/// The `app` label is read from the deployment metadata first, then from the
/// pod template.
pub fn workload_from_deployment(deployment: &Deployment) -> Workload {
    let meta = &deployment.metadata;

    let app_label = meta
        .labels
        .as_ref()
        .and_then(|labels| labels.get(POD_SELECTOR_LABEL))
        .or_else(|| {
            deployment
                .spec
                .as_ref()
                .and_then(|spec| spec.template.metadata.as_ref())
                .and_then(|template| template.labels.as_ref())
                .and_then(|labels| labels.get(POD_SELECTOR_LABEL))
        })
        .cloned();

    Workload {
        name: meta.name.clone().unwrap_or_else(|| MISSING_NAME.to_string()),
        namespace: meta
            .namespace
            .clone()
            .unwrap_or_else(|| MISSING_NAMESPACE.to_string()),
        annotations: meta.annotations.clone().unwrap_or_default(),
        pod_selector_label: app_label,
    }
}

/// Build a [`PodRef`] from a Pod, or `None` if the pod has no name.
///
/// `default_namespace` is used when the pod omits its namespace. Clusters
/// that no longer populate `selfLink` get the canonical core/v1 path.
pub fn pod_ref_from_pod(pod: &Pod, default_namespace: &str) -> Option<PodRef> {
    let meta = &pod.metadata;
    let name = meta.name.clone()?;
    let namespace = meta
        .namespace
        .clone()
        .unwrap_or_else(|| default_namespace.to_string());
    let self_link = meta
        .self_link
        .clone()
        .filter(|link| !link.is_empty())
        .unwrap_or_else(|| canonical_pod_path(&namespace, &name));

    Some(PodRef {
        name,
        namespace,
        self_link,
    })
}
