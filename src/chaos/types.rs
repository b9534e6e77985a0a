//! Fault injection types: workloads, pods, policy and run results

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Annotation that opts a deployment into fault injection
pub const OPT_IN_ANNOTATION: &str = "fault_injection.opt_in";
/// Annotation that opts a deployment out; always wins over opt-in
pub const OPT_OUT_ANNOTATION: &str = "fault_injection.opt_out";
/// Annotation holding the number of pods to kill per run
pub const MAX_TO_DELETE_ANNOTATION: &str = "fault_injection.max_to_delete";

/// Label whose value selects the pods of a deployment
pub const POD_SELECTOR_LABEL: &str = "app";

pub const MISSING_NAME: &str = "missing-name";
pub const MISSING_NAMESPACE: &str = "missing-namespace";

/// Pods killed per workload when `max_to_delete` is absent or unusable
pub const DEFAULT_DELETION_COUNT: usize = 1;

/// A deployment considered for fault injection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Value of the `app` label, if the deployment carries one
    #[serde(default)]
    pub pod_selector_label: Option<String>,
}

impl Workload {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            annotations: BTreeMap::new(),
            pod_selector_label: None,
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_app_label(mut self, app: impl Into<String>) -> Self {
        self.pod_selector_label = Some(app.into());
        self
    }

    /// Label selector matching this workload's pods, e.g. `app=web`
    pub fn label_selector(&self) -> Option<String> {
        self.pod_selector_label
            .as_deref()
            .map(|app| format!("{}={}", POD_SELECTOR_LABEL, app))
    }

    /// `namespace/name`, as shown in logs and reports
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// A running pod that may be selected as a victim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PodRef {
    pub name: String,
    pub namespace: String,
    /// API path used to delete the pod
    pub self_link: String,
}

impl PodRef {
    /// Build a pod reference with the canonical core/v1 path as its self link
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let name = name.into();
        let namespace = namespace.into();
        let self_link = canonical_pod_path(&namespace, &name);
        Self {
            name,
            namespace,
            self_link,
        }
    }
}

/// `/api/v1/namespaces/{namespace}/pods/{name}`
pub fn canonical_pod_path(namespace: &str, name: &str) -> String {
    format!("/api/v1/namespaces/{}/pods/{}", namespace, name)
}

/// Policy deciding which workloads are candidates for fault injection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultInjectionPolicy {
    /// Opt every deployment in unless it opts out
    pub include_by_default: bool,
    /// Namespaces treated as opted out; only consulted when `include_by_default` is set
    pub ignored_namespaces: BTreeSet<String>,
}

impl FaultInjectionPolicy {
    pub fn new<I, S>(include_by_default: bool, ignored_namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include_by_default,
            ignored_namespaces: ignored_namespaces.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a policy from a comma separated namespace list such as `kube-system,monitoring`
    pub fn from_csv(include_by_default: bool, ignored: &str) -> Self {
        Self::new(
            include_by_default,
            ignored
                .split(',')
                .map(str::trim)
                .filter(|ns| !ns.is_empty()),
        )
    }

    pub fn ignores_namespace(&self, namespace: &str) -> bool {
        self.ignored_namespaces.contains(namespace)
    }
}

/// Outcome of the eligibility filter for a single workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityDecision {
    Eligible,
    IgnoredNamespace,
    OptedOut,
    NotOptedIn,
}

impl EligibilityDecision {
    pub fn is_eligible(&self) -> bool {
        matches!(self, EligibilityDecision::Eligible)
    }
}

impl std::fmt::Display for EligibilityDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EligibilityDecision::Eligible => write!(f, "eligible"),
            EligibilityDecision::IgnoredNamespace => write!(f, "ignored namespace"),
            EligibilityDecision::OptedOut => write!(f, "opted out"),
            EligibilityDecision::NotOptedIn => write!(f, "not opted in"),
        }
    }
}

/// Result of deleting one selected pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeletionOutcome {
    Deleted { pod: String, self_link: String },
    Failed { pod: String, self_link: String, error: String },
}

impl DeletionOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeletionOutcome::Deleted { .. })
    }
}

/// Per-workload detail of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadResult {
    pub name: String,
    pub namespace: String,
    /// Pods found for the workload, selected or not
    pub total_pods: usize,
    pub requested: usize,
    pub selected: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deletions: Vec<DeletionOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_error: Option<String>,
}

impl WorkloadResult {
    pub fn new(workload: &Workload, total_pods: usize, requested: usize) -> Self {
        Self {
            name: workload.name.clone(),
            namespace: workload.namespace.clone(),
            total_pods,
            requested,
            selected: Vec::new(),
            deletions: Vec::new(),
            lookup_error: None,
        }
    }

    /// Result for a workload whose pods could not be listed
    pub fn lookup_failed(workload: &Workload, requested: usize, error: impl ToString) -> Self {
        Self {
            lookup_error: Some(error.to_string()),
            ..Self::new(workload, 0, requested)
        }
    }
}

/// A workload the filter excluded, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedWorkload {
    pub name: String,
    pub namespace: String,
    pub reason: EligibilityDecision,
}

/// Aggregate outcome of one injection run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionResult {
    pub dry_run: bool,
    pub workloads_scanned: usize,
    /// Sum of all pods across eligible workloads
    pub considered_pods: usize,
    pub selected_pods: usize,
    pub deleted_pods: usize,
    pub failed_deletions: usize,
    pub workloads: Vec<WorkloadResult>,
    pub skipped: Vec<SkippedWorkload>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl InjectionResult {
    pub fn new(dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            dry_run,
            workloads_scanned: 0,
            considered_pods: 0,
            selected_pods: 0,
            deleted_pods: 0,
            failed_deletions: 0,
            workloads: Vec::new(),
            skipped: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn record_skipped(&mut self, workload: &Workload, reason: EligibilityDecision) {
        self.skipped.push(SkippedWorkload {
            name: workload.name.clone(),
            namespace: workload.namespace.clone(),
            reason,
        });
    }

    /// Fold a finished workload into the totals
    pub fn record(&mut self, outcome: WorkloadResult) {
        self.considered_pods += outcome.total_pods;
        self.selected_pods += outcome.selected.len();
        for deletion in &outcome.deletions {
            if deletion.is_deleted() {
                self.deleted_pods += 1;
            } else {
                self.failed_deletions += 1;
            }
        }
        self.workloads.push(outcome);
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    /// Number of delete calls issued
    pub fn attempted_deletions(&self) -> usize {
        self.deleted_pods + self.failed_deletions
    }
}
