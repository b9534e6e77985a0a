//! Run report rendering

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::types::{DeletionOutcome, InjectionResult};

/// Report format printed at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn render(result: &InjectionResult, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(result)),
        OutputFormat::Json => render_json(result),
    }
}

pub fn render_json(result: &InjectionResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

/// Human readable summary with one block per eligible deployment
pub fn render_text(result: &InjectionResult) -> String {
    let mut out = String::new();

    for workload in &result.workloads {
        let _ = writeln!(out, "deployment: {}/{}", workload.namespace, workload.name);

        if let Some(error) = &workload.lookup_error {
            let _ = writeln!(out, "pod lookup failed: {}", error);
            continue;
        }

        let _ = writeln!(
            out,
            "selected {} of {} pods: {}",
            workload.selected.len(),
            workload.total_pods,
            workload.selected.join(", ")
        );

        if result.dry_run {
            let _ = writeln!(out, "dry run enabled, not deleting");
            continue;
        }

        for deletion in &workload.deletions {
            match deletion {
                DeletionOutcome::Deleted { self_link, .. } => {
                    let _ = writeln!(out, "\tDELETE {}", self_link);
                }
                DeletionOutcome::Failed {
                    self_link, error, ..
                } => {
                    let _ = writeln!(out, "\tDELETE {} (failed: {})", self_link, error);
                }
            }
        }
    }

    out.push('\n');
    if result.dry_run {
        let _ = writeln!(
            out,
            "would delete {} out of {} considered pods",
            result.selected_pods, result.considered_pods
        );
    } else {
        let _ = writeln!(
            out,
            "deleted {} out of {} considered pods",
            result.deleted_pods, result.considered_pods
        );
        if result.failed_deletions > 0 {
            let _ = writeln!(out, "{} deletions failed", result.failed_deletions);
        }
    }

    out
}
