//! Fault injection engine
//!
//! Decides which deployments are candidates, picks victim pods and kills them:
//! - Eligibility from `fault_injection.*` annotations and namespace rules
//! - Random victim selection with an injectable random source
//! - Orchestration of a single best-effort run and its report

mod discovery;
pub mod eligibility;
mod orchestrator;
pub mod report;
pub mod selector;
pub mod types;

pub use discovery::discover_pods;
pub use eligibility::{annotation_is_truthy, evaluate, is_eligible};
pub use orchestrator::Injector;
pub use report::{render, render_json, render_text, OutputFormat};
pub use selector::{deletion_count, select_victims, RandomSource, RngSource};
pub use types::*;
