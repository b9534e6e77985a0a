//! Error types for the fault injector

use thiserror::Error;

/// Errors raised while talking to the Kubernetes API
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),

    #[error("failed to build request: {0}")]
    Request(#[from] kube::core::request::Error),

    #[error("invalid self link '{0}'")]
    InvalidSelfLink(String),

    #[error("invalid cluster location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CA certificate in {path}: {reason}")]
    Certificate { path: String, reason: String },

    #[error("failed to load cluster configuration: {0}")]
    Config(String),
}

/// Errors that abort a whole injection run
#[derive(Debug, Error)]
pub enum InjectionError {
    /// The workload list could not be fetched, so no eligibility decision is meaningful
    #[error("workload discovery failed: {0}")]
    Discovery(#[source] GatewayError),
}

pub type GatewayResult<T> = Result<T, GatewayError>;
