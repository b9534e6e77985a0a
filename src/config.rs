use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use strum::{Display, EnumString};

use crate::k8s::{GatewayConfig, DEFAULT_CA_CERT_PATH, DEFAULT_LOCATION, DEFAULT_TOKEN_PATH};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Settings read from the environment (and an optional `.env` file)
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_k8s_location")]
    pub k8s_location: String,

    #[serde(default = "default_k8s_ca_cert_path")]
    pub k8s_ca_cert_path: PathBuf,

    #[serde(default = "default_k8s_token_path")]
    pub k8s_token_path: PathBuf,

    #[serde(default)]
    pub k8s_use_kubeconfig: bool,

    #[serde(default = "default_k8s_connect_timeout_secs")]
    pub k8s_connect_timeout_secs: u64,

    #[serde(default = "default_k8s_read_timeout_secs")]
    pub k8s_read_timeout_secs: u64,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_k8s_location() -> String {
    DEFAULT_LOCATION.to_string()
}

fn default_k8s_ca_cert_path() -> PathBuf {
    PathBuf::from(DEFAULT_CA_CERT_PATH)
}

fn default_k8s_token_path() -> PathBuf {
    PathBuf::from(DEFAULT_TOKEN_PATH)
}

fn default_k8s_connect_timeout_secs() -> u64 {
    10
}

fn default_k8s_read_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        let settings: Config = config.try_deserialize()?;

        Ok(settings)
    }

    /// Gateway settings derived from this configuration
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            location: self.k8s_location.clone(),
            ca_cert_path: self.k8s_ca_cert_path.clone(),
            token_path: self.k8s_token_path.clone(),
            use_kubeconfig: self.k8s_use_kubeconfig,
            connect_timeout: Duration::from_secs(self.k8s_connect_timeout_secs),
            read_timeout: Duration::from_secs(self.k8s_read_timeout_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            k8s_location: default_k8s_location(),
            k8s_ca_cert_path: default_k8s_ca_cert_path(),
            k8s_token_path: default_k8s_token_path(),
            k8s_use_kubeconfig: false,
            k8s_connect_timeout_secs: default_k8s_connect_timeout_secs(),
            k8s_read_timeout_secs: default_k8s_read_timeout_secs(),
            log_format: LogFormat::default(),
        }
    }
}
