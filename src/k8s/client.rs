//! Kubernetes API gateway backed by kube::Client

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, DeleteParams, ListParams},
    core::Request,
    Client, Config,
};
use tracing::{info, instrument};

use super::gateway::ClusterGateway;
use super::resources::{pod_ref_from_pod, workload_from_deployment};
use crate::chaos::{PodRef, Workload};
use crate::error::{GatewayError, GatewayResult};

pub const DEFAULT_LOCATION: &str = "https://kubernetes";
pub const DEFAULT_CA_CERT_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";
pub const DEFAULT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Deployments fetched per list request
const LIST_PAGE_SIZE: u32 = 500;

/// Explicit connection settings for [`KubeGateway`]
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// API server URL. `https://` locations use the CA bundle and token file,
    /// `http://` locations (e.g. `kubectl proxy`) are used without credentials.
    pub location: String,
    pub ca_cert_path: PathBuf,
    pub token_path: PathBuf,
    /// Ignore the settings above and infer from kubeconfig or the in-cluster environment
    pub use_kubeconfig: bool,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
            ca_cert_path: PathBuf::from(DEFAULT_CA_CERT_PATH),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            use_kubeconfig: false,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
        }
    }
}

impl GatewayConfig {
    /// Translate into a kube client configuration
    pub async fn to_kube_config(&self) -> GatewayResult<Config> {
        let mut config = if self.use_kubeconfig {
            Config::infer()
                .await
                .map_err(|e| GatewayError::Config(e.to_string()))?
        } else {
            let cluster_url = match self.location.parse() {
                Ok(url) => url,
                Err(e) => {
                    return Err(GatewayError::InvalidLocation {
                        location: self.location.clone(),
                        reason: format!("{}", e),
                    })
                }
            };
            let mut config = Config::new(cluster_url);

            if self.location.starts_with("https://") {
                config.root_cert = Some(load_ca_bundle(&self.ca_cert_path)?);
                config.auth_info.token_file = Some(self.token_path.display().to_string());
            } else if !self.location.starts_with("http://") {
                return Err(GatewayError::InvalidLocation {
                    location: self.location.clone(),
                    reason: "expected an http:// or https:// URL".to_string(),
                });
            }
            config
        };

        config.connect_timeout = Some(self.connect_timeout);
        config.read_timeout = Some(self.read_timeout);
        Ok(config)
    }
}

fn load_ca_bundle(path: &Path) -> GatewayResult<Vec<Vec<u8>>> {
    let pem = std::fs::read_to_string(path).map_err(|source| GatewayError::Io {
        path: path.display().to_string(),
        source,
    })?;

    pem_to_der(&pem).map_err(|reason| GatewayError::Certificate {
        path: path.display().to_string(),
        reason,
    })
}

/// Decode every `CERTIFICATE` block of a PEM bundle into DER
fn pem_to_der(pem: &str) -> Result<Vec<Vec<u8>>, String> {
    let mut certs = Vec::new();
    let mut body: Option<String> = None;

    for line in pem.lines().map(str::trim) {
        if line.starts_with("-----BEGIN CERTIFICATE") {
            body = Some(String::new());
        } else if line.starts_with("-----END CERTIFICATE") {
            let encoded = body
                .take()
                .ok_or_else(|| "END marker without BEGIN".to_string())?;
            let der = STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| e.to_string())?;
            certs.push(der);
        } else if let Some(buf) = body.as_mut() {
            buf.push_str(line);
        }
    }

    if body.is_some() {
        return Err("unterminated certificate block".to_string());
    }
    if certs.is_empty() {
        return Err("no certificates found".to_string());
    }
    Ok(certs)
}

/// Split `/api/v1/namespaces/ns/pods/name` into the collection path and the name
fn split_self_link(self_link: &str) -> GatewayResult<(&str, &str)> {
    let trimmed = self_link.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((collection, name)) if collection.starts_with('/') && !name.is_empty() => {
            Ok((collection, name))
        }
        _ => Err(GatewayError::InvalidSelfLink(self_link.to_string())),
    }
}

/// [`ClusterGateway`] talking to a real API server
#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
}

impl KubeGateway {
    #[instrument(skip_all, fields(location = %config.location, kubeconfig = config.use_kubeconfig))]
    pub async fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let kube_config = config.to_kube_config().await?;
        let client = Client::try_from(kube_config)?;

        info!("Kubernetes client ready");

        Ok(Self { client })
    }
}

#[async_trait]
impl ClusterGateway for KubeGateway {
    #[instrument(skip(self))]
    async fn list_deployments(&self) -> GatewayResult<Vec<Workload>> {
        let api: Api<Deployment> = Api::all(self.client.clone());
        let mut params = ListParams::default().limit(LIST_PAGE_SIZE);
        let mut workloads = Vec::new();

        loop {
            let page = api.list(&params).await?;
            workloads.extend(page.items.iter().map(workload_from_deployment));

            match page.metadata.continue_.filter(|token| !token.is_empty()) {
                Some(token) => params = params.continue_token(&token),
                None => break,
            }
        }

        info!(count = workloads.len(), "Listed deployments");
        Ok(workloads)
    }

    #[instrument(skip(self))]
    async fn list_pods(&self, namespace: &str, label_selector: &str) -> GatewayResult<Vec<PodRef>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default().labels(label_selector))
            .await?;

        Ok(list
            .items
            .iter()
            .filter_map(|pod| pod_ref_from_pod(pod, namespace))
            .collect())
    }

    #[instrument(skip(self))]
    async fn delete_pod(&self, self_link: &str) -> GatewayResult<()> {
        let (collection, name) = split_self_link(self_link)?;
        let request = Request::new(collection).delete(name, &DeleteParams::default())?;
        self.client.request_text(request).await?;
        info!("Deleted pod");
        Ok(())
    }
}
