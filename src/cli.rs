//! Command line interface

use clap::Parser;

use crate::chaos::{FaultInjectionPolicy, OutputFormat};
use crate::config::Config;
use crate::k8s::GatewayConfig;

/// Inject faults into Kubernetes by killing random pods of opted-in deployments.
#[derive(Debug, Clone, Parser)]
#[command(name = "pod-fault-injector", version, about)]
pub struct Cli {
    /// Location to access the Kubernetes API (overrides K8S_LOCATION)
    #[arg(long)]
    pub loc: Option<String>,

    /// Opt all deployments in by default
    #[arg(long)]
    pub include_by_default: bool,

    /// Comma separated namespaces to ignore when including by default
    #[arg(long, default_value = "kube-system")]
    pub ignore: String,

    /// Don't perform any destructive actions
    #[arg(long)]
    pub dry_run: bool,

    /// Infer cluster access from kubeconfig or the in-cluster environment
    #[arg(long)]
    pub kubeconfig: bool,

    /// Report format: text or json
    #[arg(long, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl Cli {
    pub fn policy(&self) -> FaultInjectionPolicy {
        FaultInjectionPolicy::from_csv(self.include_by_default, &self.ignore)
    }

    /// Gateway settings from the environment with command line overrides applied
    pub fn gateway_config(&self, config: &Config) -> GatewayConfig {
        let mut gateway = config.gateway_config();
        if let Some(loc) = &self.loc {
            gateway.location = loc.clone();
        }
        if self.kubeconfig {
            gateway.use_kubeconfig = true;
        }
        gateway
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["pod-fault-injector"]).unwrap();

        assert_eq!(cli.loc, None);
        assert!(!cli.include_by_default);
        assert!(!cli.dry_run);
        assert_eq!(cli.output, OutputFormat::Text);

        let policy = cli.policy();
        assert!(!policy.include_by_default);
        assert!(policy.ignores_namespace("kube-system"));
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "pod-fault-injector",
            "--loc",
            "http://localhost:8001",
            "--include-by-default",
            "--ignore",
            "kube-system,monitoring",
            "--dry-run",
            "--output",
            "json",
        ])
        .unwrap();

        assert!(cli.dry_run);
        assert_eq!(cli.output, OutputFormat::Json);

        let policy = cli.policy();
        assert!(policy.include_by_default);
        assert_eq!(policy.ignored_namespaces.len(), 2);

        let gateway = cli.gateway_config(&Config::default());
        assert_eq!(gateway.location, "http://localhost:8001");
        assert!(!gateway.use_kubeconfig);
    }

    #[test]
    fn test_location_falls_back_to_environment_config() {
        let cli = Cli::try_parse_from(["pod-fault-injector", "--kubeconfig"]).unwrap();
        let config = Config {
            k8s_location: "https://10.0.0.1:6443".to_string(),
            ..Default::default()
        };

        let gateway = cli.gateway_config(&config);
        assert_eq!(gateway.location, "https://10.0.0.1:6443");
        assert!(gateway.use_kubeconfig);
    }

    #[test]
    fn test_rejects_unknown_output() {
        assert!(Cli::try_parse_from(["pod-fault-injector", "--output", "yaml"]).is_err());
    }
}
