use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pod_fault_injector::{
    chaos::{render, RngSource},
    cli::Cli,
    config::{Config, LogFormat},
    inject_faults,
    k8s::KubeGateway,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize tracing; logs go to stderr so stdout only carries the report
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    match config.log_format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    let policy = cli.policy();
    let gateway_config = cli.gateway_config(&config);
    tracing::info!(
        location = %gateway_config.location,
        include_by_default = policy.include_by_default,
        ignored = ?policy.ignored_namespaces,
        dry_run = cli.dry_run,
        "Starting fault injection"
    );

    let gateway = KubeGateway::new(&gateway_config)
        .await
        .context("failed to create Kubernetes client")?;

    let result = inject_faults(gateway, RngSource::from_entropy(), &policy, cli.dry_run)
        .await
        .context("fault injection run failed")?;

    let report = render(&result, cli.output).context("failed to render report")?;
    print!("{}", report);

    Ok(())
}
