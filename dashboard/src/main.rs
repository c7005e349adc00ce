mod config;
mod logging;

use api::Api;
use clap::{Args, Parser};
use config::{Config, ConfigError, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use shared::admin_service::{AdminService, Readiness};
use shared::http::run_http_service;
use shared::metrics_defs::describe_metrics;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use upstream::{AnalyticsClient, UpstreamError};

#[derive(Parser)]
#[command(name = "dashboard", about = "Campaign analytics dashboard API")]
enum CliCommand {
    /// Serve the dashboard API and the admin endpoints
    Run(ConfigArgs),
    /// Load and validate a config file, then exit
    ValidateConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    config_path: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum DashboardError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not install metrics recorder: {0}")]
    Metrics(String),
    #[error("could not build upstream client: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("API server error: {0}")]
    Api(#[from] api::ApiServerError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn main() {
    let cli = CliCommand::parse();

    let result = match &cli {
        CliCommand::Run(args) => run(&args.config_path),
        CliCommand::ValidateConfig(args) => validate_config(&args.config_path),
    };

    if let Err(e) = result {
        eprintln!("dashboard error: {e}");
        process::exit(1);
    }
}

fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = Config::from_file(path)?;
    config.validate()?;
    Ok(config)
}

fn validate_config(path: &Path) -> Result<(), DashboardError> {
    load_config(path)?;
    println!("{} is valid", path.display());
    Ok(())
}

fn run(path: &Path) -> Result<(), DashboardError> {
    let config = load_config(path)?;
    let _sentry_guard = logging::init(&config.logging);

    if let Some(metrics_config) = &config.metrics {
        install_metrics(metrics_config)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(serve(config))
}

fn install_metrics(config: &MetricsConfig) -> Result<(), DashboardError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(&config.prefix))
        .map_err(|e| DashboardError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder).map_err(|e| DashboardError::Metrics(e.to_string()))?;

    describe_metrics(api::metrics_defs::ALL_METRICS);
    describe_metrics(upstream::metrics_defs::ALL_METRICS);

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Reporting metrics to statsd"
    );
    Ok(())
}

async fn serve(config: Config) -> Result<(), DashboardError> {
    let readiness = Readiness::new();
    let client = Arc::new(AnalyticsClient::new(&config.upstream)?);
    let api = Api::new(&config.auth, config.cors.clone(), client.clone(), client)?;

    tracing::info!(
        upstream = %config.upstream.base_url,
        "Starting dashboard"
    );

    tokio::select! {
        result = api.serve(&config.listener, readiness.clone(), shutdown_signal()) => result?,
        result = run_http_service(
            &config.admin_listener.host,
            config.admin_listener.port,
            AdminService::new(readiness),
        ) => result?,
    }

    tracing::info!("Dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
