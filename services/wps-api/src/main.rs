//! Processing service entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use wps_api::config::ServiceConfig;
use wps_api::state::AppState;

/// Climate indices processing service
#[derive(Parser, Debug)]
#[command(name = "wps-api")]
#[command(about = "OGC API - Processes server for climate indicators")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:5000", env = "WPS_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Configuration file
    #[arg(short, long, default_value = "config/wps.yaml", env = "WPS_CONFIG")]
    config: PathBuf,

    /// Number of worker threads
    #[arg(long, env = "WPS_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let config = ServiceConfig::load(&args.config)?;
    if let Some(host) = config.error_reporting_host() {
        info!(host = %host, "Error reporting endpoint configured; no client is started");
    }

    let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    // Blocking HTTP clients are created here, before the runtime starts.
    let state = Arc::new(AppState::new(config, Some(prometheus))?);

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }
    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args.listen, state))
}

async fn run_server(listen: String, state: Arc<AppState>) -> Result<()> {
    info!(
        output_path = ?state.config.bridge.output_path,
        max_concurrent_jobs = state.config.max_concurrent_jobs,
        "Starting processing service"
    );

    let app = wps_api::build_router(state);

    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", listen))?;
    info!("Processing service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind")?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
