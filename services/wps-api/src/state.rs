//! Application state for the processing service.

use std::sync::Arc;

use anyhow::{Context, Result};
use indicators::IndicatorCatalog;
use metrics_exporter_prometheus::PrometheusHandle;
use process_bridge::{
    DatasetResolver, ExecutionHandler, JobObserver, MetricsObserver, Observers, ProcessCatalog,
    TracingObserver,
};
use tokio::sync::Semaphore;
use tracing::info;

use crate::config::ServiceConfig;
use crate::jobs::JobRegistry;

/// Shared application state.
pub struct AppState {
    pub config: ServiceConfig,

    /// Processes synthesized from the indicator catalog. Read-only.
    pub catalog: ProcessCatalog,

    pub handler: Arc<ExecutionHandler>,

    pub registry: Arc<JobRegistry>,

    /// Bounds the number of jobs running at the same time.
    pub job_slots: Arc<Semaphore>,

    /// Renders `/metrics`. Absent when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Build the state with HTTP-backed dataset resolution.
    ///
    /// The resolver uses blocking HTTP clients, which must not be created
    /// from within an async context.
    pub fn new(config: ServiceConfig, prometheus: Option<PrometheusHandle>) -> Result<Self> {
        let resolver = DatasetResolver::from_config(&config.bridge)
            .context("Failed to create HTTP clients")?;
        Self::with_resolver(config, resolver, prometheus)
    }

    pub fn with_resolver(
        config: ServiceConfig,
        resolver: DatasetResolver,
        prometheus: Option<PrometheusHandle>,
    ) -> Result<Self> {
        let catalog = ProcessCatalog::build(&IndicatorCatalog::builtin());
        info!(
            processes = catalog.len(),
            version = %catalog.version(),
            "Process catalog built"
        );

        let observer: Arc<dyn JobObserver> = Arc::new(
            Observers::new()
                .with(Arc::new(TracingObserver))
                .with(Arc::new(MetricsObserver)),
        );
        let handler = ExecutionHandler::new(resolver, observer, config.bridge.clone());

        std::fs::create_dir_all(&config.bridge.output_path).with_context(|| {
            format!("Failed to create output directory {:?}", config.bridge.output_path)
        })?;

        Ok(Self {
            registry: Arc::new(JobRegistry::new(config.max_finished_jobs)),
            job_slots: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
            catalog,
            handler: Arc::new(handler),
            prometheus,
            config,
        })
    }
}
