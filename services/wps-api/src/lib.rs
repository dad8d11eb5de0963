//! Climate indices processing service.
//!
//! Exposes the processes synthesized from the indicator catalog over
//! OGC API - Processes, with synchronous and asynchronous execution.

pub mod config;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Build the service router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let outputs = ServeDir::new(&state.config.bridge.output_path);

    Router::new()
        // Landing page and conformance
        .route("/", get(handlers::landing::landing_handler))
        .route("/conformance", get(handlers::conformance::conformance_handler))
        // Processes
        .route("/processes", get(handlers::processes::list_processes_handler))
        .route(
            "/processes/:process_id",
            get(handlers::processes::get_process_handler),
        )
        .route(
            "/processes/:process_id/execution",
            post(handlers::processes::execute_handler),
        )
        // Jobs
        .route("/jobs", get(handlers::jobs::list_jobs_handler))
        .route("/jobs/:job_id", get(handlers::jobs::get_job_handler))
        .route(
            "/jobs/:job_id/results",
            get(handlers::jobs::get_job_results_handler),
        )
        // Result files
        .nest_service("/outputs", outputs)
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
