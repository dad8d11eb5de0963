//! Job status and results handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
};
use wps_protocol::{JobList, Link, ProtocolError};

use super::json_response;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /jobs - Running and recently finished jobs
pub async fn list_jobs_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let list = JobList {
        jobs: state.registry.list(),
        links: vec![Link::new(format!("{}/jobs", state.config.base_url), "self")],
    };
    json_response(StatusCode::OK, &list)
}

/// GET /jobs/:job_id - Status of one job
pub async fn get_job_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let mut status = state
        .registry
        .status(&job_id)
        .ok_or_else(|| ProtocolError::NoSuchJob(job_id.clone()))?;

    let base_url = &state.config.base_url;
    status.links = vec![
        Link::new(format!("{}/jobs/{}", base_url, job_id), "self"),
        Link::new(
            format!("{}/jobs/{}/results", base_url, job_id),
            "http://www.opengis.net/def/rel/ogc/1.0/results",
        ),
    ];
    Ok(json_response(StatusCode::OK, &status))
}

/// GET /jobs/:job_id/results - Output references of a successful job
pub async fn get_job_results_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let results = state.registry.results(&job_id)?;
    Ok(json_response(StatusCode::OK, &results))
}
