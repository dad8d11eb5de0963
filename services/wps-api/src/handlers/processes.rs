//! Process list, description and execution handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    Json,
};
use indexmap::IndexMap;
use metrics::counter;
use process_bridge::{JobContext, ProcessDefinition};
use tracing::{info, warn};
use wps_protocol::{ExecuteRequest, InputValue, Link, ProcessList, ProtocolError};

use super::json_response;
use crate::error::ApiResult;
use crate::jobs::RegistryResponse;
use crate::state::AppState;

/// GET /processes - Summaries of every process
pub async fn list_processes_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let base_url = &state.config.base_url;
    let list = ProcessList {
        processes: state
            .catalog
            .iter()
            .map(|p| p.description().summary_with_links(base_url))
            .collect(),
        links: vec![Link::new(format!("{}/processes", base_url), "self")],
    };
    json_response(StatusCode::OK, &list)
}

/// GET /processes/:process_id - Full process description
pub async fn get_process_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(process_id): Path<String>,
) -> ApiResult<Response> {
    let process = find_process(&state, &process_id)?;
    Ok(json_response(StatusCode::OK, process.description()))
}

/// POST /processes/:process_id/execution
///
/// Runs synchronously and answers with the results document, unless the
/// client sends `Prefer: respond-async`. Then the job is queued and the
/// answer is its status with a `Location` header.
pub async fn execute_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(process_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ExecuteRequest>,
) -> ApiResult<Response> {
    let process = find_process(&state, &process_id)?;
    let inputs = request.into_values();
    let status = state.registry.create(process.id());
    let job_id = status.job_id.clone();
    let mode = if prefers_async(&headers) { "async" } else { "sync" };

    counter!("wps_execute_requests_total", "process" => process_id.clone(), "mode" => mode)
        .increment(1);
    info!(process = %process_id, job_id = %job_id, mode, "Job accepted");

    if mode == "async" {
        let location = format!("{}/jobs/{}", state.config.base_url, job_id);
        let location = HeaderValue::from_str(&location)
            .map_err(|e| ProtocolError::Internal(e.to_string()))?;

        let task_state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = run_job(task_state, process, inputs, job_id.clone()).await {
                warn!(job_id = %job_id, error = %e, "Background job failed");
            }
        });

        let mut response = json_response(StatusCode::CREATED, &status);
        response.headers_mut().insert(header::LOCATION, location);
        return Ok(response);
    }

    // The job owns its task so that a client disconnect cannot leave it
    // registered as running.
    tokio::spawn(run_job(state.clone(), process, inputs, job_id.clone()))
        .await
        .map_err(|e| ProtocolError::Internal(format!("Job task failed: {}", e)))??;
    let results = state.registry.results(&job_id)?;
    Ok(json_response(StatusCode::OK, &results))
}

fn find_process(state: &AppState, process_id: &str) -> Result<Arc<ProcessDefinition>, ProtocolError> {
    state
        .catalog
        .get(process_id)
        .cloned()
        .ok_or_else(|| ProtocolError::NoSuchProcess(process_id.to_string()))
}

fn prefers_async(headers: &HeaderMap) -> bool {
    headers
        .get_all("prefer")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|pref| pref.trim().eq_ignore_ascii_case("respond-async"))
}

/// Wait for a job slot, run the job on the blocking pool and record the
/// outcome in the registry.
async fn run_job(
    state: Arc<AppState>,
    process: Arc<ProcessDefinition>,
    inputs: IndexMap<String, Vec<InputValue>>,
    job_id: String,
) -> Result<(), ProtocolError> {
    let _permit = state
        .job_slots
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| ProtocolError::Internal(e.to_string()))?;

    let blocking_state = state.clone();
    let blocking_id = job_id.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let state = blocking_state;
        let bridge = &state.config.bridge;
        let mut job = JobContext::new(blocking_id.clone(), bridge.job_dir(&blocking_id));
        let mut response =
            RegistryResponse::new(state.registry.clone(), blocking_id, bridge.clone());
        state.handler.execute(&process, inputs, &mut job, &mut response)
    })
    .await;

    let result = match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ProtocolError::from(e)),
        Err(e) => Err(ProtocolError::Internal(format!("Job task failed: {}", e))),
    };

    state
        .registry
        .finish(&job_id, result.as_ref().map(|_| ()).map_err(|e| e.to_string()));
    result
}
