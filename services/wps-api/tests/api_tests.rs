//! Router tests against synthetic datasets on disk.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use process_bridge::{BridgeError, DatasetResolver, Fetcher, NetCdfOpener, NoProbe};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wps_api::config::ServiceConfig;
use wps_api::state::AppState;

struct NoFetch;

impl Fetcher for NoFetch {
    fn fetch(&self, url: &str, _dest: &Path) -> process_bridge::Result<u64> {
        Err(BridgeError::resolution(url, "downloads disabled in tests"))
    }
}

struct TestApp {
    router: Router,
    data: TempDir,
    _outputs: TempDir,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    fn with_config(mut config: ServiceConfig) -> Self {
        let outputs = tempfile::tempdir().unwrap();
        config.bridge.output_path = outputs.path().to_path_buf();
        config.finalize();

        let resolver =
            DatasetResolver::new(Arc::new(NoProbe), Arc::new(NetCdfOpener), Arc::new(NoFetch));
        let state = AppState::with_resolver(config, resolver, None).unwrap();

        let data = tempfile::tempdir().unwrap();
        for var in ["tasmax", "tasmin"] {
            test_utils::Fixture::new(var).write_in(data.path());
        }

        Self {
            router: wps_api::build_router(Arc::new(state)),
            data,
            _outputs: outputs,
        }
    }

    fn file(&self, var: &str) -> String {
        self.data
            .path()
            .join(format!("{}.nc", var))
            .to_string_lossy()
            .into_owned()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<(String, String)>, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    async fn execute(
        &self,
        process: &str,
        body: Value,
        prefer_async: bool,
    ) -> (StatusCode, Vec<(String, String)>, Value) {
        let mut builder = Request::post(format!("/processes/{}/execution", process))
            .header(header::CONTENT_TYPE, "application/json");
        if prefer_async {
            builder = builder.header("Prefer", "respond-async");
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

#[tokio::test]
async fn test_process_list_covers_catalog() {
    let app = TestApp::new();
    let (status, body) = app.get("/processes").await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["processes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), indicators::IndicatorCatalog::builtin().len() + 1);
    assert_eq!(ids[0], "tg_mean");
    assert!(ids.contains(&"heat_wave_frequency"));
    assert_eq!(ids.last(), Some(&"subset_gridpoint"));
}

#[tokio::test]
async fn test_unknown_process_is_not_found() {
    let app = TestApp::new();
    let (status, body) = app.get("/processes/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["type"].as_str().unwrap().ends_with("no-such-process"));

    let (status, _, _) = app.execute("nope", json!({"inputs": {}}), false).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_landing_and_conformance() {
    let app = TestApp::new();
    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["links"].as_array().unwrap().len() >= 3);

    let (status, body) = app.get("/conformance").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["conformsTo"]
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c.as_str().unwrap().ends_with("conf/core")));

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_process_description_inputs() {
    let app = TestApp::new();
    let (status, body) = app.get("/processes/heat_wave_frequency").await;

    assert_eq!(status, StatusCode::OK);
    let inputs = body["inputs"].as_object().unwrap();
    let mut names: Vec<&str> = inputs.keys().map(|k| k.as_str()).collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec!["freq", "tasmax", "tasmin", "thresh_tasmax", "thresh_tasmin", "window"]
    );
    assert_eq!(inputs["tasmin"]["maxOccurs"], 1000);
    assert!(body["outputs"].get("output_netcdf").is_some());
    assert!(body["outputs"].get("output_log").is_some());
}

#[tokio::test]
async fn test_sync_execution_returns_results() {
    let app = TestApp::new();
    let request = json!({
        "inputs": {
            "tasmax": {"href": app.file("tasmax")},
            "tasmin": {"href": app.file("tasmin")},
            "freq": "MS"
        }
    });
    let (status, _, body) = app.execute("dtr", request, false).await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let netcdf = &body["output_netcdf"];
    assert_eq!(netcdf["type"], "application/x-netcdf");
    assert!(netcdf["href"]
        .as_str()
        .unwrap()
        .starts_with("http://localhost:5000/outputs/"));
    assert!(body["output_log"]["href"].as_str().unwrap().ends_with("/log.txt"));

    let (status, body) = app.get("/jobs").await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["status"], "successful");
    assert_eq!(jobs[0]["progress"], 100);
}

#[tokio::test]
async fn test_sync_job_finishes_after_client_disconnect() {
    let app = TestApp::with_config(ServiceConfig {
        max_concurrent_jobs: 1,
        ..Default::default()
    });
    let request = json!({
        "inputs": {
            "tasmax": {"href": app.file("tasmax")},
            "tasmin": {"href": app.file("tasmin")},
            "freq": "MS"
        }
    });

    // Give up on the response right after the handler starts the job.
    let abandoned =
        tokio::time::timeout(Duration::from_millis(1), app.execute("dtr", request, false)).await;
    drop(abandoned);

    let mut status = Value::Null;
    for _ in 0..300 {
        let (_, body) = app.get("/jobs").await;
        let jobs = body["jobs"].as_array().unwrap();
        assert_eq!(jobs.len(), 1);
        if jobs[0]["status"] == "successful" || jobs[0]["status"] == "failed" {
            status = jobs[0]["status"].clone();
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(status, "successful");
}

#[tokio::test]
async fn test_async_execution_completes() {
    let app = TestApp::new();
    let request = json!({
        "inputs": {"tasmax": [{"href": app.file("tasmax")}], "freq": {"value": "YS"}}
    });
    let (status, headers, body) = app.execute("tx_max", request, true).await;

    assert_eq!(status, StatusCode::CREATED);
    let job_id = body["jobID"].as_str().unwrap().to_string();
    let location = headers
        .iter()
        .find(|(k, _)| k == "location")
        .map(|(_, v)| v.clone())
        .unwrap();
    assert_eq!(location, format!("http://localhost:5000/jobs/{}", job_id));

    let mut finished = Value::Null;
    for _ in 0..300 {
        let (status, body) = app.get(&format!("/jobs/{}", job_id)).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == "successful" || body["status"] == "failed" {
            finished = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(finished["status"], "successful", "{}", finished);

    let (status, body) = app.get(&format!("/jobs/{}/results", job_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["output_netcdf"]["href"].as_str().unwrap().contains(&job_id));
}

#[tokio::test]
async fn test_invalid_literal_is_bad_request() {
    let app = TestApp::new();
    let request = json!({
        "inputs": {"tasmax": {"href": app.file("tasmax")}, "freq": "W"}
    });
    let (status, _, body) = app.execute("tx_max", request, false).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("freq"));
}

#[tokio::test]
async fn test_failed_job_reports_error() {
    let app = TestApp::new();
    let request = json!({
        "inputs": {
            "tasmax": [{"href": app.file("tasmax")}, {"href": app.file("tasmax")}],
            "tasmin": {"href": app.file("tasmin")}
        }
    });
    let (status, _, body) = app.execute("dtr", request, false).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("must be equal"));

    let (_, jobs) = app.get("/jobs").await;
    let job_id = jobs["jobs"][0]["jobID"].as_str().unwrap();
    assert_eq!(jobs["jobs"][0]["status"], "failed");

    let (status, _) = app.get(&format!("/jobs/{}/results", job_id)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let app = TestApp::new();
    let (status, body) = app.get("/jobs/does-not-exist").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["type"].as_str().unwrap().ends_with("no-such-job"));
}
