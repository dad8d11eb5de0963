//! Job lifecycle observers.
//!
//! The execution handler reports job start, success and failure to an
//! injected [`JobObserver`]. Observers must not fail the job.

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use tracing::{error, info};

use crate::error::BridgeError;

/// Receives job lifecycle events.
pub trait JobObserver: Send + Sync {
    fn job_started(&self, _process: &str, _job_id: &str) {}

    fn job_succeeded(&self, _process: &str, _job_id: &str, _elapsed: Duration) {}

    fn job_failed(&self, _process: &str, _job_id: &str, _error: &BridgeError, _elapsed: Duration) {}
}

/// Logs lifecycle events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl JobObserver for TracingObserver {
    fn job_started(&self, process: &str, job_id: &str) {
        info!(process = %process, job_id = %job_id, "Job started");
    }

    fn job_succeeded(&self, process: &str, job_id: &str, elapsed: Duration) {
        info!(
            process = %process,
            job_id = %job_id,
            duration_ms = elapsed.as_millis() as u64,
            "Job succeeded"
        );
    }

    fn job_failed(&self, process: &str, job_id: &str, error: &BridgeError, elapsed: Duration) {
        error!(
            process = %process,
            job_id = %job_id,
            kind = error.kind(),
            error = %error,
            duration_ms = elapsed.as_millis() as u64,
            "Job failed"
        );
    }
}

/// Records job counters and durations.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl JobObserver for MetricsObserver {
    fn job_started(&self, process: &str, _job_id: &str) {
        counter!("wps_jobs_started_total", "process" => process.to_string()).increment(1);
    }

    fn job_succeeded(&self, process: &str, _job_id: &str, elapsed: Duration) {
        counter!("wps_jobs_succeeded_total", "process" => process.to_string()).increment(1);
        histogram!("wps_job_duration_ms").record(elapsed.as_secs_f64() * 1000.0);
    }

    fn job_failed(&self, process: &str, _job_id: &str, error: &BridgeError, elapsed: Duration) {
        counter!(
            "wps_jobs_failed_total",
            "process" => process.to_string(),
            "kind" => error.kind()
        )
        .increment(1);
        histogram!("wps_job_duration_ms").record(elapsed.as_secs_f64() * 1000.0);
    }
}

/// Forwards events to several observers in order.
#[derive(Default, Clone)]
pub struct Observers {
    observers: Vec<Arc<dyn JobObserver>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn JobObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl JobObserver for Observers {
    fn job_started(&self, process: &str, job_id: &str) {
        for o in &self.observers {
            o.job_started(process, job_id);
        }
    }

    fn job_succeeded(&self, process: &str, job_id: &str, elapsed: Duration) {
        for o in &self.observers {
            o.job_succeeded(process, job_id, elapsed);
        }
    }

    fn job_failed(&self, process: &str, job_id: &str, error: &BridgeError, elapsed: Duration) {
        for o in &self.observers {
            o.job_failed(process, job_id, error, elapsed);
        }
    }
}
