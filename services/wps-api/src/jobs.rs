//! In-memory job registry.
//!
//! Running jobs are kept until they finish; finished jobs are kept in a
//! bounded history, oldest evicted first.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use process_bridge::{BridgeConfig, JobResponse, OutputFile};
use uuid::Uuid;
use wps_protocol::{OutputReference, ProtocolError, Results, StatusCode, StatusInfo};

#[derive(Debug, Clone)]
struct JobRecord {
    status: StatusInfo,
    results: Results,
}

#[derive(Debug, Default)]
struct Jobs {
    active: HashMap<String, JobRecord>,
    finished: VecDeque<JobRecord>,
}

/// Tracking for submitted jobs.
#[derive(Debug)]
pub struct JobRegistry {
    jobs: Mutex<Jobs>,
    max_finished: usize,
}

impl JobRegistry {
    pub fn new(max_finished: usize) -> Self {
        Self {
            jobs: Mutex::new(Jobs::default()),
            max_finished,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Jobs> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a new job for `process_id` and return its status.
    pub fn create(&self, process_id: &str) -> StatusInfo {
        let status = StatusInfo::accepted(process_id, Uuid::new_v4().to_string());
        self.lock().active.insert(
            status.job_id.clone(),
            JobRecord {
                status: status.clone(),
                results: Results::new(),
            },
        );
        status
    }

    pub fn update(&self, job_id: &str, message: &str, progress: u8) {
        if let Some(record) = self.lock().active.get_mut(job_id) {
            record.status.update(message, progress);
        }
    }

    pub fn attach(&self, job_id: &str, name: &str, output: OutputReference) {
        if let Some(record) = self.lock().active.get_mut(job_id) {
            record.results.insert(name.to_string(), output);
        }
    }

    /// Move a job to the finished history.
    pub fn finish(&self, job_id: &str, outcome: Result<(), String>) {
        let mut jobs = self.lock();
        let Some(mut record) = jobs.active.remove(job_id) else {
            return;
        };

        match outcome {
            Ok(()) => record
                .status
                .finish(StatusCode::Successful, "Process finished successfully"),
            Err(message) => {
                record.results.clear();
                record.status.finish(StatusCode::Failed, message);
            }
        }

        jobs.finished.push_front(record);
        while jobs.finished.len() > self.max_finished {
            jobs.finished.pop_back();
        }
    }

    fn find(&self, job_id: &str) -> Option<JobRecord> {
        let jobs = self.lock();
        jobs.active
            .get(job_id)
            .or_else(|| jobs.finished.iter().find(|r| r.status.job_id == job_id))
            .cloned()
    }

    pub fn status(&self, job_id: &str) -> Option<StatusInfo> {
        self.find(job_id).map(|r| r.status)
    }

    /// Results of a successful job.
    pub fn results(&self, job_id: &str) -> Result<Results, ProtocolError> {
        let record = self
            .find(job_id)
            .ok_or_else(|| ProtocolError::NoSuchJob(job_id.to_string()))?;

        match record.status.status {
            StatusCode::Successful => Ok(record.results),
            StatusCode::Failed => Err(ProtocolError::ExecutionFailed(
                record.status.message.unwrap_or_default(),
            )),
            _ => Err(ProtocolError::ResultNotReady(job_id.to_string())),
        }
    }

    /// Running jobs by creation time, then finished jobs newest first.
    pub fn list(&self) -> Vec<StatusInfo> {
        let jobs = self.lock();
        let mut active: Vec<StatusInfo> = jobs.active.values().map(|r| r.status.clone()).collect();
        active.sort_by_key(|s| s.created);
        active
            .into_iter()
            .chain(jobs.finished.iter().map(|r| r.status.clone()))
            .collect()
    }
}

/// Forwards job progress and outputs into the registry.
pub struct RegistryResponse {
    registry: Arc<JobRegistry>,
    job_id: String,
    config: BridgeConfig,
}

impl RegistryResponse {
    pub fn new(registry: Arc<JobRegistry>, job_id: impl Into<String>, config: BridgeConfig) -> Self {
        Self {
            registry,
            job_id: job_id.into(),
            config,
        }
    }
}

impl JobResponse for RegistryResponse {
    fn update_status(&mut self, message: &str, percentage: u8) {
        self.registry.update(&self.job_id, message, percentage);
    }

    fn attach_output(&mut self, name: &str, output: OutputFile) {
        let reference = OutputReference {
            href: self.config.output_href(&self.job_id, &output.path),
            media_type: output.media_type,
        };
        self.registry.attach(&self.job_id, name, reference);
    }
}
