//! Job status and results documents.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::Link;

/// Lifecycle state of a job as seen by clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusCode {
    Accepted,
    Running,
    Successful,
    Failed,
    Dismissed,
}

impl StatusCode {
    /// Whether the job has stopped changing.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Successful | Self::Failed | Self::Dismissed)
    }
}

/// Status document of one job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusInfo {
    #[serde(rename = "processID")]
    pub process_id: String,

    #[serde(rename = "type")]
    pub type_: String,

    #[serde(rename = "jobID")]
    pub job_id: String,

    pub status: StatusCode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Percentage in 0..=100.
    pub progress: u8,

    pub created: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished: Option<DateTime<Utc>>,

    pub updated: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl StatusInfo {
    /// A freshly accepted job.
    pub fn accepted(process_id: impl Into<String>, job_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            process_id: process_id.into(),
            type_: "process".to_string(),
            job_id: job_id.into(),
            status: StatusCode::Accepted,
            message: None,
            progress: 0,
            created: now,
            started: None,
            finished: None,
            updated: now,
            links: Vec::new(),
        }
    }

    /// Record a progress update. The percentage never decreases.
    pub fn update(&mut self, message: impl Into<String>, progress: u8) {
        let now = Utc::now();
        if self.status == StatusCode::Accepted {
            self.status = StatusCode::Running;
            self.started = Some(now);
        }
        self.message = Some(message.into());
        self.progress = self.progress.max(progress.min(100));
        self.updated = now;
    }

    /// Move to a final state.
    pub fn finish(&mut self, status: StatusCode, message: impl Into<String>) {
        let now = Utc::now();
        self.status = status;
        self.message = Some(message.into());
        if status == StatusCode::Successful {
            self.progress = 100;
        }
        self.started.get_or_insert(now);
        self.finished = Some(now);
        self.updated = now;
    }
}

/// A result delivered by reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputReference {
    pub href: String,

    #[serde(rename = "type")]
    pub media_type: String,
}

/// Results document: output name to reference.
pub type Results = IndexMap<String, OutputReference>;

/// Response of the job list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobList {
    pub jobs: Vec<StatusInfo>,
    pub links: Vec<Link>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_never_decreases() {
        let mut status = StatusInfo::accepted("dtr", "job-1");
        status.update("Running computation", 10);
        status.update("Preparing inputs", 5);

        assert_eq!(status.status, StatusCode::Running);
        assert_eq!(status.progress, 10);
        assert_eq!(status.message.as_deref(), Some("Preparing inputs"));
        assert!(status.started.is_some());
    }

    #[test]
    fn test_finish_successful_sets_full_progress() {
        let mut status = StatusInfo::accepted("dtr", "job-1");
        status.update("Writing the output netcdf", 15);
        status.finish(StatusCode::Successful, "done");

        assert_eq!(status.progress, 100);
        assert!(status.status.is_final());
        assert!(status.finished.is_some());
    }

    #[test]
    fn test_failed_keeps_progress() {
        let mut status = StatusInfo::accepted("dtr", "job-1");
        status.update("Running computation", 10);
        status.finish(StatusCode::Failed, "boom");

        assert_eq!(status.progress, 10);
        assert_eq!(status.status, StatusCode::Failed);
    }

    #[test]
    fn test_status_serialization() {
        let status = StatusInfo::accepted("heat_wave_frequency", "abc");
        let value = serde_json::to_value(&status).unwrap();

        assert_eq!(value["processID"], "heat_wave_frequency");
        assert_eq!(value["jobID"], "abc");
        assert_eq!(value["status"], "accepted");
        assert_eq!(value["type"], "process");
    }
}
