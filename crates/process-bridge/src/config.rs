//! Configuration for job execution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunking::DEFAULT_MAX_CHUNK_ELEMENTS;

/// Settings shared by every job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Root of the per-job working directories.
    pub output_path: PathBuf,

    /// Public URL under which `output_path` is served. When unset, outputs
    /// are referenced as `file://` URLs.
    pub output_url: Option<String>,

    /// Element budget per chunk when reading inputs.
    pub max_chunk_elements: usize,

    /// Timeout of the OPeNDAP descriptor probe.
    pub probe_timeout_secs: u64,

    /// Timeout of one input download.
    pub download_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("/tmp/climate-wps/outputs"),
            output_url: None,
            max_chunk_elements: DEFAULT_MAX_CHUNK_ELEMENTS,
            probe_timeout_secs: 10,
            download_timeout_secs: 600, // 10 minutes
        }
    }
}

impl BridgeConfig {
    /// Apply environment overrides on top of the current values.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("WPS_OUTPUT_PATH") {
            self.output_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("WPS_OUTPUT_URL") {
            self.output_url = Some(val).filter(|v| !v.is_empty());
        }

        if let Ok(val) = std::env::var("WPS_MAX_CHUNK_ELEMENTS") {
            if let Ok(n) = val.parse() {
                self.max_chunk_elements = n;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_elements == 0 {
            return Err("max_chunk_elements must be > 0".to_string());
        }

        if self.probe_timeout_secs == 0 || self.download_timeout_secs == 0 {
            return Err("timeouts must be > 0".to_string());
        }

        if let Some(url) = &self.output_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("output_url must be an http(s) URL, got {}", url));
            }
        }

        Ok(())
    }

    /// Working directory of a job.
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.output_path.join(job_id)
    }

    /// Public reference to a file in a job's working directory.
    pub fn output_href(&self, job_id: &str, path: &Path) -> String {
        match (&self.output_url, path.file_name()) {
            (Some(base), Some(name)) => format!(
                "{}/{}/{}",
                base.trim_end_matches('/'),
                job_id,
                name.to_string_lossy()
            ),
            _ => format!("file://{}", path.display()),
        }
    }
}
