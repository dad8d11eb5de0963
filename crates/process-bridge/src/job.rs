//! Per-job state and the response channel.
//!
//! A [`JobContext`] is owned by exactly one job. It accumulates log lines,
//! tracks monotonic progress and remembers which remote references were
//! already downloaded into the job's working directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::info;

use crate::error::{BridgeError, Result};

/// File name of the log artifact.
pub const LOG_FILE_NAME: &str = "log.txt";

/// A file attached to a named output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub media_type: String,
}

impl OutputFile {
    pub fn new(path: impl Into<PathBuf>, media_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            media_type: media_type.into(),
        }
    }
}

/// Status channel of a running job, provided by the protocol runtime.
pub trait JobResponse: Send {
    fn update_status(&mut self, message: &str, percentage: u8);

    fn attach_output(&mut self, name: &str, output: OutputFile);
}

/// A response that records everything it receives.
#[derive(Debug, Default, Clone)]
pub struct CollectingResponse {
    pub updates: Vec<(String, u8)>,
    pub outputs: IndexMap<String, OutputFile>,
}

impl CollectingResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Percentage of the first update whose message contains `needle`.
    pub fn percentage_of(&self, needle: &str) -> Option<u8> {
        self.updates
            .iter()
            .find(|(message, _)| message.contains(needle))
            .map(|(_, pct)| *pct)
    }
}

impl JobResponse for CollectingResponse {
    fn update_status(&mut self, message: &str, percentage: u8) {
        self.updates.push((message.to_string(), percentage));
    }

    fn attach_output(&mut self, name: &str, output: OutputFile) {
        self.outputs.insert(name.to_string(), output);
    }
}

/// State of one job.
#[derive(Debug)]
pub struct JobContext {
    id: String,
    workdir: PathBuf,
    log: Vec<String>,
    progress: u8,
    window: (u8, u8),
    downloads: HashMap<String, PathBuf>,
}

impl JobContext {
    pub fn new(id: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            workdir: workdir.into(),
            log: Vec::new(),
            progress: 0,
            window: (0, 100),
            downloads: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Scratch directory for downloaded inputs.
    pub fn inputs_dir(&self) -> PathBuf {
        self.workdir.join("inputs")
    }

    pub fn log_lines(&self) -> &[String] {
        &self.log
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Restrict subsequent percentages to `[start, end]`. Stage percentages
    /// are mapped linearly into the window.
    pub fn set_window(&mut self, start: u8, end: u8) {
        let start = start.min(100);
        self.window = (start, end.clamp(start, 100));
    }

    pub fn window(&self) -> (u8, u8) {
        self.window
    }

    fn scale(&self, percentage: u8) -> u8 {
        let (start, end) = self.window;
        let span = u32::from(end - start);
        start + (span * u32::from(percentage.min(100)) / 100) as u8
    }

    /// Append a log line and report it. `percentage` is a stage percentage
    /// in the current window; progress never decreases.
    pub fn write_log(
        &mut self,
        response: &mut dyn JobResponse,
        message: impl Into<String>,
        percentage: Option<u8>,
    ) {
        let message = message.into();
        if let Some(pct) = percentage {
            self.progress = self.progress.max(self.scale(pct));
        }
        info!(job_id = %self.id, progress = self.progress, "{}", message);
        response.update_status(&message, self.progress);
        self.log.push(message);
    }

    /// Write the accumulated log to the job's working directory.
    pub fn write_log_file(&self) -> Result<PathBuf> {
        let path = self.workdir.join(LOG_FILE_NAME);
        std::fs::write(&path, self.log.join("\n"))
            .map_err(|e| BridgeError::write(path.display().to_string(), e))?;
        Ok(path)
    }

    pub(crate) fn cached_download(&self, reference: &str) -> Option<&PathBuf> {
        self.downloads.get(reference)
    }

    pub(crate) fn remember_download(&mut self, reference: &str, path: PathBuf) {
        self.downloads.insert(reference.to_string(), path);
    }

    pub(crate) fn download_count(&self) -> usize {
        self.downloads.len()
    }
}
