//! Service configuration loading.

use std::path::Path;

use anyhow::{Context, Result};
use process_bridge::BridgeConfig;
use serde::{Deserialize, Serialize};

/// Configuration of the processing service, loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Public base URL, used in links and `Location` headers.
    pub base_url: String,

    /// Job execution settings.
    #[serde(flatten)]
    pub bridge: BridgeConfig,

    /// Jobs allowed to run at the same time.
    pub max_concurrent_jobs: usize,

    /// Finished jobs kept for status queries.
    pub max_finished_jobs: usize,

    /// Error reporting endpoint. Only logged.
    pub sentry_dsn: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            bridge: BridgeConfig::default(),
            max_concurrent_jobs: 4,
            max_finished_jobs: 100,
            sentry_dsn: None,
        }
    }
}

impl ServiceConfig {
    /// Load from a YAML file, then apply environment overrides.
    ///
    /// A missing file is not an error: defaults are used.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read: {:?}", path))?;
            serde_yaml::from_str::<Self>(&content)
                .with_context(|| format!("Failed to parse: {:?}", path))?
        } else {
            tracing::warn!("Config file {:?} does not exist, using defaults", path);
            Self::default()
        };

        config.apply_env();
        config.finalize();
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
        Ok(config)
    }

    /// Apply environment overrides.
    pub fn apply_env(&mut self) {
        self.bridge.apply_env();

        if let Ok(val) = std::env::var("WPS_BASE_URL") {
            self.base_url = val;
        }

        if let Ok(val) = std::env::var("WPS_MAX_CONCURRENT_JOBS") {
            if let Ok(n) = val.parse() {
                self.max_concurrent_jobs = n;
            }
        }

        if let Ok(val) = std::env::var("SENTRY_DSN") {
            self.sentry_dsn = Some(val).filter(|v| !v.is_empty());
        }
    }

    /// Fill values derived from other settings.
    pub fn finalize(&mut self) {
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        if self.bridge.output_url.is_none() {
            self.bridge.output_url = Some(format!("{}/outputs", self.base_url));
        }
    }

    /// Host of the error reporting endpoint. The DSN carries a key, so
    /// only this part may be logged.
    pub fn error_reporting_host(&self) -> Option<&str> {
        let dsn = self.sentry_dsn.as_deref()?;
        let rest = dsn.split_once("://").map_or(dsn, |(_, rest)| rest);
        let rest = rest.rsplit_once('@').map_or(rest, |(_, host)| host);
        rest.split(|c| c == '/' || c == ':').next().filter(|h| !h.is_empty())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_jobs == 0 {
            return Err("max_concurrent_jobs must be > 0".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!("base_url must be an http(s) URL, got {}", self.base_url));
        }
        self.bridge.validate()
    }
}
