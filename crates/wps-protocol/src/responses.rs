//! Landing page, conformance and exception documents.

use serde::{Deserialize, Serialize};

use crate::conformance;
use crate::media_types;
use crate::types::Link;

/// Landing page response for the API root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LandingPage {
    /// Title of the API.
    pub title: String,

    /// Description of the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Links to related resources.
    pub links: Vec<Link>,
}

impl LandingPage {
    /// Create a new landing page with standard links.
    pub fn new(title: impl Into<String>, description: impl Into<String>, base_url: &str) -> Self {
        let links = vec![
            Link::new(base_url, "self")
                .with_type(media_types::JSON)
                .with_title("This document"),
            Link::new(format!("{}/conformance", base_url), "conformance")
                .with_type(media_types::JSON)
                .with_title("Conformance classes"),
            Link::new(
                format!("{}/processes", base_url),
                "http://www.opengis.net/def/rel/ogc/1.0/processes",
            )
            .with_type(media_types::JSON)
            .with_title("Processes"),
            Link::new(
                format!("{}/jobs", base_url),
                "http://www.opengis.net/def/rel/ogc/1.0/job-list",
            )
            .with_type(media_types::JSON)
            .with_title("Jobs"),
        ];

        Self {
            title: title.into(),
            description: Some(description.into()),
            links,
        }
    }
}

/// Conformance declaration response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConformanceClasses {
    /// List of conformance class URIs.
    #[serde(rename = "conformsTo")]
    pub conforms_to: Vec<String>,
}

impl ConformanceClasses {
    /// Conformance classes of the current implementation.
    pub fn current() -> Self {
        Self {
            conforms_to: vec![
                conformance::CORE.to_string(),
                conformance::OGC_PROCESS_DESCRIPTION.to_string(),
                conformance::JSON.to_string(),
                conformance::JOB_LIST.to_string(),
            ],
        }
    }

    /// Check if a conformance class is declared.
    pub fn contains(&self, class: &str) -> bool {
        self.conforms_to.iter().any(|c| c == class)
    }
}

/// Exception response for errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExceptionResponse {
    /// Exception type identifier.
    #[serde(rename = "type")]
    pub type_: String,

    /// Human-readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// HTTP status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Detailed error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// URI of the request that caused the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

const EXCEPTION_BASE: &str = "http://www.opengis.net/def/exceptions/ogcapi-processes-1/1.0";

impl ExceptionResponse {
    /// Create a new exception response.
    pub fn new(type_: impl Into<String>, status: u16, detail: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            title: None,
            status: Some(status),
            detail: Some(detail.into()),
            instance: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// 404 for an unknown process.
    pub fn no_such_process(detail: impl Into<String>) -> Self {
        Self::new(format!("{}/no-such-process", EXCEPTION_BASE), 404, detail)
            .with_title("No Such Process")
    }

    /// 404 for an unknown job.
    pub fn no_such_job(detail: impl Into<String>) -> Self {
        Self::new(format!("{}/no-such-job", EXCEPTION_BASE), 404, detail)
            .with_title("No Such Job")
    }

    /// 404 for results of a job that has not succeeded yet.
    pub fn result_not_ready(detail: impl Into<String>) -> Self {
        Self::new(format!("{}/result-not-ready", EXCEPTION_BASE), 404, detail)
            .with_title("Result Not Ready")
    }

    /// 400 for invalid inputs.
    pub fn invalid_parameter(detail: impl Into<String>) -> Self {
        Self::new(
            format!("{}/invalid-parameter-value", EXCEPTION_BASE),
            400,
            detail,
        )
        .with_title("Bad Request")
    }

    /// 500 for a job that failed while running.
    pub fn execution_failed(detail: impl Into<String>) -> Self {
        Self::new(format!("{}/execution-failed", EXCEPTION_BASE), 500, detail)
            .with_title("Process Execution Failed")
    }

    /// 500 for anything else.
    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::new(format!("{}/server-error", EXCEPTION_BASE), 500, detail)
            .with_title("Internal Server Error")
    }
}
