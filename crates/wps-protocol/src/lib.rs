//! OGC API - Processes Protocol
//!
//! This crate provides the typed documents exchanged by a remote-process
//! server: process descriptions with their input and output descriptors,
//! execute requests, job status documents, results and exceptions.
//!
//! It only describes *what* is exchanged. Deciding which descriptors a
//! process publishes is the job of the process bridge.
//!
//! # Example
//!
//! ```rust
//! use wps_protocol::{Format, InputDescription, LiteralDataType, LiteralValue};
//!
//! let freq = InputDescription::literal("Frequency", LiteralDataType::String)
//!     .with_default(LiteralValue::Text("YS".to_string()))
//!     .with_allowed_values(vec!["YS".to_string(), "MS".to_string()])
//!     .optional();
//!
//! let resource = InputDescription::complex("Resource", vec![Format::netcdf()])
//!     .with_occurs(1, 1000);
//! ```

pub mod errors;
pub mod execute;
pub mod metalink;
pub mod process;
pub mod responses;
pub mod status;
pub mod types;

pub use errors::{ProtocolError, Result};
pub use execute::{ExecuteInput, ExecuteRequest, InputValue, LiteralValue};
pub use metalink::{Metalink, MetalinkFile};
pub use process::{
    Format, InputDescription, InputKind, JobControlOption, LiteralDataType, OutputDescription,
    ProcessDescription, ProcessList, ProcessSummary, TransmissionMode,
};
pub use responses::{ConformanceClasses, ExceptionResponse, LandingPage};
pub use status::{JobList, OutputReference, Results, StatusCode, StatusInfo};
pub use types::{Link, Metadata};

/// OGC API - Processes conformance class URIs
pub mod conformance {
    /// Core conformance class
    pub const CORE: &str = "http://www.opengis.net/spec/ogcapi-processes-1/1.0/conf/core";
    /// OGC process description conformance class
    pub const OGC_PROCESS_DESCRIPTION: &str =
        "http://www.opengis.net/spec/ogcapi-processes-1/1.0/conf/ogc-process-description";
    /// JSON encoding conformance class
    pub const JSON: &str = "http://www.opengis.net/spec/ogcapi-processes-1/1.0/conf/json";
    /// Job list conformance class
    pub const JOB_LIST: &str = "http://www.opengis.net/spec/ogcapi-processes-1/1.0/conf/job-list";
}

/// Media types used for process inputs and outputs
pub mod media_types {
    /// NetCDF gridded data
    pub const NETCDF: &str = "application/x-netcdf";
    /// Plain text
    pub const TEXT: &str = "text/plain";
    /// Metalink v4 document listing several result files
    pub const METALINK: &str = "application/metalink4+xml";
    /// JSON documents
    pub const JSON: &str = "application/json";
}
