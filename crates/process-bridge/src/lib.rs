//! Bridge between an indicator library and remotely invokable processes.
//!
//! At startup [`ProcessCatalog::build`] turns every indicator into a
//! [`ProcessDefinition`]: parameters are classified by name
//! ([`classify`]), mapped to typed input descriptors, and two outputs are
//! appended. At request time the [`ExecutionHandler`] binds the request
//! inputs, resolves file references to chunked lazy variables with the
//! [`DatasetResolver`], calls the indicator and writes the result and the
//! job log. The hand-written `subset_gridpoint` process runs through the
//! same handler and extracts the grid cell nearest to a point instead.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use indicators::IndicatorCatalog;
//! use process_bridge::{
//!     BridgeConfig, CollectingResponse, DatasetResolver, ExecutionHandler, JobContext,
//!     ProcessCatalog, TracingObserver,
//! };
//! use wps_protocol::{ExecuteRequest, InputValue};
//!
//! let catalog = ProcessCatalog::build(&IndicatorCatalog::builtin());
//! let config = BridgeConfig::default();
//! let handler = ExecutionHandler::new(
//!     DatasetResolver::from_config(&config).unwrap(),
//!     Arc::new(TracingObserver),
//!     config.clone(),
//! );
//!
//! let mut request = ExecuteRequest::new();
//! request.push("tasmax", InputValue::reference("/data/tasmax.nc"));
//!
//! let mut job = JobContext::new("job-1", config.job_dir("job-1"));
//! let mut response = CollectingResponse::new();
//! handler
//!     .execute(catalog.get("tx_max").unwrap(), request.into_values(), &mut job, &mut response)
//!     .unwrap();
//! ```

pub mod chunking;
pub mod classifier;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod handler;
pub mod inputs;
pub mod job;
pub mod naming;
pub mod observer;
pub mod resolver;
pub mod subset;
pub mod synthesizer;

pub use chunking::{plan_chunks, DEFAULT_MAX_CHUNK_ELEMENTS};
pub use classifier::{classify, ParameterRole};
pub use config::BridgeConfig;
pub use descriptors::build_input;
pub use error::{BridgeError, Result};
pub use handler::ExecutionHandler;
pub use inputs::{bind_inputs, BoundInputs};
pub use job::{CollectingResponse, JobContext, JobResponse, OutputFile};
pub use observer::{JobObserver, MetricsObserver, Observers, TracingObserver};
pub use resolver::{
    AccessMode, DatasetOpener, DatasetResolver, Fetcher, HttpFetcher, HttpProbe, NetCdfOpener,
    NoProbe, ResolvedDataset, StreamProbe,
};
pub use subset::{GridPoint, SUBSET_GRIDPOINT};
pub use synthesizer::{ProcessCatalog, ProcessDefinition, ProcessKind, OUTPUT_LOG, OUTPUT_NETCDF};
