//! Job execution.
//!
//! One job moves through `Received -> InputsResolving -> Computing ->
//! WritingOutput -> Succeeded`, or to `Failed` from any stage. Every stage
//! appends a log line and reports progress. Outputs are attached only once
//! everything has been written.
//!
//! When file inputs receive N > 1 references, the job runs N independent
//! computations, the i-th using the i-th file of every input. Each one
//! reports its stages inside its own share of the progress range and writes
//! a file suffixed `-<i>.nc`; the result output is then a Metalink document
//! listing all of them.
//!
//! The grid point subset process takes the same path with its own middle
//! step: each `resource` file is opened whole and cut down to one cell.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use indexmap::IndexMap;
use indicators::{ArgValue, Frequency, Indicator, IndicatorArgs};
use netcdf_io::{text_attr, write_dataset, AttrValue, Attributes, Dataset};
use tracing::{debug, warn};
use wps_protocol::{media_types, InputValue, Metalink, MetalinkFile};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::inputs::{bind_inputs, BoundInputs};
use crate::job::{JobContext, JobResponse, OutputFile};
use crate::naming::{indexed_filename, output_filename};
use crate::observer::JobObserver;
use crate::resolver::{is_remote, AccessMode, DatasetResolver};
use crate::subset::GridPoint;
use crate::synthesizer::{
    ProcessDefinition, ProcessKind, OUTPUT_LOG, OUTPUT_NETCDF, PROCESS_VERSION,
};

/// File name of the Metalink document listing multiple results.
pub const METALINK_FILE_NAME: &str = "output.meta4";

/// Runs jobs for synthesized processes.
pub struct ExecutionHandler {
    resolver: DatasetResolver,
    observer: Arc<dyn JobObserver>,
    config: BridgeConfig,
}

impl ExecutionHandler {
    pub fn new(resolver: DatasetResolver, observer: Arc<dyn JobObserver>, config: BridgeConfig) -> Self {
        Self {
            resolver,
            observer,
            config,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Run one job to completion.
    ///
    /// On failure a final log line is written and the error is returned;
    /// nothing is attached to `response`.
    pub fn execute(
        &self,
        process: &ProcessDefinition,
        inputs: IndexMap<String, Vec<InputValue>>,
        job: &mut JobContext,
        response: &mut dyn JobResponse,
    ) -> Result<()> {
        let started = Instant::now();
        self.observer.job_started(process.id(), job.id());

        match self.run(process, inputs, job, response) {
            Ok(()) => {
                self.observer
                    .job_succeeded(process.id(), job.id(), started.elapsed());
                Ok(())
            }
            Err(e) => {
                job.write_log(response, format!("Process failed: {}", e), None);
                if let Err(log_err) = job.write_log_file() {
                    warn!(job_id = %job.id(), error = %log_err, "Could not write job log");
                }
                self.observer
                    .job_failed(process.id(), job.id(), &e, started.elapsed());
                Err(e)
            }
        }
    }

    fn run(
        &self,
        process: &ProcessDefinition,
        inputs: IndexMap<String, Vec<InputValue>>,
        job: &mut JobContext,
        response: &mut dyn JobResponse,
    ) -> Result<()> {
        fs::create_dir_all(job.workdir())?;
        job.write_log(response, "Processing started", Some(5));

        debug!(
            job_id = %job.id(),
            inputs = %inputs.keys().cloned().collect::<Vec<_>>().join(", "),
            "Received inputs"
        );
        let bound = bind_inputs(process, inputs)?;
        let sets = bound.file_sets()?;
        job.write_log(response, "Preparing inputs", Some(5));

        let mut results = Vec::with_capacity(sets);
        for index in 0..sets {
            if sets > 1 {
                job.set_window(share(index, sets), share(index + 1, sets));
                job.write_log(
                    response,
                    format!("Processing file set {} of {}", index + 1, sets),
                    Some(0),
                );
            }
            results.push(self.run_file_set(process, &bound, index, sets, job, response)?);
        }
        job.set_window(0, 100);

        let result = match results.as_slice() {
            [single] => OutputFile::new(single.clone(), media_types::NETCDF),
            many => self.write_metalink(process, many, job)?,
        };

        job.write_log(response, "Processing finished successfully", Some(98));
        let log = job.write_log_file()?;

        response.attach_output(OUTPUT_NETCDF, result);
        response.attach_output(OUTPUT_LOG, OutputFile::new(log, media_types::TEXT));
        Ok(())
    }

    /// Resolve, compute and write the `index`-th set of input files.
    fn run_file_set(
        &self,
        process: &ProcessDefinition,
        bound: &BoundInputs,
        index: usize,
        sets: usize,
        job: &mut JobContext,
        response: &mut dyn JobResponse,
    ) -> Result<PathBuf> {
        let (mut output, input_attrs) = match process.kind() {
            ProcessKind::Indicator(indicator) => {
                self.compute_indicator(process, indicator.as_ref(), bound, index, job, response)?
            }
            ProcessKind::SubsetGridPoint => self.extract_gridpoint(bound, index, job, response)?,
        };
        add_provenance(process, &mut output, &input_attrs, bound.frequency());

        let mut name = output_filename(&output, &input_attrs);
        if sets > 1 {
            name = indexed_filename(&name, index);
        }
        let path = job.workdir().join(name);

        // Usually the longest step
        job.write_log(response, "Writing the output netcdf", Some(15));
        write_dataset(&output, &path)
            .map_err(|e| BridgeError::write(path.display().to_string(), e))?;
        Ok(path)
    }

    fn compute_indicator(
        &self,
        process: &ProcessDefinition,
        indicator: &dyn Indicator,
        bound: &BoundInputs,
        index: usize,
        job: &mut JobContext,
        response: &mut dyn JobResponse,
    ) -> Result<(Dataset, Attributes)> {
        let mut args = IndicatorArgs::new();
        for (name, value) in &bound.literals {
            args.insert(name.clone(), value.clone());
        }

        let mut input_attrs: Option<Attributes> = None;
        for (name, refs) in &bound.files {
            let reference = nth_reference(name, refs, index)?;
            let resolved = self.resolver.resolve(reference, name, job)?;
            job.write_log(response, access_message(reference, &resolved.access), Some(6));

            if input_attrs.is_none() {
                input_attrs = Some(resolved.attrs);
            }
            args.insert(name.clone(), ArgValue::Array(resolved.variable));
        }

        job.write_log(response, "Running computation", Some(10));
        debug!(
            process = %process.id(),
            args = %args.names().collect::<Vec<_>>().join(", "),
            "Calling indicator"
        );
        let output = indicator.compute(&args)?;
        Ok((output, input_attrs.unwrap_or_default()))
    }

    fn extract_gridpoint(
        &self,
        bound: &BoundInputs,
        index: usize,
        job: &mut JobContext,
        response: &mut dyn JobResponse,
    ) -> Result<(Dataset, Attributes)> {
        let point = GridPoint::from_literals(&bound.literals)?;
        let (name, refs) = bound
            .files
            .first()
            .ok_or_else(|| BridgeError::invalid_input("resource", "missing required input"))?;
        let reference = nth_reference(name, refs, index)?;

        let (source, access) = self.resolver.open(reference, job)?;
        job.write_log(response, access_message(reference, &access), Some(6));

        job.write_log(response, "Extracting the grid point", Some(10));
        let output = point.extract(source.as_ref())?;
        Ok((output, source.attrs().clone()))
    }

    fn write_metalink(
        &self,
        process: &ProcessDefinition,
        results: &[PathBuf],
        job: &JobContext,
    ) -> Result<OutputFile> {
        let mut metalink = Metalink::new();
        for path in results {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut file = MetalinkFile::new(name, self.config.output_href(job.id(), path))
                .with_description(format!("{} result", process.id()));
            if let Ok(meta) = fs::metadata(path) {
                file = file.with_size(meta.len());
            }
            metalink.add_file(file);
        }

        let path = job.workdir().join(METALINK_FILE_NAME);
        let xml = metalink
            .to_xml()
            .map_err(|e| BridgeError::write(path.display().to_string(), e))?;
        fs::write(&path, xml).map_err(|e| BridgeError::write(path.display().to_string(), e))?;
        Ok(OutputFile::new(path, media_types::METALINK))
    }
}

/// The `index`-th file of an input.
fn nth_reference<'a>(name: &str, refs: &'a [String], index: usize) -> Result<&'a str> {
    refs.get(index).map(String::as_str).ok_or_else(|| {
        BridgeError::Computation(format!(
            "The number of files for each input must be equal ({} has {})",
            name,
            refs.len()
        ))
    })
}

/// Log line describing how an input was opened.
fn access_message(reference: &str, access: &AccessMode) -> String {
    match access {
        AccessMode::Streamed => format!("Opened dataset as an OPeNDAP url: {}", reference),
        AccessMode::Materialized { .. } if is_remote(reference) => {
            format!("Downloaded dataset for url: {}", reference)
        }
        AccessMode::Materialized { path } => format!("Opened local dataset: {}", path.display()),
    }
}

/// Start of the `index`-th of `total` equal progress shares.
fn share(index: usize, total: usize) -> u8 {
    (index * 100 / total.max(1)).min(100) as u8
}

/// Carry the input's global attributes over and record how the output was
/// made.
fn add_provenance(
    process: &ProcessDefinition,
    output: &mut Dataset,
    input_attrs: &Attributes,
    frequency: Option<&str>,
) {
    let mut attrs = input_attrs.clone();
    for (key, value) in output.attrs.drain(..) {
        attrs.insert(key, value);
    }

    if let Some(freq) = frequency.and_then(Frequency::parse) {
        attrs.insert("frequency".to_string(), AttrValue::from(freq.cf_frequency()));
    }

    let what = match process.kind() {
        ProcessKind::Indicator(indicator) => indicator.metadata().identifier.clone(),
        ProcessKind::SubsetGridPoint => "grid point subset".to_string(),
    };
    let line = format!(
        "{}: {} computed by process {} version {}",
        Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
        what,
        process.id(),
        PROCESS_VERSION
    );
    let history = match text_attr(&attrs, "history") {
        Some(previous) if !previous.is_empty() => format!("{}\n{}", line, previous),
        _ => line,
    };
    attrs.insert("history".to_string(), AttrValue::from(history));

    output.attrs = attrs;
}
