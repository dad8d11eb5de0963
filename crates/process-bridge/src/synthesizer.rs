//! Process definitions synthesized from indicator metadata.
//!
//! Every indicator in the catalog becomes one process with the same
//! identifier. Parameters are classified by name and mapped to input
//! descriptors in declaration order; two outputs are always appended.
//! The catalog also carries the hand-written grid point subset process.

use std::sync::Arc;

use indicators::{Indicator, IndicatorCatalog, IndicatorError};
use tracing::{debug, error, warn};
use wps_protocol::{Format, InputDescription, OutputDescription, ProcessDescription};

use crate::classifier::{classify, ParameterRole};
use crate::descriptors::build_input;
use crate::error::{BridgeError, Result};
use crate::subset::subset_description;

/// Version string of every synthesized process.
pub const PROCESS_VERSION: &str = "0.1";

/// Name of the result output.
pub const OUTPUT_NETCDF: &str = "output_netcdf";

/// Name of the log output.
pub const OUTPUT_LOG: &str = "output_log";

/// What a process runs.
#[derive(Clone)]
pub enum ProcessKind {
    Indicator(Arc<dyn Indicator>),

    /// Nearest grid point extraction.
    SubsetGridPoint,
}

/// A remote process bound to what it runs.
pub struct ProcessDefinition {
    description: ProcessDescription,
    kind: ProcessKind,
}

impl ProcessDefinition {
    /// Build the process for one indicator.
    ///
    /// Fails only when the indicator's parameter block cannot be parsed.
    pub fn synthesize(indicator: Arc<dyn Indicator>) -> Result<Self> {
        let meta = indicator.metadata();
        let specs = meta.parameter_specs().map_err(|e| match e {
            IndicatorError::Metadata { identifier, reason } => {
                BridgeError::Catalog { identifier, reason }
            }
            other => BridgeError::Catalog {
                identifier: meta.identifier.clone(),
                reason: other.to_string(),
            },
        })?;

        let mut description = ProcessDescription::new(
            meta.identifier.clone(),
            fold_ascii(&meta.long_name),
            PROCESS_VERSION,
        )
        .with_description(fold_ascii(&meta.abstract_));

        for spec in &specs {
            let role = classify(&spec.name);
            match build_input(role, spec) {
                Some(input) => description.add_input(spec.name.clone(), input),
                None => warn!(
                    process = %meta.identifier,
                    parameter = %spec.name,
                    "Parameter not implemented, dropped from process inputs"
                ),
            }
        }

        add_outputs(
            &mut description,
            "The indicator values computed on the original input grid.",
        );

        debug!(
            process = %meta.identifier,
            inputs = description.inputs.len(),
            "Synthesized process"
        );

        Ok(Self {
            description,
            kind: ProcessKind::Indicator(indicator),
        })
    }

    /// The grid point subset process.
    pub fn subset_gridpoint() -> Self {
        let mut description = subset_description(PROCESS_VERSION);
        add_outputs(
            &mut description,
            "The input variables at the grid cell nearest to the requested point.",
        );
        Self {
            description,
            kind: ProcessKind::SubsetGridPoint,
        }
    }

    pub fn id(&self) -> &str {
        self.description.id()
    }

    pub fn description(&self) -> &ProcessDescription {
        &self.description
    }

    pub fn kind(&self) -> &ProcessKind {
        &self.kind
    }

    /// The indicator run by this process, if it is synthesized from one.
    pub fn indicator(&self) -> Option<&Arc<dyn Indicator>> {
        match &self.kind {
            ProcessKind::Indicator(indicator) => Some(indicator),
            ProcessKind::SubsetGridPoint => None,
        }
    }

    pub fn input(&self, name: &str) -> Option<&InputDescription> {
        self.description.inputs.get(name)
    }

    /// Names of the file inputs, in declaration order.
    pub fn file_inputs(&self) -> impl Iterator<Item = &str> {
        self.description
            .inputs
            .iter()
            .filter(|(_, input)| input.is_complex())
            .map(|(name, _)| name.as_str())
    }

    /// Role of a published input.
    pub fn role(&self, name: &str) -> Option<ParameterRole> {
        self.input(name).map(|_| classify(name))
    }
}

impl std::fmt::Debug for ProcessDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessDefinition")
            .field("id", &self.id())
            .field("inputs", &self.description.inputs.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Append the result and log outputs every process publishes.
fn add_outputs(description: &mut ProcessDescription, result_description: &str) {
    description.add_output(
        OUTPUT_NETCDF,
        OutputDescription::reference(
            "Function output in netCDF",
            vec![Format::netcdf(), Format::metalink()],
        )
        .with_description(result_description),
    );
    description.add_output(
        OUTPUT_LOG,
        OutputDescription::reference("Logging information", vec![Format::text()])
            .with_description("Collected logs during process run."),
    );
}

/// Immutable set of processes built once at startup.
#[derive(Debug, Default)]
pub struct ProcessCatalog {
    version: String,
    processes: Vec<Arc<ProcessDefinition>>,
}

impl ProcessCatalog {
    /// Synthesize a process for every indicator, then add the grid point
    /// subset process. Indicators with malformed metadata are skipped and
    /// logged.
    pub fn build(indicators: &IndicatorCatalog) -> Self {
        let mut processes = Vec::with_capacity(indicators.len() + 1);
        for indicator in indicators.iter() {
            match ProcessDefinition::synthesize(Arc::clone(indicator)) {
                Ok(process) => processes.push(Arc::new(process)),
                Err(e) => error!(error = %e, "Skipping indicator"),
            }
        }
        processes.push(Arc::new(ProcessDefinition::subset_gridpoint()));
        Self {
            version: indicators.version().to_string(),
            processes,
        }
    }

    /// Version of the indicator catalog the processes were built from.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get(&self, id: &str) -> Option<&Arc<ProcessDefinition>> {
        self.processes.iter().find(|p| p.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ProcessDefinition>> {
        self.processes.iter()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

/// Fold text to ASCII for protocol titles.
pub fn fold_ascii(text: &str) -> String {
    deunicode::deunicode(text)
}
