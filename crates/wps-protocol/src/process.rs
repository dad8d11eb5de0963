//! Process description documents.
//!
//! A process description lists the typed inputs a client may bind and the
//! outputs the process produces. Inputs are kept in declaration order,
//! which is also the order they are serialized in.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::execute::LiteralValue;
use crate::media_types;
use crate::types::{Link, Metadata};

/// A supported data format for a complex input or output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Format {
    #[serde(rename = "mediaType")]
    pub media_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl Format {
    pub fn new(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            encoding: None,
        }
    }

    /// NetCDF gridded data.
    pub fn netcdf() -> Self {
        Self::new(media_types::NETCDF)
    }

    /// Plain text.
    pub fn text() -> Self {
        Self::new(media_types::TEXT)
    }

    /// Metalink v4 listing of several files.
    pub fn metalink() -> Self {
        Self::new(media_types::METALINK)
    }
}

/// Primitive type of a literal input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LiteralDataType {
    String,
    Float,
    Integer,
}

impl LiteralDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Float => "float",
            Self::Integer => "integer",
        }
    }
}

/// The typed part of an input descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InputKind {
    /// File reference input (bound by `href`).
    Complex { formats: Vec<Format> },

    /// Scalar input.
    Literal {
        #[serde(rename = "dataType")]
        data_type: LiteralDataType,

        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<LiteralValue>,

        #[serde(rename = "allowedValues", skip_serializing_if = "Option::is_none")]
        allowed_values: Option<Vec<String>>,
    },
}

/// Descriptor for one process input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputDescription {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "minOccurs")]
    pub min_occurs: u32,

    #[serde(rename = "maxOccurs")]
    pub max_occurs: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<Metadata>,

    #[serde(flatten)]
    pub kind: InputKind,
}

impl InputDescription {
    /// A required single-occurrence file reference input.
    pub fn complex(title: impl Into<String>, formats: Vec<Format>) -> Self {
        Self {
            title: title.into(),
            description: None,
            min_occurs: 1,
            max_occurs: 1,
            metadata: Vec::new(),
            kind: InputKind::Complex { formats },
        }
    }

    /// A required single-occurrence literal input.
    pub fn literal(title: impl Into<String>, data_type: LiteralDataType) -> Self {
        Self {
            title: title.into(),
            description: None,
            min_occurs: 1,
            max_occurs: 1,
            metadata: Vec::new(),
            kind: InputKind::Literal {
                data_type,
                default: None,
                allowed_values: None,
            },
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    pub fn with_occurs(mut self, min_occurs: u32, max_occurs: u32) -> Self {
        self.min_occurs = min_occurs;
        self.max_occurs = max_occurs.max(min_occurs);
        self
    }

    /// Make the input optional (`minOccurs = 0`).
    pub fn optional(mut self) -> Self {
        self.min_occurs = 0;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.push(metadata);
        self
    }

    /// Set the default value. Ignored for complex inputs.
    pub fn with_default(mut self, value: LiteralValue) -> Self {
        if let InputKind::Literal { default, .. } = &mut self.kind {
            *default = Some(value);
        }
        self
    }

    /// Restrict the accepted values. Ignored for complex inputs.
    pub fn with_allowed_values(mut self, values: Vec<String>) -> Self {
        if let InputKind::Literal { allowed_values, .. } = &mut self.kind {
            *allowed_values = Some(values);
        }
        self
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.kind, InputKind::Complex { .. })
    }

    /// Default value of a literal input, if any.
    pub fn default_value(&self) -> Option<&LiteralValue> {
        match &self.kind {
            InputKind::Literal { default, .. } => default.as_ref(),
            InputKind::Complex { .. } => None,
        }
    }
}

/// How an output is delivered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransmissionMode {
    Value,
    Reference,
}

/// Descriptor for one process output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputDescription {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub formats: Vec<Format>,

    pub transmission: TransmissionMode,
}

impl OutputDescription {
    /// An output delivered by reference.
    pub fn reference(title: impl Into<String>, formats: Vec<Format>) -> Self {
        Self {
            title: title.into(),
            description: None,
            formats,
            transmission: TransmissionMode::Reference,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Execution modes a process supports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum JobControlOption {
    SyncExecute,
    AsyncExecute,
}

/// Short process listing entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessSummary {
    pub id: String,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub version: String,

    #[serde(rename = "jobControlOptions")]
    pub job_control_options: Vec<JobControlOption>,

    #[serde(rename = "outputTransmission")]
    pub output_transmission: Vec<TransmissionMode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

/// Full process description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessDescription {
    #[serde(flatten)]
    pub summary: ProcessSummary,

    /// Inputs in declaration order.
    pub inputs: IndexMap<String, InputDescription>,

    /// Outputs in declaration order.
    pub outputs: IndexMap<String, OutputDescription>,
}

impl ProcessDescription {
    /// Create an empty description supporting sync and async execution.
    pub fn new(id: impl Into<String>, title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            summary: ProcessSummary {
                id: id.into(),
                title: title.into(),
                description: None,
                version: version.into(),
                job_control_options: vec![
                    JobControlOption::SyncExecute,
                    JobControlOption::AsyncExecute,
                ],
                output_transmission: vec![TransmissionMode::Reference],
                links: Vec::new(),
            },
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.summary.id
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.summary.description = Some(description.into());
        self
    }

    /// Append an input. A later input with the same name replaces the earlier
    /// one but keeps its position.
    pub fn add_input(&mut self, name: impl Into<String>, input: InputDescription) {
        self.inputs.insert(name.into(), input);
    }

    pub fn add_output(&mut self, name: impl Into<String>, output: OutputDescription) {
        self.outputs.insert(name.into(), output);
    }

    /// Summary with a link to the full description.
    pub fn summary_with_links(&self, base_url: &str) -> ProcessSummary {
        let mut summary = self.summary.clone();
        summary.links = vec![Link::new(
            format!("{}/processes/{}", base_url, self.summary.id),
            "self",
        )
        .with_type(media_types::JSON)
        .with_title("Process description")];
        summary
    }
}

/// Response of the process list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessList {
    pub processes: Vec<ProcessSummary>,
    pub links: Vec<Link>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_description() -> ProcessDescription {
        let mut desc = ProcessDescription::new("dtr", "Mean of daily temperature range", "0.1");
        desc.add_input(
            "tasmax",
            InputDescription::complex("Resource", vec![Format::netcdf()]).with_occurs(1, 1000),
        );
        desc.add_input(
            "tasmin",
            InputDescription::complex("Resource", vec![Format::netcdf()]).with_occurs(1, 1000),
        );
        desc.add_input(
            "freq",
            InputDescription::literal("Frequency", LiteralDataType::String)
                .with_default(LiteralValue::Text("YS".to_string()))
                .optional(),
        );
        desc.add_output(
            "output_log",
            OutputDescription::reference("Logging information", vec![Format::text()]),
        );
        desc
    }

    #[test]
    fn test_inputs_keep_declaration_order() {
        let desc = sample_description();
        let names: Vec<&str> = desc.inputs.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["tasmax", "tasmin", "freq"]);
    }

    #[test]
    fn test_serialized_inputs_keep_declaration_order() {
        let json = serde_json::to_string(&sample_description()).unwrap();
        let tasmax = json.find("\"tasmax\"").unwrap();
        let tasmin = json.find("\"tasmin\"").unwrap();
        let freq = json.find("\"freq\"").unwrap();
        assert!(tasmax < tasmin && tasmin < freq);
    }

    #[test]
    fn test_literal_serialization() {
        let input = InputDescription::literal("window", LiteralDataType::Integer)
            .with_default(LiteralValue::Integer(3))
            .optional();
        let value = serde_json::to_value(&input).unwrap();

        assert_eq!(value["kind"], "literal");
        assert_eq!(value["dataType"], "integer");
        assert_eq!(value["default"], 3);
        assert_eq!(value["minOccurs"], 0);
    }

    #[test]
    fn test_complex_ignores_literal_builders() {
        let input = InputDescription::complex("Resource", vec![Format::netcdf()])
            .with_default(LiteralValue::Integer(1))
            .with_allowed_values(vec!["x".to_string()]);
        assert!(input.is_complex());
        assert!(input.default_value().is_none());
    }

    #[test]
    fn test_description_roundtrip_through_json() {
        let desc = sample_description();
        let json = serde_json::to_string(&desc).unwrap();
        let parsed: ProcessDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, desc);
    }

    #[test]
    fn test_summary_links() {
        let summary = sample_description().summary_with_links("http://localhost:5000");
        assert_eq!(summary.links[0].href, "http://localhost:5000/processes/dtr");
        assert!(summary
            .job_control_options
            .contains(&JobControlOption::AsyncExecute));
    }
}
