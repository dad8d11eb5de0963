//! Machine-readable indicator metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IndicatorError, IndicatorResult};

/// Descriptive metadata of one indicator.
///
/// `parameters` is kept as the raw JSON block the library publishes: an
/// array of `{"name", "default", "desc"}` objects in call order. Consumers
/// parse it with [`IndicatorMetadata::parameter_specs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorMetadata {
    pub identifier: String,
    pub long_name: String,
    #[serde(rename = "abstract")]
    pub abstract_: String,
    pub standard_name: String,
    pub units: String,
    #[serde(default)]
    pub cell_methods: String,
    pub parameters: Value,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,

    /// Default value, `None` for required parameters.
    #[serde(default)]
    pub default: Option<Value>,

    #[serde(default)]
    pub desc: String,
}

impl ParameterSpec {
    pub fn new(name: &str, default: Option<Value>, desc: &str) -> Self {
        Self {
            name: name.to_string(),
            default,
            desc: desc.to_string(),
        }
    }
}

impl IndicatorMetadata {
    /// Parse the parameter block, keeping declaration order.
    pub fn parameter_specs(&self) -> IndicatorResult<Vec<ParameterSpec>> {
        let specs: Vec<ParameterSpec> =
            serde_json::from_value(self.parameters.clone()).map_err(|e| {
                IndicatorError::Metadata {
                    identifier: self.identifier.clone(),
                    reason: e.to_string(),
                }
            })?;

        if let Some(spec) = specs.iter().find(|s| s.name.trim().is_empty()) {
            return Err(IndicatorError::Metadata {
                identifier: self.identifier.clone(),
                reason: format!("parameter with empty name (desc: {:?})", spec.desc),
            });
        }
        Ok(specs)
    }

    /// Encode parameter specs as the raw block stored in `parameters`.
    pub fn encode_parameters(specs: &[ParameterSpec]) -> Value {
        serde_json::to_value(specs).unwrap_or(Value::Null)
    }
}
