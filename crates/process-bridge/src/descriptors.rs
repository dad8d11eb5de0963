//! Typed input descriptors for classified parameters.

use indicators::{Frequency, ParameterSpec};
use serde_json::Value;
use wps_protocol::{Format, InputDescription, LiteralDataType, LiteralValue, Metadata};

use crate::classifier::ParameterRole;

/// Upper bound on the number of files bound to one input.
pub const MAX_FILE_OCCURS: u32 = 1000;

/// Default resampling frequency.
pub const DEFAULT_FREQUENCY: &str = "YS";

const FILE_ABSTRACT: &str = "NetCDF Files or archive (tar/zip) containing netCDF files.";

/// Build the descriptor for one parameter. Returns `None` for
/// [`ParameterRole::Unrecognized`].
pub fn build_input(role: ParameterRole, spec: &ParameterSpec) -> Option<InputDescription> {
    let default = spec.default.as_ref().and_then(literal_from_json);
    match role {
        ParameterRole::GriddedVariable | ParameterRole::Auxiliary => Some(file_input()),
        ParameterRole::Threshold => Some(literal_input(
            "threshold",
            LiteralDataType::Float,
            &spec.desc,
            default,
        )),
        ParameterRole::Frequency => Some(frequency_input(default)),
        ParameterRole::Window => Some(literal_input(
            "window",
            LiteralDataType::Integer,
            &spec.desc,
            default,
        )),
        ParameterRole::Unrecognized => None,
    }
}

/// Allowed values of a frequency input.
pub fn frequency_codes() -> Vec<String> {
    Frequency::ALL.iter().map(|f| f.code().to_string()).collect()
}

/// A file reference input accepting up to [`MAX_FILE_OCCURS`] files.
pub(crate) fn file_input() -> InputDescription {
    InputDescription::complex("Resource", vec![Format::netcdf()])
        .with_description(FILE_ABSTRACT)
        .with_metadata(Metadata::new("Info"))
        .with_occurs(1, MAX_FILE_OCCURS)
}

fn literal_input(
    title: &str,
    data_type: LiteralDataType,
    description: &str,
    default: Option<LiteralValue>,
) -> InputDescription {
    let input = InputDescription::literal(title, data_type)
        .with_description(description)
        .optional();
    match default {
        Some(value) => input.with_default(value),
        None => input,
    }
}

fn frequency_input(default: Option<LiteralValue>) -> InputDescription {
    let allowed = frequency_codes();
    let default = match default {
        Some(LiteralValue::Text(code)) if allowed.contains(&code) => code,
        _ => DEFAULT_FREQUENCY.to_string(),
    };
    InputDescription::literal("Frequency", LiteralDataType::String)
        .with_description("Resampling frequency")
        .optional()
        .with_default(LiteralValue::Text(default))
        .with_allowed_values(allowed)
}

/// Convert a metadata default to a literal. `null` and compound values have
/// no literal form.
pub fn literal_from_json(value: &Value) -> Option<LiteralValue> {
    match value {
        Value::String(s) => Some(LiteralValue::Text(s.clone())),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(LiteralValue::Integer(i)),
            None => n.as_f64().map(LiteralValue::Float),
        },
        Value::Bool(b) => Some(LiteralValue::Text(b.to_string())),
        _ => None,
    }
}
