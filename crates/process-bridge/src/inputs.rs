//! Binding request inputs to declared process inputs.
//!
//! File inputs keep their references in request order. Literal inputs are
//! validated against the descriptor's data type and allowed values, and
//! missing optional literals take the descriptor default.

use indexmap::IndexMap;
use indicators::{ArgValue, Quantity};
use wps_protocol::{InputDescription, InputKind, InputValue, LiteralDataType, LiteralValue};

use crate::error::{BridgeError, Result};
use crate::synthesizer::ProcessDefinition;

/// Request inputs matched against a process definition.
#[derive(Debug, Clone, Default)]
pub struct BoundInputs {
    /// File references per input, in declaration order.
    pub files: IndexMap<String, Vec<String>>,

    /// Parsed literal values, defaults included.
    pub literals: IndexMap<String, ArgValue>,
}

impl BoundInputs {
    /// Number of independent file sets to compute.
    ///
    /// When an input receives several files, every file input must receive
    /// the same number; the i-th files of all inputs form the i-th set.
    pub fn file_sets(&self) -> Result<usize> {
        let sets = self.files.values().map(Vec::len).max().unwrap_or(0);
        if sets > 1 && self.files.values().any(|refs| refs.len() != sets) {
            let counts: Vec<String> = self
                .files
                .iter()
                .map(|(name, refs)| format!("{}: {}", name, refs.len()))
                .collect();
            return Err(BridgeError::Computation(format!(
                "The number of files for each input must be equal ({})",
                counts.join(", ")
            )));
        }
        Ok(sets.max(1))
    }

    /// Resampling frequency code, if the process takes one.
    pub fn frequency(&self) -> Option<&str> {
        match self.literals.get("freq") {
            Some(ArgValue::Text(code)) => Some(code),
            _ => None,
        }
    }
}

/// Match `inputs` against the declared inputs of `process`.
pub fn bind_inputs(
    process: &ProcessDefinition,
    mut inputs: IndexMap<String, Vec<InputValue>>,
) -> Result<BoundInputs> {
    if let Some(unknown) = inputs.keys().find(|name| process.input(name).is_none()) {
        return Err(BridgeError::invalid_input(
            unknown.as_str(),
            format!("not an input of process {}", process.id()),
        ));
    }

    let mut bound = BoundInputs::default();
    for (name, desc) in &process.description().inputs {
        let values = inputs.shift_remove(name).unwrap_or_default();

        if values.len() > desc.max_occurs as usize {
            return Err(BridgeError::invalid_input(
                name.as_str(),
                format!("at most {} values allowed, got {}", desc.max_occurs, values.len()),
            ));
        }
        if values.len() < desc.min_occurs as usize {
            return Err(BridgeError::invalid_input(name.as_str(), "missing required input"));
        }

        if desc.is_complex() {
            let refs = values
                .into_iter()
                .map(|value| match value {
                    InputValue::Reference { href, .. } => Ok(href),
                    _ => Err(BridgeError::invalid_input(name.as_str(), "expected a file reference")),
                })
                .collect::<Result<Vec<_>>>()?;
            bound.files.insert(name.clone(), refs);
            continue;
        }

        let literal = match values.into_iter().next() {
            Some(InputValue::Literal(value)) | Some(InputValue::Qualified { value }) => Some(value),
            Some(InputValue::Reference { .. }) => {
                return Err(BridgeError::invalid_input(name.as_str(), "expected a literal value"))
            }
            None => desc.default_value().cloned(),
        };
        if let Some(value) = literal {
            bound
                .literals
                .insert(name.clone(), parse_literal(name, desc, &value)?);
        }
    }
    Ok(bound)
}

/// Validate a literal against its descriptor.
pub fn parse_literal(
    name: &str,
    desc: &InputDescription,
    value: &LiteralValue,
) -> Result<ArgValue> {
    let (data_type, allowed) = match &desc.kind {
        InputKind::Literal {
            data_type,
            allowed_values,
            ..
        } => (*data_type, allowed_values.as_deref()),
        InputKind::Complex { .. } => {
            return Err(BridgeError::invalid_input(name, "expected a file reference"))
        }
    };

    let parsed = match (data_type, value) {
        (LiteralDataType::Float, LiteralValue::Float(v)) => ArgValue::Float(*v),
        (LiteralDataType::Float, LiteralValue::Integer(v)) => ArgValue::Float(*v as f64),
        (LiteralDataType::Float, LiteralValue::Text(text)) => {
            let text = text.trim();
            match text.parse::<f64>() {
                Ok(v) => ArgValue::Float(v),
                Err(_) if Quantity::parse(text).is_some() => ArgValue::Text(text.to_string()),
                Err(_) => {
                    return Err(BridgeError::invalid_input(
                        name,
                        format!("expected a number or a quantity such as \"25 degC\", got {:?}", text),
                    ))
                }
            }
        }
        (LiteralDataType::Integer, LiteralValue::Integer(v)) => ArgValue::Integer(*v),
        (LiteralDataType::Integer, LiteralValue::Float(v)) if v.fract() == 0.0 => {
            ArgValue::Integer(*v as i64)
        }
        (LiteralDataType::Integer, LiteralValue::Text(text)) => {
            let v = text.trim().parse::<i64>().map_err(|_| {
                BridgeError::invalid_input(name, format!("expected an integer, got {:?}", text))
            })?;
            ArgValue::Integer(v)
        }
        (LiteralDataType::Integer, other) => {
            return Err(BridgeError::invalid_input(
                name,
                format!("expected an integer, got {}", other),
            ))
        }
        (LiteralDataType::String, other) => ArgValue::Text(other.to_text()),
    };

    if let (Some(allowed), ArgValue::Text(text)) = (allowed, &parsed) {
        if !allowed.iter().any(|a| a == text) {
            return Err(BridgeError::invalid_input(
                name,
                format!("must be one of {}, got {}", allowed.join(", "), text),
            ));
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use indicators::{Indicator, IndicatorCatalog};

    fn process(id: &str) -> ProcessDefinition {
        let catalog = IndicatorCatalog::builtin();
        let indicator: Arc<dyn Indicator> = Arc::clone(catalog.get(id).unwrap());
        ProcessDefinition::synthesize(indicator).unwrap()
    }

    fn request(pairs: Vec<(&str, InputValue)>) -> IndexMap<String, Vec<InputValue>> {
        let mut inputs: IndexMap<String, Vec<InputValue>> = IndexMap::new();
        for (name, value) in pairs {
            inputs.entry(name.to_string()).or_default().push(value);
        }
        inputs
    }

    #[test]
    fn test_defaults_fill_missing_literals() {
        let process = process("heat_wave_frequency");
        let bound = bind_inputs(
            &process,
            request(vec![
                ("tasmax", InputValue::reference("a.nc")),
                ("tasmin", InputValue::reference("b.nc")),
                ("thresh_tasmin", InputValue::literal("20 degC")),
            ]),
        )
        .unwrap();

        assert_eq!(bound.files.keys().collect::<Vec<_>>(), vec!["tasmin", "tasmax"]);
        assert!(matches!(&bound.literals["thresh_tasmin"], ArgValue::Text(t) if t == "20 degC"));
        assert!(matches!(&bound.literals["thresh_tasmax"], ArgValue::Text(t) if t == "30 degC"));
        assert!(matches!(bound.literals["window"], ArgValue::Integer(3)));
        assert_eq!(bound.frequency(), Some("YS"));
        assert_eq!(bound.file_sets().unwrap(), 1);
    }

    #[test]
    fn test_literal_validation() {
        let process = process("heat_wave_index");
        let base = || vec![("tasmax", InputValue::reference("a.nc"))];

        let mut bad_freq = base();
        bad_freq.push(("freq", InputValue::literal("W")));
        let err = bind_inputs(&process, request(bad_freq)).unwrap_err();
        assert!(err.to_string().contains("must be one of YS, MS, QS-DEC, AS-JUL"));

        let mut bad_window = base();
        bad_window.push(("window", InputValue::literal("three")));
        assert_eq!(bind_inputs(&process, request(bad_window)).unwrap_err().kind(), "invalid_input");

        let mut bad_thresh = base();
        bad_thresh.push(("thresh", InputValue::literal("hot")));
        assert!(bind_inputs(&process, request(bad_thresh)).is_err());

        let mut numeric = base();
        numeric.push(("thresh", InputValue::Literal(LiteralValue::Integer(300))));
        numeric.push(("window", InputValue::Qualified { value: LiteralValue::Float(4.0) }));
        let bound = bind_inputs(&process, request(numeric)).unwrap();
        assert!(matches!(bound.literals["thresh"], ArgValue::Float(v) if v == 300.0));
        assert!(matches!(bound.literals["window"], ArgValue::Integer(4)));
    }

    #[test]
    fn test_unknown_and_missing_inputs() {
        let process = process("tg_mean");

        let err = bind_inputs(
            &process,
            request(vec![
                ("tas", InputValue::reference("a.nc")),
                ("bogus", InputValue::literal("1")),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidInput { ref name, .. } if name == "bogus"));

        let err = bind_inputs(&process, request(vec![("freq", InputValue::literal("MS"))])).unwrap_err();
        assert!(err.to_string().contains("missing required input"));

        let err = bind_inputs(&process, request(vec![("tas", InputValue::literal("a.nc"))])).unwrap_err();
        assert!(err.to_string().contains("expected a file reference"));
    }

    #[test]
    fn test_file_sets_must_be_equal() {
        let process = process("dtr");
        let mut pairs = Vec::new();
        for i in 0..5 {
            pairs.push(("tasmax", InputValue::reference(format!("max{}.nc", i))));
            pairs.push(("tasmin", InputValue::reference(format!("min{}.nc", i))));
        }
        let bound = bind_inputs(&process, request(pairs.clone())).unwrap();
        assert_eq!(bound.file_sets().unwrap(), 5);
        assert_eq!(bound.files["tasmin"][3], "min3.nc");

        pairs.pop();
        let bound = bind_inputs(&process, request(pairs)).unwrap();
        let err = bound.file_sets().unwrap_err();
        assert_eq!(err.kind(), "computation");
        assert!(err.to_string().contains("must be equal"));
    }
}
