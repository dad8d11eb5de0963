//! Keyword arguments passed to an indicator.

use indexmap::IndexMap;
use netcdf_io::LazyArray;

use crate::error::{IndicatorError, IndicatorResult};
use crate::resample::Frequency;
use crate::units::Quantity;

/// One argument value.
#[derive(Debug, Clone)]
pub enum ArgValue {
    Array(LazyArray),
    Text(String),
    Float(f64),
    Integer(i64),
}

/// Keyword arguments by parameter name.
#[derive(Debug, Clone, Default)]
pub struct IndicatorArgs {
    values: IndexMap<String, ArgValue>,
}

impl IndicatorArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Required array argument.
    pub fn array(&self, name: &str) -> IndicatorResult<&LazyArray> {
        match self.values.get(name) {
            Some(ArgValue::Array(array)) => Ok(array),
            Some(_) => Err(IndicatorError::invalid(name, "expected a dataset variable")),
            None => Err(IndicatorError::MissingArgument(name.to_string())),
        }
    }

    /// Resampling frequency, `YS` when not given.
    pub fn frequency(&self) -> IndicatorResult<Frequency> {
        match self.values.get("freq") {
            None => Ok(Frequency::Annual),
            Some(ArgValue::Text(text)) => Frequency::parse(text)
                .ok_or_else(|| IndicatorError::invalid("freq", format!("unknown frequency {}", text))),
            Some(_) => Err(IndicatorError::invalid("freq", "expected a string")),
        }
    }

    /// Quantity argument such as a threshold, `default` when not given.
    pub fn quantity(&self, name: &str, default: &str) -> IndicatorResult<Quantity> {
        match self.values.get(name) {
            None => Quantity::parse(default)
                .ok_or_else(|| IndicatorError::invalid(name, format!("bad default {}", default))),
            Some(ArgValue::Float(v)) => Ok(Quantity::new(*v, None)),
            Some(ArgValue::Integer(v)) => Ok(Quantity::new(*v as f64, None)),
            Some(ArgValue::Text(text)) => Quantity::parse(text)
                .ok_or_else(|| IndicatorError::invalid(name, format!("not a quantity: {}", text))),
            Some(ArgValue::Array(_)) => Err(IndicatorError::invalid(name, "expected a scalar")),
        }
    }

    /// Positive integer argument, `default` when not given.
    pub fn positive_integer(&self, name: &str, default: usize) -> IndicatorResult<usize> {
        let value = match self.values.get(name) {
            None => return Ok(default),
            Some(ArgValue::Integer(v)) => *v,
            Some(ArgValue::Float(v)) if v.fract() == 0.0 => *v as i64,
            Some(ArgValue::Text(text)) => text
                .trim()
                .parse()
                .map_err(|_| IndicatorError::invalid(name, format!("not an integer: {}", text)))?,
            Some(_) => return Err(IndicatorError::invalid(name, "expected an integer")),
        };
        usize::try_from(value)
            .ok()
            .filter(|&v| v > 0)
            .ok_or_else(|| IndicatorError::invalid(name, format!("must be positive, got {}", value)))
    }
}
