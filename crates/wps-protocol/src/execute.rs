//! Execute request documents.
//!
//! Inputs are bound by name. Each name maps to one value or an array of
//! values; a value is either a file reference (`{"href": ...}`), a qualified
//! literal (`{"value": ...}`) or a bare literal.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A scalar value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LiteralValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl LiteralValue {
    /// Render the value the way a client would have typed it.
    pub fn to_text(&self) -> String {
        match self {
            Self::Integer(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Text(v) => v.clone(),
        }
    }
}

impl std::fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

/// One bound input value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum InputValue {
    /// Reference to a remote or local file.
    Reference {
        href: String,

        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
    },

    /// Literal wrapped in an object.
    Qualified { value: LiteralValue },

    /// Bare literal.
    Literal(LiteralValue),
}

impl InputValue {
    pub fn reference(href: impl Into<String>) -> Self {
        Self::Reference {
            href: href.into(),
            media_type: None,
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(LiteralValue::Text(value.into()))
    }
}

/// One or many values bound to the same input name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExecuteInput {
    Many(Vec<InputValue>),
    One(InputValue),
}

impl ExecuteInput {
    pub fn into_values(self) -> Vec<InputValue> {
        match self {
            Self::Many(values) => values,
            Self::One(value) => vec![value],
        }
    }
}

/// Body of `POST /processes/{id}/execution`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub inputs: IndexMap<String, ExecuteInput>,
}

impl ExecuteRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind one more value to `name`, keeping values already bound.
    pub fn push(&mut self, name: impl Into<String>, value: InputValue) {
        let name = name.into();
        let mut values = self
            .inputs
            .shift_remove(&name)
            .map(ExecuteInput::into_values)
            .unwrap_or_default();
        values.push(value);
        self.inputs.insert(name, ExecuteInput::Many(values));
    }

    /// Flatten every input into a list of values, in request order.
    pub fn into_values(self) -> IndexMap<String, Vec<InputValue>> {
        self.inputs
            .into_iter()
            .map(|(name, input)| (name, input.into_values()))
            .collect()
    }
}
