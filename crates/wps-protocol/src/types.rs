//! Core types shared by process, job and landing documents.

use serde::{Deserialize, Serialize};

/// A hyperlink to a related resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    /// The URI of the linked resource.
    pub href: String,

    /// The relationship type (e.g., "self", "results", "conformance").
    pub rel: String,

    /// The media type of the linked resource.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// A human-readable title for the link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    /// Create a new link with required fields.
    pub fn new(href: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            type_: None,
            title: None,
        }
    }

    /// Set the media type.
    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Free-form metadata entry attached to a descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_builder() {
        let link = Link::new("http://localhost:5000/processes", "self")
            .with_type("application/json")
            .with_title("Process list");

        assert_eq!(link.rel, "self");
        assert_eq!(link.type_.as_deref(), Some("application/json"));
        assert_eq!(link.title.as_deref(), Some("Process list"));
    }

    #[test]
    fn test_link_serialization_skips_empty_fields() {
        let json = serde_json::to_string(&Link::new("http://x", "self")).unwrap();
        assert!(json.contains("\"href\":\"http://x\""));
        assert!(!json.contains("\"type\""));
        assert!(!json.contains("\"title\""));
    }
}
