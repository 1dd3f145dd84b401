//! # Configuration
//!
//! Serializable settings for graphs and emitters, loadable from JSON.

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};

/// Identity and package metadata of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    pub name: String,
    pub label: String,
    pub description: String,
    #[serde(default)]
    pub package_name: String,
    #[serde(default)]
    pub package_description: String,
}

impl GraphConfig {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: description.into(),
            package_name: String::new(),
            package_description: String::new(),
        }
    }

    pub fn with_package(
        mut self,
        package_name: impl Into<String>,
        package_description: impl Into<String>,
    ) -> Self {
        self.package_name = package_name.into();
        self.package_description = package_description.into();
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: GraphConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Name, label and description are required; package fields may be empty.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(GraphError::MissingField("name"));
        }
        if self.label.is_empty() {
            return Err(GraphError::MissingField("label"));
        }
        if self.description.is_empty() {
            return Err(GraphError::MissingField("description"));
        }
        Ok(())
    }
}

/// Spelling choices of the generated source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Tool name written into the generated-code header.
    pub generator: String,
    /// Variable that receives error-like outputs.
    pub error_binding: String,
    /// Placeholder for ignored parameters and results.
    pub discard: String,
    pub indent: String,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            generator: "fgc".to_string(),
            error_binding: "err".to_string(),
            discard: "_".to_string(),
            indent: "\t".to_string(),
        }
    }
}

impl EmitterConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
