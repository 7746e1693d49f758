//! Template loading for sgen-out.
//!
//! Templates files are YAML:
//!
//! ```yaml
//! version: "1.0"
//! templates:
//!   command_list:
//!     description: Names of all command declarations
//!     template: "pub const COMMANDS: &[&str] = &[{{quoted_list commands \", \"}}];"
//! ```

use crate::TemplateError;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Top-level templates file structure
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesFile {
    pub version: String,
    pub templates: BTreeMap<String, Template>,
}

/// A single template definition
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub description: String,
    pub template: String,
}

impl TemplatesFile {
    /// Load templates from a YAML file
    pub fn load(path: &str) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TemplateError::Load(format!("{}: {}", path, e)))?;
        Self::from_yaml(&content)
    }

    /// Parse templates from YAML content
    pub fn from_yaml(yaml: &str) -> Result<Self, TemplateError> {
        serde_yaml::from_str(yaml).map_err(|e| TemplateError::Load(e.to_string()))
    }

    /// Overlay `other` on top of `self`; templates with the same name are
    /// replaced.
    pub fn merged(mut self, other: TemplatesFile) -> Self {
        self.templates.extend(other.templates);
        self
    }

    /// Get a template by name
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// List all template names
    pub fn list_templates(&self) -> Vec<&str> {
        self.templates.keys().map(|s| s.as_str()).collect()
    }
}
