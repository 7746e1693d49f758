//! sgen-out: template layer for generated documents
//!
//! Emitters describe their output as named Handlebars templates, loaded from
//! a YAML templates file, and render them from their aggregate value.
//!
//! # Example
//!
//! ```ignore
//! use sgen_out::{TemplateRenderer, TemplatesFile};
//! use serde_json::json;
//!
//! let templates = TemplatesFile::load("templates/generators.yaml")?;
//! let renderer = TemplateRenderer::new(templates, true)?;
//! let text = renderer.render("command_list", &json!({ "commands": ["BarCommand"] }))?;
//! ```

pub mod renderer;
pub mod templates;

pub use renderer::{raw_literal, TemplateRenderer};
pub use templates::{Template, TemplatesFile};

use thiserror::Error;

/// Errors that can occur while loading or rendering templates
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template load failed: {0}")]
    Load(String),
    #[error("Template '{name}' does not compile: {reason}")]
    Compile { name: String, reason: String },
    #[error("Template '{0}' not found")]
    Missing(String),
    #[error("Render of '{name}' failed: {reason}")]
    Render { name: String, reason: String },
}
