//! sgen Rules: the statically registered generation rules.
//!
//! Each rule is a `(classifier, transform, aggregate, emitter)` pipeline
//! over the shared engine contract. Rules are listed in [`REGISTRY`] and
//! built by [`default_rules`]; nothing registers itself at runtime.
//!
//! | rule                 | matches                         | output                    |
//! |----------------------|---------------------------------|---------------------------|
//! | `command_list`       | declarations ending in `Command`| `command_list.g.rs`       |
//! | `commands_from_file` | `.txt` files, one name per line | `commands_from_file.g.rs` |
//! | `sql_queries`        | `.sql` files, one query each    | `sql_queries.g.rs`        |

pub mod command_list;
pub mod commands_from_file;
pub mod emit;
pub mod sql_queries;

pub use commands_from_file::LinePolicy;
pub use emit::TemplateEmitter;

use serde::{Deserialize, Serialize};
use sgen_core::GenerationRule;
use sgen_out::{TemplateError, TemplateRenderer, TemplatesFile};
use std::sync::Arc;
use thiserror::Error;

/// Built-in templates for every registered rule
pub const DEFAULT_TEMPLATES: &str = include_str!("../templates/generators.yaml");

type RuleFactory = fn(&RulesConfig, &Arc<TemplateRenderer>) -> Box<dyn GenerationRule>;

/// Every known rule, in registration order.
pub const REGISTRY: &[(&str, RuleFactory)] = &[
    (command_list::NAME, command_list::rule),
    (commands_from_file::NAME, commands_from_file::rule),
    (sql_queries::NAME, sql_queries::rule),
];

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Templates: {0}")]
    Template(#[from] TemplateError),
    #[error("Unknown rule '{0}'")]
    UnknownRule(String),
    #[error("Template '{0}' required by a rule is missing")]
    MissingTemplate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Declaration name suffix for `command_list`
    pub command_suffix: String,
    /// File extension for `commands_from_file`
    pub text_extension: String,
    /// File extension for `sql_queries`
    pub sql_extension: String,
    pub line_policy: LinePolicy,
    /// YAML templates overriding the built-in ones by name
    pub templates_path: Option<String>,
    /// Missing template fields are errors
    pub strict_templates: bool,
    /// Rules to leave out
    pub disabled: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            command_suffix: "Command".to_string(),
            text_extension: ".txt".to_string(),
            sql_extension: ".sql".to_string(),
            line_policy: LinePolicy::default(),
            templates_path: None,
            strict_templates: true,
            disabled: Vec::new(),
        }
    }
}

/// Built-in templates with the optional override file laid on top.
pub fn load_templates(config: &RulesConfig) -> Result<TemplateRenderer, RuleError> {
    let mut templates = TemplatesFile::from_yaml(DEFAULT_TEMPLATES)?;
    if let Some(path) = &config.templates_path {
        templates = templates.merged(TemplatesFile::load(path)?);
    }
    Ok(TemplateRenderer::new(templates, config.strict_templates)?)
}

/// Build the enabled rules, in registration order.
pub fn default_rules(config: &RulesConfig) -> Result<Vec<Box<dyn GenerationRule>>, RuleError> {
    if let Some(unknown) = config
        .disabled
        .iter()
        .find(|name| !REGISTRY.iter().any(|(known, _)| *known == name.as_str()))
    {
        return Err(RuleError::UnknownRule(unknown.clone()));
    }

    let renderer = Arc::new(load_templates(config)?);
    let mut rules = Vec::new();
    for (name, factory) in REGISTRY {
        if config.disabled.iter().any(|d| d == name) {
            tracing::debug!(rule = name, "rule disabled");
            continue;
        }
        if !renderer.has_template(name) {
            return Err(RuleError::MissingTemplate(name.to_string()));
        }
        rules.push(factory(config, &renderer));
    }
    Ok(rules)
}
