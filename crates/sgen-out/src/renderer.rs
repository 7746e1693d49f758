//! Template rendering for sgen-out.
//!
//! Uses Handlebars with HTML escaping turned off (output is source text)
//! and a few helpers for emitting code:
//! - quote: string literal with escapes (`"a\"b"`)
//! - quoted_list: quote every item of an array and join with a separator
//! - raw_string: raw string literal with enough `#`s for its content
//! - ident: pass a value through only if it is a valid identifier

use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde::Serialize;
use serde_json::Value;
use sgen_core::is_identifier;

use crate::templates::TemplatesFile;
use crate::TemplateError;

handlebars_helper!(quote: |s: str| format!("{:?}", s));

handlebars_helper!(quoted_list: |items: array, sep: str| {
    items
        .iter()
        .map(|v| match v.as_str() {
            Some(s) => format!("{:?}", s),
            None => format!("{:?}", v.to_string()),
        })
        .collect::<Vec<_>>()
        .join(sep)
});

handlebars_helper!(raw_string: |s: str| raw_literal(s));

handlebars_helper!(ident: |s: str| {
    if is_identifier(s) { s.to_string() } else { String::new() }
});

/// `r"..."` with the fewest `#`s that keep `text` from closing it early.
pub fn raw_literal(text: &str) -> String {
    let mut hashes = 0;
    while text.contains(&format!("\"{}", "#".repeat(hashes))) {
        hashes += 1;
    }
    let fence = "#".repeat(hashes);
    format!("r{fence}\"{text}\"{fence}")
}

/// Compiled renderer with registered helpers
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
    templates: TemplatesFile,
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("templates", &self.templates.list_templates())
            .finish()
    }
}

impl TemplateRenderer {
    /// Compile every template of `templates`. In strict mode a reference to
    /// a missing field is a render error instead of an empty string.
    pub fn new(templates: TemplatesFile, strict: bool) -> Result<Self, TemplateError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(strict);
        handlebars.register_escape_fn(no_escape);

        handlebars.register_helper("quote", Box::new(quote));
        handlebars.register_helper("quoted_list", Box::new(quoted_list));
        handlebars.register_helper("raw_string", Box::new(raw_string));
        handlebars.register_helper("ident", Box::new(ident));

        for (name, template) in &templates.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| TemplateError::Compile {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(TemplateRenderer { handlebars, templates })
    }

    /// Load from a file path
    pub fn load(path: &str, strict: bool) -> Result<Self, TemplateError> {
        Self::new(TemplatesFile::load(path)?, strict)
    }

    /// Render a named template with data
    pub fn render<S: Serialize>(&self, template_name: &str, data: &S) -> Result<String, TemplateError> {
        if !self.handlebars.has_template(template_name) {
            return Err(TemplateError::Missing(template_name.to_string()));
        }
        self.handlebars
            .render(template_name, data)
            .map_err(|e| TemplateError::Render {
                name: template_name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Render a template string directly (not from file)
    pub fn render_string(&self, template: &str, data: &Value) -> Result<String, TemplateError> {
        self.handlebars
            .render_template(template, data)
            .map_err(|e| TemplateError::Render {
                name: "inline".to_string(),
                reason: e.to_string(),
            })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    /// List available template names
    pub fn list_templates(&self) -> Vec<&str> {
        self.templates.list_templates()
    }
}
