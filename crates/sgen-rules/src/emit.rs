//! Emitter backed by a named template
use serde::Serialize;
use sgen_core::{EmitError, Emitter};
use sgen_out::{TemplateError, TemplateRenderer};
use std::sync::Arc;

/// Renders `template` with the aggregate bound to `field`.
pub struct TemplateEmitter {
    renderer: Arc<TemplateRenderer>,
    template: &'static str,
    field: &'static str,
}

impl TemplateEmitter {
    pub fn new(renderer: Arc<TemplateRenderer>, template: &'static str, field: &'static str) -> Self {
        Self {
            renderer,
            template,
            field,
        }
    }
}

impl<A: Serialize> Emitter<A> for TemplateEmitter {
    fn emit(&self, agg: &A) -> Result<String, EmitError> {
        let value = serde_json::to_value(agg).map_err(|e| EmitError::Merge(e.to_string()))?;
        let mut data = serde_json::Map::new();
        data.insert(self.field.to_string(), value);

        self.renderer
            .render(self.template, &data)
            .map_err(|e| match e {
                TemplateError::Render { name, reason } | TemplateError::Compile { name, reason } => {
                    EmitError::Template { name, reason }
                }
                other => EmitError::Template {
                    name: self.template.to_string(),
                    reason: other.to_string(),
                },
            })
    }
}
