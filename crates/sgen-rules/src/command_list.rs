//! Command list: collect the names of declarations ending in a suffix.
use crate::emit::TemplateEmitter;
use crate::RulesConfig;
use sgen_core::{
    CollectValues, DeclarationSuffix, EmptyPolicy, GenerationRule, Pipeline, RawInput,
    TransformError,
};
use sgen_out::TemplateRenderer;
use std::sync::Arc;

pub const NAME: &str = "command_list";
pub const OUTPUT: &str = "command_list.g.rs";

/// The declared name is the whole value; declaration bodies do not matter.
pub fn declared_name(raw: &RawInput) -> Result<String, TransformError> {
    Ok(raw.name().to_string())
}

pub fn rule(config: &RulesConfig, renderer: &Arc<TemplateRenderer>) -> Box<dyn GenerationRule> {
    Box::new(
        Pipeline::new(
            NAME,
            OUTPUT,
            DeclarationSuffix::new(config.command_suffix.clone()),
            declared_name,
            CollectValues,
            TemplateEmitter::new(renderer.clone(), NAME, "commands"),
        )
        .with_empty_policy(EmptyPolicy::EmitEmpty),
    )
}
