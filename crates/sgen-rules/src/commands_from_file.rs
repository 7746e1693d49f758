//! Commands from file: every line of a command file becomes a placeholder
//! declaration.
use crate::emit::TemplateEmitter;
use crate::RulesConfig;
use serde::{Deserialize, Serialize};
use sgen_core::{
    is_identifier, EmptyPolicy, FileExtension, FlattenValues, GenerationRule, Pipeline, RawInput,
    TransformError,
};
use sgen_out::TemplateRenderer;
use std::sync::Arc;

pub const NAME: &str = "commands_from_file";
pub const OUTPUT: &str = "commands_from_file.g.rs";

/// What to do with a line that is not a valid identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinePolicy {
    /// Emit every line as is
    #[default]
    PassThrough,
    /// Drop blank lines and lines that are not identifiers
    SkipInvalid,
    /// Fail the whole file on the first invalid line
    Reject,
}

/// Transform for one command file under a line policy.
#[derive(Debug, Clone, Copy)]
pub struct CommandLines {
    pub policy: LinePolicy,
}

impl CommandLines {
    pub fn lines(&self, path: &str, content: &str) -> Result<Vec<String>, TransformError> {
        let mut out = Vec::new();
        for (n, line) in content.lines().enumerate() {
            if self.policy == LinePolicy::PassThrough || is_identifier(line.trim()) {
                let line = match self.policy {
                    LinePolicy::PassThrough => line,
                    _ => line.trim(),
                };
                out.push(line.to_string());
                continue;
            }
            if self.policy == LinePolicy::Reject {
                return Err(TransformError::Malformed(format!(
                    "line {} is not an identifier: {:?}",
                    n + 1,
                    line
                )));
            }
            tracing::debug!(path, line = n + 1, "skipping invalid command line");
        }
        Ok(out)
    }
}

impl sgen_core::Transform<Vec<String>> for CommandLines {
    fn transform(&self, raw: &RawInput) -> Result<Vec<String>, TransformError> {
        self.lines(raw.name(), raw.content()?)
    }
}

pub fn rule(config: &RulesConfig, renderer: &Arc<TemplateRenderer>) -> Box<dyn GenerationRule> {
    Box::new(
        Pipeline::new(
            NAME,
            OUTPUT,
            FileExtension::new(config.text_extension.clone()),
            CommandLines {
                policy: config.line_policy,
            },
            FlattenValues,
            TemplateEmitter::new(renderer.clone(), NAME, "commands"),
        )
        .with_empty_policy(EmptyPolicy::EmitEmpty),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = "Start\n\nstop now\r\nStatus\n";

    #[test]
    fn test_pass_through_keeps_every_line() {
        let lines = CommandLines { policy: LinePolicy::PassThrough }
            .lines("c.txt", CONTENT)
            .unwrap();
        assert_eq!(lines, vec!["Start", "", "stop now", "Status"]);
    }

    #[test]
    fn test_skip_invalid() {
        let lines = CommandLines { policy: LinePolicy::SkipInvalid }
            .lines("c.txt", CONTENT)
            .unwrap();
        assert_eq!(lines, vec!["Start", "Status"]);
    }

    #[test]
    fn test_reject_names_the_line() {
        let err = CommandLines { policy: LinePolicy::Reject }
            .lines("c.txt", CONTENT)
            .unwrap_err();
        assert_eq!(
            err,
            TransformError::Malformed("line 2 is not an identifier: \"\"".to_string())
        );
    }

    #[test]
    fn test_trailing_newline_adds_no_line() {
        let lines = CommandLines { policy: LinePolicy::PassThrough }
            .lines("c.txt", "X\nY\n")
            .unwrap();
        assert_eq!(lines, vec!["X", "Y"]);
    }
}
