//! Structured diagnostics, scoped to one item or one output
use crate::error::{EmitError, TransformError};
use crate::stage::Duplicate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable code, e.g. "TRANSFORM/MALFORMED"
    pub code: String,
    /// Rule that raised it
    pub rule: String,
    /// Input identity or output name
    pub location: String,
    pub message: String,
}

impl Diagnostic {
    pub fn transform(rule: &str, identity: &str, error: &TransformError) -> Self {
        Self {
            severity: Severity::Error,
            code: error.code().to_string(),
            rule: rule.to_string(),
            location: identity.to_string(),
            message: error.to_string(),
        }
    }

    pub fn emit(rule: &str, output: &str, error: &EmitError) -> Self {
        Self {
            severity: Severity::Error,
            code: error.code().to_string(),
            rule: rule.to_string(),
            location: output.to_string(),
            message: error.to_string(),
        }
    }

    pub fn duplicate(rule: &str, duplicate: &Duplicate) -> Self {
        let message = if duplicate.conflicting {
            "identity seen more than once with different content; the first occurrence wins"
        } else {
            "identity seen more than once; later occurrences ignored"
        };
        Self {
            severity: Severity::Warning,
            code: "CLASSIFY/DUPLICATE".to_string(),
            rule: rule.to_string(),
            location: duplicate.identity.clone(),
            message: message.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "{}[{}] {}: {} ({})",
            level, self.code, self.location, self.message, self.rule
        )
    }
}
