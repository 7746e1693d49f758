//! Unified Error Model
//!
//! Engine-level failures are `SgenError`. Failures scoped to a single item
//! (`TransformError`) or a single output (`EmitError`) never abort a run;
//! they are turned into [`Diagnostic`](crate::Diagnostic)s instead.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SgenError {
    #[error("CANCELLED/{0}")]
    Cancelled(String),

    #[error("CONFIG/{0}")]
    ConfigError(String),

    #[error("RULE/{0}")]
    RuleError(String),
}

/// A single input could not be converted into a stage value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("content unavailable: {0}")]
    ContentUnavailable(String),

    #[error("malformed content: {0}")]
    Malformed(String),

    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
}

impl TransformError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContentUnavailable(_) => "TRANSFORM/CONTENT",
            Self::Malformed(_) => "TRANSFORM/MALFORMED",
            Self::InvalidIdentifier(_) => "TRANSFORM/IDENT",
        }
    }
}

/// An output document could not be produced from its aggregate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("template '{name}' failed: {reason}")]
    Template { name: String, reason: String },

    #[error("merge failed: {0}")]
    Merge(String),
}

impl EmitError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Template { .. } => "EMIT/TEMPLATE",
            Self::Merge(_) => "EMIT/MERGE",
        }
    }
}
