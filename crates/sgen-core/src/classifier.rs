//! Input Classifier: relevance predicate + fingerprint extraction
//!
//! Classifiers look at identity and static shape only. Signatures come from
//! the input's revision token, so classification never reads content.
use crate::fingerprint::Fingerprint;
use crate::input::{InputKind, RawInput};
use serde::{Deserialize, Serialize};

/// A relevant input together with its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub fingerprint: Fingerprint,
    pub kind: InputKind,
}

/// Decides whether an input belongs to a generation rule.
///
/// Returning `None` covers both "irrelevant" and "malformed identity"; such
/// items are excluded without a diagnostic. Must be deterministic.
pub trait Classifier: Send + Sync {
    fn classify(&self, raw: &RawInput) -> Option<Classified>;
}

impl<F> Classifier for F
where
    F: Fn(&RawInput) -> Option<Classified> + Send + Sync,
{
    fn classify(&self, raw: &RawInput) -> Option<Classified> {
        self(raw)
    }
}

/// Declarations whose name ends with a suffix, e.g. `Command`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationSuffix {
    pub suffix: String,
}

impl DeclarationSuffix {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self { suffix: suffix.into() }
    }
}

impl Classifier for DeclarationSuffix {
    fn classify(&self, raw: &RawInput) -> Option<Classified> {
        if raw.kind() != InputKind::Declaration || !raw.name().ends_with(&self.suffix) {
            return None;
        }
        if !is_identifier(raw.name()) {
            tracing::trace!(name = raw.name(), "skipping declaration with malformed name");
            return None;
        }
        Some(Classified {
            fingerprint: Fingerprint::new(raw.name(), raw.revision().clone()),
            kind: InputKind::Declaration,
        })
    }
}

/// Additional files whose path ends with an extension, e.g. `.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileExtension {
    pub extension: String,
}

impl FileExtension {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl Classifier for FileExtension {
    fn classify(&self, raw: &RawInput) -> Option<Classified> {
        if raw.kind() != InputKind::AdditionalFile || !raw.name().ends_with(&self.extension) {
            return None;
        }
        // `.txt` alone has no stem to name anything after
        match raw.file_stem() {
            Some(stem) if !stem.is_empty() && !stem.starts_with('.') => {}
            _ => {
                tracing::trace!(path = raw.name(), "skipping file without a usable stem");
                return None;
            }
        }
        Some(Classified {
            fingerprint: Fingerprint::new(raw.name(), raw.revision().clone()),
            kind: InputKind::AdditionalFile,
        })
    }
}

/// ASCII identifier: `[A-Za-z_][A-Za-z0-9_]*`, and not a lone underscore.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
