//! Output Emitter and the publish-if-changed ledger
use crate::error::EmitError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    /// Hint name, e.g. "command_list.g.rs"
    pub name: String,
    pub text: String,
}

impl GeneratedDocument {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Renders the text of one output from its aggregate.
///
/// Must be a pure function of `agg` (plus static templates): the engine
/// republishes whenever the text differs, so any nondeterminism shows up as
/// a spurious republish.
pub trait Emitter<A>: Send + Sync {
    fn emit(&self, agg: &A) -> Result<String, EmitError>;
}

impl<A, F> Emitter<A> for F
where
    F: Fn(&A) -> Result<String, EmitError> + Send + Sync,
{
    fn emit(&self, agg: &A) -> Result<String, EmitError> {
        self(agg)
    }
}

/// What happened to a document when it was offered for publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Publication {
    /// First publication under this name
    Published(GeneratedDocument),
    /// Text differs from the previous publication
    Republished(GeneratedDocument),
    /// Same text as before; the previous publication stands
    Unchanged { name: String },
}

impl Publication {
    pub fn name(&self) -> &str {
        match self {
            Self::Published(doc) | Self::Republished(doc) => &doc.name,
            Self::Unchanged { name } => name,
        }
    }

    /// The document the host has to (re)write, if any.
    pub fn document(&self) -> Option<&GeneratedDocument> {
        match self {
            Self::Published(doc) | Self::Republished(doc) => Some(doc),
            Self::Unchanged { .. } => None,
        }
    }

    pub fn is_change(&self) -> bool {
        self.document().is_some()
    }
}

/// Documents published so far, by name. The engine only ever adds or
/// replaces documents; [`PublishLedger::forget`] is for a host that failed
/// to deliver one.
#[derive(Debug, Clone, Default)]
pub struct PublishLedger {
    documents: BTreeMap<String, String>,
}

impl PublishLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, doc: GeneratedDocument) -> Publication {
        if self.documents.get(&doc.name) == Some(&doc.text) {
            return Publication::Unchanged { name: doc.name };
        }
        match self.documents.insert(doc.name.clone(), doc.text.clone()) {
            None => Publication::Published(doc),
            Some(_) => Publication::Republished(doc),
        }
    }

    /// Drop the record of `name` so the next offer publishes it again.
    pub fn forget(&mut self, name: &str) -> Option<String> {
        self.documents.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.documents.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
