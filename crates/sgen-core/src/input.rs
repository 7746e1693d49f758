//! Raw inputs supplied by the host once per run.
//!
//! The engine only reads these. Content is loaded lazily and memoized, so a
//! classifier that never touches content never pays for the read, and a
//! transform never reads the same input twice within a run.
use crate::error::TransformError;
use crate::fingerprint::Signature;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// A parsed declaration from the source tree (identity = declared name)
    Declaration,
    /// An auxiliary text file (identity = path)
    AdditionalFile,
}

type Loader = Arc<dyn Fn() -> std::io::Result<String> + Send + Sync>;

/// Handle to a single external item.
#[derive(Clone)]
pub struct RawInput {
    kind: InputKind,
    name: String,
    revision: Signature,
    content: Arc<OnceCell<Result<String, String>>>,
    loader: Option<Loader>,
}

impl RawInput {
    /// A declaration whose revision is derived from its text.
    pub fn declaration(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::eager(InputKind::Declaration, name.into(), text.into())
    }

    /// An additional file whose revision is derived from its content.
    pub fn additional_file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self::eager(InputKind::AdditionalFile, path.into(), content.into())
    }

    /// An additional file read on first access. `revision` must change iff the
    /// content changes (e.g. a hash or mtime+size token computed by the host).
    pub fn lazy_file<F>(path: impl Into<String>, revision: Signature, loader: F) -> Self
    where
        F: Fn() -> std::io::Result<String> + Send + Sync + 'static,
    {
        Self {
            kind: InputKind::AdditionalFile,
            name: path.into(),
            revision,
            content: Arc::new(OnceCell::new()),
            loader: Some(Arc::new(loader)),
        }
    }

    fn eager(kind: InputKind, name: String, content: String) -> Self {
        Self {
            kind,
            name,
            revision: Signature::of_str(&content),
            content: Arc::new(OnceCell::with_value(Ok(content))),
            loader: None,
        }
    }

    /// Replace the revision token, keeping content as is.
    pub fn with_revision(mut self, revision: Signature) -> Self {
        self.revision = revision;
        self
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }

    /// Path (additional files) or declared name (declarations).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn revision(&self) -> &Signature {
        &self.revision
    }

    /// File name without directories and extension.
    pub fn file_stem(&self) -> Option<&str> {
        Path::new(&self.name).file_stem().and_then(|s| s.to_str())
    }

    /// Content, read at most once per handle (clones share the memo).
    pub fn content(&self) -> Result<&str, TransformError> {
        let cached = self.content.get_or_init(|| match &self.loader {
            Some(load) => load().map_err(|e| e.to_string()),
            None => Err("no content source".to_string()),
        });
        cached
            .as_deref()
            .map_err(|e| TransformError::ContentUnavailable(format!("{}: {}", self.name, e)))
    }

    /// Whether content has already been read.
    pub fn content_loaded(&self) -> bool {
        self.content.get().is_some()
    }
}

impl fmt::Debug for RawInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawInput")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("revision", &self.revision)
            .field("content_loaded", &self.content_loaded())
            .finish()
    }
}
