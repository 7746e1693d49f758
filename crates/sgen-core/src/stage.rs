//! Stage Transform and the ordered per-stage result set
use crate::error::TransformError;
use crate::fingerprint::{Fingerprint, Signature};
use crate::input::RawInput;
use std::collections::HashMap;

/// Pure per-item transform.
///
/// Invoked only for added or modified inputs. Implementations must not keep
/// mutable state between calls: invocation order and count are not stable
/// across runs, only the resulting set is.
pub trait Transform<T>: Send + Sync {
    fn transform(&self, raw: &RawInput) -> Result<T, TransformError>;
}

impl<T, F> Transform<T> for F
where
    F: Fn(&RawInput) -> Result<T, TransformError> + Send + Sync,
{
    fn transform(&self, raw: &RawInput) -> Result<T, TransformError> {
        self(raw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageEntry<T> {
    pub fingerprint: Fingerprint,
    pub value: T,
}

/// Live entries of a stage, in classifier enumeration order, unique by
/// identity.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSet<T> {
    entries: Vec<StageEntry<T>>,
}

impl<T> Default for StageSet<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> StageSet<T> {
    /// Build a set; a repeated identity is dropped (first wins).
    pub fn from_entries(entries: Vec<StageEntry<T>>) -> Self {
        let (entries, _) = first_wins(entries, |e| &e.fingerprint);
        Self { entries }
    }

    pub fn entries(&self) -> &[StageEntry<T>] {
        &self.entries
    }

    pub fn values(&self) -> Vec<&T> {
        self.entries.iter().map(|e| &e.value).collect()
    }

    pub fn identities(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.fingerprint.identity()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An identity seen more than once in a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub identity: String,
    /// The dropped occurrence has a different signature than the kept one.
    pub conflicting: bool,
}

/// Keep the first occurrence of every identity, preserving order.
pub fn first_wins<I>(
    items: Vec<I>,
    fingerprint: impl Fn(&I) -> &Fingerprint,
) -> (Vec<I>, Vec<Duplicate>) {
    let mut kept = Vec::with_capacity(items.len());
    let mut seen: HashMap<String, Signature> = HashMap::new();
    let mut duplicates = Vec::new();

    for item in items {
        let fp = fingerprint(&item);
        match seen.get(fp.identity()) {
            Some(first) => duplicates.push(Duplicate {
                identity: fp.identity().to_string(),
                conflicting: first != fp.signature(),
            }),
            None => {
                seen.insert(fp.identity().to_string(), fp.signature().clone());
                kept.push(item);
            }
        }
    }

    (kept, duplicates)
}
