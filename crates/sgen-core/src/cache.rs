//! Value Cache / Change Detector
//!
//! The previous run's per-item results are kept in an immutable
//! [`StageCache`] snapshot. Each run diffs the newly observed fingerprints
//! against it by value, never by reference: a content-only edit changes the
//! signature and therefore the fingerprint.
use crate::error::TransformError;
use crate::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Unchanged,
    Added,
    Modified,
    Removed,
}

/// Partition of a run's items relative to the previous snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Current items in enumeration order with their classification
    current: Vec<(String, ChangeKind)>,
    /// Identities present before and missing now, in previous order
    removed: Vec<String>,
}

impl ChangeSet {
    pub fn current(&self) -> &[(String, ChangeKind)] {
        &self.current
    }

    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        match kind {
            ChangeKind::Removed => self.removed.len(),
            _ => self.current.iter().filter(|(_, k)| *k == kind).count(),
        }
    }

    pub fn identities(&self, kind: ChangeKind) -> Vec<&str> {
        match kind {
            ChangeKind::Removed => self.removed.iter().map(String::as_str).collect(),
            _ => self
                .current
                .iter()
                .filter(|(_, k)| *k == kind)
                .map(|(id, _)| id.as_str())
                .collect(),
        }
    }

    /// True when nothing was added, modified or removed.
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && self.current.iter().all(|(_, k)| *k == ChangeKind::Unchanged)
    }
}

/// Diff two fingerprint sequences in O(n).
///
/// `current` is expected to hold unique identities (see
/// [`StageSet`](crate::StageSet) construction); a repeated identity is
/// classified against the previous snapshot like any other.
pub fn detect_changes<'a, P, C>(previous: P, current: C) -> ChangeSet
where
    P: IntoIterator<Item = &'a Fingerprint>,
    C: IntoIterator<Item = &'a Fingerprint>,
{
    let previous: Vec<&Fingerprint> = previous.into_iter().collect();
    let by_identity: HashMap<&str, &Fingerprint> =
        previous.iter().map(|fp| (fp.identity(), *fp)).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut changes = ChangeSet::default();

    for fp in current {
        let kind = match by_identity.get(fp.identity()) {
            None => ChangeKind::Added,
            Some(old) if *old == fp => ChangeKind::Unchanged,
            Some(_) => ChangeKind::Modified,
        };
        seen.insert(fp.identity());
        changes.current.push((fp.identity().to_string(), kind));
    }

    changes.removed = previous
        .iter()
        .filter(|fp| !seen.contains(fp.identity()))
        .map(|fp| fp.identity().to_string())
        .collect();

    changes
}

/// Cached result of transforming one input. Failures are cached too, so an
/// unchanged malformed input is not re-transformed but still reported.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub fingerprint: Fingerprint,
    pub outcome: Result<T, TransformError>,
}

/// Immutable per-stage snapshot from the previous run.
#[derive(Debug, Clone)]
pub struct StageCache<T> {
    entries: Vec<CacheEntry<T>>,
    index: HashMap<String, usize>,
}

impl<T> Default for StageCache<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> StageCache<T> {
    /// Build a snapshot. Entries must have unique identities; on a repeat
    /// the first entry wins.
    pub fn from_entries(entries: Vec<CacheEntry<T>>) -> Self {
        let mut kept = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());
        for entry in entries {
            if index.contains_key(entry.fingerprint.identity()) {
                continue;
            }
            index.insert(entry.fingerprint.identity().to_string(), kept.len());
            kept.push(entry);
        }
        Self { entries: kept, index }
    }

    pub fn get(&self, identity: &str) -> Option<&CacheEntry<T>> {
        self.index.get(identity).map(|&i| &self.entries[i])
    }

    pub fn fingerprints(&self) -> impl Iterator<Item = &Fingerprint> {
        self.entries.iter().map(|e| &e.fingerprint)
    }

    pub fn entries(&self) -> &[CacheEntry<T>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
