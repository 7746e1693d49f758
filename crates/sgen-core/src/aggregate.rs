//! Collector / Aggregator
//!
//! Merges a stage's values into the single value an emitter consumes. The
//! merge sees values in enumeration order, so equal stage sets always
//! produce equal aggregates.
use crate::error::EmitError;
use crate::stage::StageSet;

pub trait Aggregate<T, A>: Send + Sync {
    fn aggregate(&self, set: &StageSet<T>) -> Result<A, EmitError>;
}

impl<T, A, F> Aggregate<T, A> for F
where
    F: Fn(&StageSet<T>) -> Result<A, EmitError> + Send + Sync,
{
    fn aggregate(&self, set: &StageSet<T>) -> Result<A, EmitError> {
        self(set)
    }
}

/// `Vec<T>` of all values, in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectValues;

impl<T: Clone> Aggregate<T, Vec<T>> for CollectValues {
    fn aggregate(&self, set: &StageSet<T>) -> Result<Vec<T>, EmitError> {
        Ok(set.entries().iter().map(|e| e.value.clone()).collect())
    }
}

/// Concatenation of per-item vectors, in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenValues;

impl<U: Clone> Aggregate<Vec<U>, Vec<U>> for FlattenValues {
    fn aggregate(&self, set: &StageSet<Vec<U>>) -> Result<Vec<U>, EmitError> {
        Ok(set
            .entries()
            .iter()
            .flat_map(|e| e.value.iter().cloned())
            .collect())
    }
}

/// Last aggregate together with the membership and values it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateMemo<T, A> {
    members: Vec<(String, T)>,
    value: A,
}

impl<T: Clone + PartialEq, A> AggregateMemo<T, A> {
    pub fn new(set: &StageSet<T>, value: A) -> Self {
        Self {
            members: members_of(set),
            value,
        }
    }

    /// The memoized aggregate, if `set` has the same identities, order and
    /// values. Signatures are ignored: an edit that transforms to the same
    /// value does not force a re-merge.
    pub fn reuse(&self, set: &StageSet<T>) -> Option<&A> {
        let same = self.members.len() == set.len()
            && self
                .members
                .iter()
                .zip(set.entries())
                .all(|((id, v), e)| id == e.fingerprint.identity() && *v == e.value);
        same.then_some(&self.value)
    }

    pub fn value(&self) -> &A {
        &self.value
    }
}

fn members_of<T: Clone>(set: &StageSet<T>) -> Vec<(String, T)> {
    set.entries()
        .iter()
        .map(|e| (e.fingerprint.identity().to_string(), e.value.clone()))
        .collect()
}
