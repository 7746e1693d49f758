//! Pipeline: classify -> diff -> transform -> aggregate -> emit, for one rule
//!
//! A [`Pipeline`] owns the snapshot of its previous run. Evaluation only
//! reads that snapshot and stages a new one; the engine commits the staged
//! snapshot once the whole run has finished, or discards it on
//! cancellation, so an aborted run leaves every cache untouched.
use crate::aggregate::{Aggregate, AggregateMemo};
use crate::cache::{detect_changes, CacheEntry, ChangeKind, StageCache};
use crate::classifier::Classifier;
use crate::config::EmptyPolicy;
use crate::context::RunContext;
use crate::diagnostic::Diagnostic;
use crate::document::{Emitter, GeneratedDocument};
use crate::error::SgenError;
use crate::fingerprint::{digest, Fingerprint, Signature};
use crate::input::RawInput;
use crate::report::RuleStats;
use crate::stage::{first_wins, StageEntry, StageSet, Transform};
use std::time::Instant;

/// Result of evaluating one rule in one run.
#[derive(Debug, Clone)]
pub struct RuleEvaluation {
    pub document: Option<GeneratedDocument>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: RuleStats,
}

/// Object-safe face of a pipeline, so rules with different value types can
/// sit in one statically registered list.
pub trait GenerationRule: Send {
    fn name(&self) -> &str;

    /// Name of the document this rule produces.
    fn output_name(&self) -> &str;

    /// Evaluate against the full current input set and stage a new snapshot.
    fn evaluate(
        &mut self,
        inputs: &[RawInput],
        ctx: &RunContext,
    ) -> Result<RuleEvaluation, SgenError>;

    /// Make the staged snapshot current.
    fn commit(&mut self);

    /// Drop the staged snapshot.
    fn discard(&mut self);
}

struct Snapshot<T, A> {
    cache: StageCache<T>,
    aggregate: Option<AggregateMemo<T, A>>,
    /// Text emitted from `aggregate`; `None` if that emit failed
    text: Option<String>,
}

impl<T, A> Default for Snapshot<T, A> {
    fn default() -> Self {
        Self {
            cache: StageCache::default(),
            aggregate: None,
            text: None,
        }
    }
}

pub struct Pipeline<T, A> {
    name: String,
    output: String,
    empty_policy: EmptyPolicy,
    classifier: Box<dyn Classifier>,
    transform: Box<dyn Transform<T>>,
    aggregate: Box<dyn Aggregate<T, A>>,
    emitter: Box<dyn Emitter<A>>,
    snapshot: Snapshot<T, A>,
    pending: Option<Snapshot<T, A>>,
}

impl<T, A> Pipeline<T, A>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    pub fn new(
        name: impl Into<String>,
        output: impl Into<String>,
        classifier: impl Classifier + 'static,
        transform: impl Transform<T> + 'static,
        aggregate: impl Aggregate<T, A> + 'static,
        emitter: impl Emitter<A> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
            empty_policy: EmptyPolicy::default(),
            classifier: Box::new(classifier),
            transform: Box::new(transform),
            aggregate: Box::new(aggregate),
            emitter: Box::new(emitter),
            snapshot: Snapshot::default(),
            pending: None,
        }
    }

    pub fn with_empty_policy(mut self, policy: EmptyPolicy) -> Self {
        self.empty_policy = policy;
        self
    }

    /// Number of items in the committed cache.
    pub fn cached_items(&self) -> usize {
        self.snapshot.cache.len()
    }

    /// Classify, drop repeated identities (first wins), and diff.
    fn classify<'i>(
        &self,
        inputs: &'i [RawInput],
        ctx: &RunContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<(Fingerprint, &'i RawInput)>, SgenError> {
        let mut classified = Vec::new();
        for raw in inputs {
            ctx.check()?;
            if let Some(hit) = self.classifier.classify(raw) {
                classified.push((hit.fingerprint, raw));
            }
        }

        let (classified, duplicates) = first_wins(classified, |(fp, _)| fp);
        for dup in &duplicates {
            if dup.conflicting {
                let diag = Diagnostic::duplicate(&self.name, dup);
                tracing::warn!(rule = %self.name, identity = %dup.identity, "{}", diag.message);
                diagnostics.push(diag);
            } else {
                tracing::debug!(rule = %self.name, identity = %dup.identity, "ignoring repeated input");
            }
        }
        Ok(classified)
    }

    /// Aggregate and emit, reusing the previous document when the stage set
    /// is unchanged by value.
    fn produce(
        &self,
        set: &StageSet<T>,
        ctx: &RunContext,
        stats: &mut RuleStats,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(Option<AggregateMemo<T, A>>, Option<String>), SgenError> {
        if set.is_empty() && self.empty_policy == EmptyPolicy::Skip {
            stats.skipped_empty = true;
            return Ok((None, None));
        }

        let previous = self.snapshot.aggregate.as_ref();
        let reused = previous.and_then(|memo| memo.reuse(set));

        if let (Some(_), Some(text)) = (reused, &self.snapshot.text) {
            stats.aggregate_reused = true;
            return Ok((previous.cloned(), Some(text.clone())));
        }

        let value = match reused {
            Some(value) => {
                stats.aggregate_reused = true;
                value.clone()
            }
            None => match self.aggregate.aggregate(set) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(rule = %self.name, error = %e, "aggregate failed");
                    diagnostics.push(Diagnostic::emit(&self.name, &self.output, &e));
                    return Ok((None, None));
                }
            },
        };

        ctx.check()?;
        stats.emit_invoked = true;
        let text = match self.emitter.emit(&value) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(rule = %self.name, output = %self.output, error = %e, "emit failed");
                diagnostics.push(Diagnostic::emit(&self.name, &self.output, &e));
                None
            }
        };
        Ok((Some(AggregateMemo::new(set, value)), text))
    }
}

impl<T, A> GenerationRule for Pipeline<T, A>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn output_name(&self) -> &str {
        &self.output
    }

    fn evaluate(
        &mut self,
        inputs: &[RawInput],
        ctx: &RunContext,
    ) -> Result<RuleEvaluation, SgenError> {
        let start = Instant::now();
        self.pending = None;

        let mut diagnostics = Vec::new();
        let classified = self.classify(inputs, ctx, &mut diagnostics)?;
        let changes = detect_changes(
            self.snapshot.cache.fingerprints(),
            classified.iter().map(|(fp, _)| fp),
        );

        let mut stats = RuleStats {
            rule: self.name.clone(),
            output: self.output.clone(),
            in_hash: digest(classified.iter().map(|(fp, _)| fp)),
            matched: classified.len(),
            added: changes.count(ChangeKind::Added),
            modified: changes.count(ChangeKind::Modified),
            removed: changes.count(ChangeKind::Removed),
            unchanged: changes.count(ChangeKind::Unchanged),
            ..RuleStats::default()
        };

        let mut entries = Vec::with_capacity(classified.len());
        let mut cached = Vec::with_capacity(classified.len());
        for ((fp, raw), (_, kind)) in classified.iter().zip(changes.current()) {
            ctx.check()?;
            let outcome = match (kind, self.snapshot.cache.get(fp.identity())) {
                (ChangeKind::Unchanged, Some(previous)) => previous.outcome.clone(),
                _ => {
                    tracing::debug!(rule = %self.name, identity = fp.identity(), ?kind, "transforming");
                    stats.transform_invocations += 1;
                    self.transform.transform(raw)
                }
            };
            match &outcome {
                Ok(value) => entries.push(StageEntry {
                    fingerprint: fp.clone(),
                    value: value.clone(),
                }),
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!(rule = %self.name, identity = fp.identity(), error = %e, "excluding input");
                    diagnostics.push(Diagnostic::transform(&self.name, fp.identity(), e));
                }
            }
            cached.push(CacheEntry {
                fingerprint: fp.clone(),
                outcome,
            });
        }

        let set = StageSet::from_entries(entries);
        let (aggregate, text) = self.produce(&set, ctx, &mut stats, &mut diagnostics)?;
        ctx.check()?;

        stats.out_hash = text.as_deref().map(|t| Signature::of_str(t).to_string());
        stats.latency_ms = start.elapsed().as_millis() as u64;
        let document = text
            .as_ref()
            .map(|t| GeneratedDocument::new(self.output.clone(), t.clone()));

        self.pending = Some(Snapshot {
            cache: StageCache::from_entries(cached),
            aggregate,
            text,
        });

        Ok(RuleEvaluation {
            document,
            diagnostics,
            stats,
        })
    }

    fn commit(&mut self) {
        if let Some(next) = self.pending.take() {
            self.snapshot = next;
        }
    }

    fn discard(&mut self) {
        self.pending = None;
    }
}
