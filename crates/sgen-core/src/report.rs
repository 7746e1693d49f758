//! Run Report: what each rule did and what got published
use crate::diagnostic::Diagnostic;
use crate::document::{GeneratedDocument, Publication};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-rule record of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleStats {
    pub rule: String,
    pub output: String,
    /// Digest of the classified fingerprints, in order
    pub in_hash: String,
    /// Digest of the emitted text, when a document was produced
    pub out_hash: Option<String>,
    pub latency_ms: u64,
    pub matched: usize,
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub transform_invocations: usize,
    pub failed: usize,
    pub aggregate_reused: bool,
    pub emit_invoked: bool,
    /// Nothing matched and the rule is configured to skip empty output
    pub skipped_empty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    /// `SGEN_VERSION` of the engine that produced the report
    pub engine_version: String,
    /// 1-based run counter of the engine
    pub sequence: u64,
    pub started_at: DateTime<Utc>,
    pub rules: Vec<RuleStats>,
    pub publications: Vec<Publication>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn stats(&self, rule: &str) -> Option<&RuleStats> {
        self.rules.iter().find(|s| s.rule == rule)
    }

    /// Documents published or republished by this run.
    pub fn changed_documents(&self) -> Vec<&GeneratedDocument> {
        self.publications.iter().filter_map(Publication::document).collect()
    }

    pub fn publication(&self, name: &str) -> Option<&Publication> {
        self.publications.iter().find(|p| p.name() == name)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn total_transform_invocations(&self) -> usize {
        self.rules.iter().map(|s| s.transform_invocations).sum()
    }
}
