//! Engine: runs the registered rules over one input set per run
//!
//! Rules are independent, so they may be evaluated on separate threads.
//! Each rule stages a snapshot; all snapshots are committed together at the
//! end of a run, and documents are offered to the publish ledger in rule
//! registration order so the report is deterministic.
use crate::config::EngineConfig;
use crate::context::RunContext;
use crate::diagnostic::{Diagnostic, Severity};
use crate::document::PublishLedger;
use crate::error::SgenError;
use crate::input::RawInput;
use crate::pipeline::{GenerationRule, RuleEvaluation};
use crate::report::{RuleStats, RunReport};
use chrono::Utc;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

pub struct Engine {
    rules: Vec<Box<dyn GenerationRule>>,
    ledger: PublishLedger,
    config: EngineConfig,
    runs: u64,
}

impl Engine {
    /// Build an engine over an explicit rule list. Rule names and output
    /// names must be unique.
    pub fn new(rules: Vec<Box<dyn GenerationRule>>, config: EngineConfig) -> Result<Self, SgenError> {
        let mut names = HashSet::new();
        let mut outputs = HashSet::new();
        for rule in &rules {
            if !names.insert(rule.name().to_string()) {
                return Err(SgenError::ConfigError(format!("duplicate rule name '{}'", rule.name())));
            }
            if !outputs.insert(rule.output_name().to_string()) {
                return Err(SgenError::ConfigError(format!(
                    "output '{}' is produced by more than one rule",
                    rule.output_name()
                )));
            }
        }

        Ok(Self {
            rules,
            ledger: PublishLedger::new(),
            config,
            runs: 0,
        })
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn ledger(&self) -> &PublishLedger {
        &self.ledger
    }

    /// Last published text for an output name.
    pub fn published(&self, name: &str) -> Option<&str> {
        self.ledger.get(name)
    }

    /// Forget a published document, e.g. after the host failed to write it.
    /// The next run publishes it again even if its text is unchanged.
    pub fn forget(&mut self, name: &str) -> bool {
        self.ledger.forget(name).is_some()
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Run every rule against the full current input set.
    ///
    /// On cancellation nothing is committed or published and
    /// `Err(Cancelled)` is returned.
    pub fn run(&mut self, inputs: &[RawInput], ctx: &RunContext) -> Result<RunReport, SgenError> {
        let started_at = Utc::now();
        let span = tracing::info_span!("run", run_id = %ctx.run_id, inputs = inputs.len());
        let _enter = span.enter();

        let results = self.evaluate_all(inputs, ctx);

        let cancelled = ctx.is_cancelled()
            || results
                .iter()
                .any(|r| matches!(r, Err(SgenError::Cancelled(_))));
        if cancelled {
            for rule in &mut self.rules {
                rule.discard();
            }
            tracing::info!("run cancelled; previous documents left in place");
            return Err(SgenError::Cancelled(ctx.run_id.clone()));
        }

        self.runs += 1;
        let mut report = RunReport {
            run_id: ctx.run_id.clone(),
            engine_version: crate::SGEN_VERSION.to_string(),
            sequence: self.runs,
            started_at,
            rules: Vec::with_capacity(self.rules.len()),
            publications: Vec::new(),
            diagnostics: Vec::new(),
        };

        for (rule, result) in self.rules.iter_mut().zip(results) {
            match result {
                Ok(RuleEvaluation {
                    document,
                    diagnostics,
                    stats,
                }) => {
                    rule.commit();
                    report.rules.push(stats);
                    report.diagnostics.extend(diagnostics);
                    if let Some(doc) = document {
                        report.publications.push(self.ledger.offer(doc));
                    }
                }
                Err(e) => {
                    // the rule keeps its previous snapshot and publication
                    rule.discard();
                    tracing::error!(rule = rule.name(), error = %e, "rule failed");
                    report.rules.push(RuleStats {
                        rule: rule.name().to_string(),
                        output: rule.output_name().to_string(),
                        ..RuleStats::default()
                    });
                    report.diagnostics.push(Diagnostic {
                        severity: Severity::Error,
                        code: "RULE/FAILED".to_string(),
                        rule: rule.name().to_string(),
                        location: rule.output_name().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let changed = report.changed_documents().len();
        tracing::info!(
            sequence = report.sequence,
            rules = report.rules.len(),
            changed,
            unchanged = report.publications.len() - changed,
            diagnostics = report.diagnostics.len(),
            transforms = report.total_transform_invocations(),
            "run complete"
        );
        Ok(report)
    }

    fn evaluate_all(
        &mut self,
        inputs: &[RawInput],
        ctx: &RunContext,
    ) -> Vec<Result<RuleEvaluation, SgenError>> {
        if !self.config.parallel || self.rules.len() < 2 {
            return self
                .rules
                .iter_mut()
                .map(|rule| {
                    let name = rule.name().to_string();
                    panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(inputs, ctx)))
                        .unwrap_or_else(|_| Err(panicked(&name)))
                })
                .collect();
        }

        std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .rules
                .iter_mut()
                .map(|rule| {
                    let name = rule.name().to_string();
                    (name, scope.spawn(move || rule.evaluate(inputs, ctx)))
                })
                .collect();

            handles
                .into_iter()
                .map(|(name, handle)| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(panicked(&name)))
                })
                .collect()
        })
    }
}

fn panicked(rule: &str) -> SgenError {
    SgenError::RuleError(format!("{} panicked", rule))
}
