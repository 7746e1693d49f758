//! sgen Host: scans a project tree, runs the generation engine and writes
//! published documents to disk.
//!
//! The engine lives as long as the [`Host`], so its caches carry over from
//! one [`Host::run_once`] to the next (watch mode).

pub mod config;
pub mod scan;

pub use config::{ConfigError, HostConfig, RevisionMode, WatchConfig};

use sgen_core::{Diagnostic, Engine, Publication, RunContext, RunReport, SgenError, Severity};
use sgen_rules::RuleError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Rules: {0}")]
    Rules(#[from] RuleError),
    #[error(transparent)]
    Engine(#[from] SgenError),
    #[error("Failed to scan project: {0}")]
    Scan(std::io::Error),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl HostError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HostError::Engine(SgenError::Cancelled(_)))
    }
}

pub struct Host {
    config: HostConfig,
    engine: Engine,
}

impl Host {
    pub fn new(config: HostConfig) -> Result<Self, HostError> {
        let rules = sgen_rules::default_rules(&config.rules)?;
        let engine = Engine::new(rules, config.engine.clone())?;
        tracing::info!(rules = ?engine.rule_names(), "engine ready");
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Scan, run the engine and write every new or changed document.
    /// Unchanged documents are not touched on disk.
    ///
    /// A document that cannot be written becomes a `HOST/WRITE` error
    /// diagnostic and is forgotten by the engine, so the next run writes it
    /// again. The other documents of the run are still written.
    pub fn run_once(&mut self, ctx: &RunContext) -> Result<RunReport, HostError> {
        let inputs = scan::scan(&self.config).map_err(HostError::Scan)?;
        let mut report = self.engine.run(&inputs, ctx)?;

        let mut failed = Vec::new();
        for publication in &report.publications {
            match publication {
                Publication::Published(doc) | Publication::Republished(doc) => {
                    match self.write(&doc.name, &doc.text) {
                        Ok(path) => tracing::info!(path = %path.display(), "wrote {}", doc.name),
                        Err(e) => failed.push(write_failure(&report, &doc.name, &e)),
                    }
                }
                Publication::Unchanged { name } => {
                    tracing::debug!(document = %name, "unchanged");
                }
            }
        }
        for diagnostic in &failed {
            self.engine.forget(&diagnostic.location);
        }
        report.diagnostics.extend(failed);

        for diagnostic in &report.diagnostics {
            if diagnostic.is_error() {
                tracing::error!("{}", diagnostic);
            } else {
                tracing::warn!("{}", diagnostic);
            }
        }
        Ok(report)
    }

    fn write(&self, name: &str, text: &str) -> Result<PathBuf, HostError> {
        let path = self.config.out_dir.join(name);
        let io = |source| HostError::Write {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&self.config.out_dir).map_err(io)?;
        std::fs::write(&path, text).map_err(io)?;
        Ok(path)
    }
}

fn write_failure(report: &RunReport, name: &str, error: &HostError) -> Diagnostic {
    let rule = report
        .rules
        .iter()
        .find(|s| s.output == name)
        .map(|s| s.rule.clone())
        .unwrap_or_default();
    Diagnostic {
        severity: Severity::Error,
        code: "HOST/WRITE".to_string(),
        rule,
        location: name.to_string(),
        message: error.to_string(),
    }
}
