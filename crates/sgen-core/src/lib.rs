//! sgen Core: incremental generation engine
//!
//! Inputs are classified and fingerprinted, diffed by value against the
//! previous run, transformed only when added or modified, merged in
//! enumeration order and emitted as named documents that are republished
//! only when their text changes.
//!
//! ```text
//! RawInput → classify → diff → transform → aggregate → emit → publish-if-changed
//!             (fingerprint)  (cache)        (memo)       (memo)    (ledger)
//! ```

pub mod aggregate;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod context;
pub mod diagnostic;
pub mod document;
pub mod error;
pub mod fingerprint;
pub mod input;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod stage;

pub use aggregate::{Aggregate, AggregateMemo, CollectValues, FlattenValues};
pub use cache::{detect_changes, CacheEntry, ChangeKind, ChangeSet, StageCache};
pub use classifier::{is_identifier, Classified, Classifier, DeclarationSuffix, FileExtension};
pub use config::{EmptyPolicy, EngineConfig};
pub use context::{CancellationToken, RunContext};
pub use diagnostic::{Diagnostic, Severity};
pub use document::{Emitter, GeneratedDocument, Publication, PublishLedger};
pub use error::{EmitError, SgenError, TransformError};
pub use fingerprint::{Fingerprint, Signature};
pub use input::{InputKind, RawInput};
pub use pipeline::{GenerationRule, Pipeline, RuleEvaluation};
pub use report::{RuleStats, RunReport};
pub use runner::Engine;
pub use stage::{Duplicate, StageEntry, StageSet, Transform};

/// Engine version
pub const SGEN_VERSION: &str = env!("CARGO_PKG_VERSION");
