//! Engine-level tests: soundness, minimality, idempotence, isolation and
//! cancellation across repeated runs.

use sgen_core::{
    CollectValues, DeclarationSuffix, EmitError, EmptyPolicy, Engine, EngineConfig,
    FileExtension, FlattenValues, GenerationRule, Pipeline, Publication, RawInput, RunContext,
    SgenError, TransformError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn names_rule() -> Box<dyn GenerationRule> {
    Box::new(Pipeline::new(
        "names",
        "names.g.txt",
        DeclarationSuffix::new("Command"),
        |raw: &RawInput| -> Result<String, TransformError> { Ok(raw.name().to_string()) },
        CollectValues,
        |names: &Vec<String>| -> Result<String, EmitError> { Ok(format!("[{}]", names.join(","))) },
    ))
}

fn lines_rule(calls: Arc<AtomicUsize>) -> Box<dyn GenerationRule> {
    Box::new(Pipeline::new(
        "lines",
        "lines.g.txt",
        FileExtension::new(".txt"),
        move |raw: &RawInput| -> Result<Vec<String>, TransformError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(raw.content()?.lines().map(str::to_string).collect())
        },
        FlattenValues,
        |lines: &Vec<String>| -> Result<String, EmitError> { Ok(lines.join(",")) },
    ))
}

fn engine(calls: Arc<AtomicUsize>, parallel: bool) -> Engine {
    Engine::new(
        vec![names_rule(), lines_rule(calls)],
        EngineConfig { parallel },
    )
    .unwrap()
}

fn inputs(b_txt: &str) -> Vec<RawInput> {
    vec![
        RawInput::declaration("Foo", "struct Foo;"),
        RawInput::declaration("BarCommand", "struct BarCommand;"),
        RawInput::additional_file("a.txt", "X\nY"),
        RawInput::additional_file("b.txt", b_txt),
        RawInput::declaration("BazCommand", "struct BazCommand;"),
    ]
}

#[test]
fn test_incremental_matches_full_recompute() {
    let mut incremental = engine(Arc::new(AtomicUsize::new(0)), true);
    incremental.run(&inputs("Z"), &RunContext::new()).unwrap();
    incremental.run(&inputs("W"), &RunContext::new()).unwrap();

    let mut full = engine(Arc::new(AtomicUsize::new(0)), true);
    full.run(&inputs("W"), &RunContext::new()).unwrap();

    for name in ["names.g.txt", "lines.g.txt"] {
        assert_eq!(incremental.published(name), full.published(name), "{}", name);
    }
    assert_eq!(incremental.published("lines.g.txt"), Some("X,Y,W"));
}

#[test]
fn test_only_changed_file_is_transformed() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut engine = engine(calls.clone(), false);

    engine.run(&inputs("Z"), &RunContext::new()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let report = engine.run(&inputs("W"), &RunContext::new()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let lines = report.stats("lines").unwrap();
    assert_eq!(lines.modified, 1);
    assert_eq!(lines.unchanged, 1);
    let names = report.stats("names").unwrap();
    assert_eq!(names.transform_invocations, 0);
    assert!(names.aggregate_reused);
}

#[test]
fn test_second_identical_run_publishes_nothing() {
    let mut engine = engine(Arc::new(AtomicUsize::new(0)), true);

    let first = engine.run(&inputs("Z"), &RunContext::new()).unwrap();
    assert_eq!(first.changed_documents().len(), 2);
    assert!(first
        .publications
        .iter()
        .all(|p| matches!(p, Publication::Published(_))));

    let second = engine.run(&inputs("Z"), &RunContext::new()).unwrap();
    assert!(second.changed_documents().is_empty());
    assert_eq!(second.publications.len(), 2);
    assert_eq!(second.total_transform_invocations(), 0);
}

#[test]
fn test_content_edit_republishes() {
    let mut engine = engine(Arc::new(AtomicUsize::new(0)), true);
    engine.run(&inputs("Z"), &RunContext::new()).unwrap();

    let report = engine.run(&inputs("W"), &RunContext::new()).unwrap();
    assert!(matches!(
        report.publication("lines.g.txt"),
        Some(Publication::Republished(doc)) if doc.text == "X,Y,W"
    ));
    assert!(matches!(
        report.publication("names.g.txt"),
        Some(Publication::Unchanged { .. })
    ));
}

fn panicking_rule() -> Box<dyn GenerationRule> {
    Box::new(Pipeline::new(
        "panicking",
        "panicking.g.txt",
        FileExtension::new(".txt"),
        |_: &RawInput| -> Result<String, TransformError> { panic!("transform bug") },
        CollectValues,
        |v: &Vec<String>| -> Result<String, EmitError> { Ok(v.join(",")) },
    ))
}

#[test]
fn test_parallel_and_sequential_agree() {
    let mut parallel = engine(Arc::new(AtomicUsize::new(0)), true);
    let mut sequential = engine(Arc::new(AtomicUsize::new(0)), false);
    let a = parallel.run(&inputs("Z"), &RunContext::new()).unwrap();
    let b = sequential.run(&inputs("Z"), &RunContext::new()).unwrap();
    assert_eq!(a.publications, b.publications);
    assert_eq!(parallel.published("names.g.txt"), Some("[BarCommand,BazCommand]"));

    for parallel in [true, false] {
        let mut engine =
            Engine::new(vec![panicking_rule(), names_rule()], EngineConfig { parallel }).unwrap();
        let report = engine.run(&inputs("Z"), &RunContext::new()).unwrap();
        assert_eq!(report.diagnostics.len(), 1, "parallel={}", parallel);
        assert_eq!(report.diagnostics[0].code, "RULE/FAILED");
        assert_eq!(report.diagnostics[0].rule, "panicking");
        assert_eq!(engine.published("names.g.txt"), Some("[BarCommand,BazCommand]"));
        assert_eq!(engine.published("panicking.g.txt"), None);
    }
}

#[test]
fn test_single_rule_panic_is_reported() {
    // a lone rule always takes the sequential path
    let mut engine = Engine::new(vec![panicking_rule()], EngineConfig::default()).unwrap();
    let report = engine.run(&inputs("Z"), &RunContext::new()).unwrap();
    assert!(report.has_errors());
    assert!(report.diagnostics[0].message.contains("panicking panicked"));
    assert!(engine.ledger().is_empty());

    // the failed run did not advance the cache; the rule is evaluated again
    let again = engine.run(&inputs("Z"), &RunContext::new()).unwrap();
    assert!(again.has_errors());
}

#[test]
fn test_report_carries_engine_version() {
    let mut engine = engine(Arc::new(AtomicUsize::new(0)), true);
    let report = engine.run(&inputs("Z"), &RunContext::new()).unwrap();
    assert_eq!(report.engine_version, sgen_core::SGEN_VERSION);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["engine_version"], sgen_core::SGEN_VERSION);
    assert_eq!(json["publications"][0]["action"], "published");
}

#[test]
fn test_cancelled_run_leaves_everything_in_place() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut engine = engine(calls.clone(), true);
    engine.run(&inputs("Z"), &RunContext::new()).unwrap();

    let ctx = RunContext::new();
    ctx.cancellation.cancel();
    let result = engine.run(&inputs("W"), &ctx);
    assert!(matches!(result, Err(SgenError::Cancelled(_))));
    assert_eq!(engine.published("lines.g.txt"), Some("X,Y,Z"));
    assert_eq!(engine.runs(), 1);

    // the cache was not advanced either: b.txt is still seen as modified
    let report = engine.run(&inputs("W"), &RunContext::new()).unwrap();
    assert_eq!(report.stats("lines").unwrap().modified, 1);
}

#[test]
fn test_emit_failure_is_scoped_to_its_output() {
    let failing: Box<dyn GenerationRule> = Box::new(Pipeline::new(
        "failing",
        "failing.g.txt",
        FileExtension::new(".txt"),
        |raw: &RawInput| -> Result<String, TransformError> { Ok(raw.name().to_string()) },
        CollectValues,
        |_: &Vec<String>| -> Result<String, EmitError> {
            Err(EmitError::Template {
                name: "failing".to_string(),
                reason: "missing field".to_string(),
            })
        },
    ));
    let mut engine = Engine::new(vec![failing, names_rule()], EngineConfig::default()).unwrap();

    let report = engine.run(&inputs("Z"), &RunContext::new()).unwrap();
    assert!(report.has_errors());
    assert_eq!(report.diagnostics[0].location, "failing.g.txt");
    assert_eq!(engine.published("names.g.txt"), Some("[BarCommand,BazCommand]"));
    assert_eq!(engine.published("failing.g.txt"), None);
}

#[test]
fn test_empty_input_set() {
    let skip: Box<dyn GenerationRule> = Box::new(
        Pipeline::new(
            "skip",
            "skip.g.txt",
            FileExtension::new(".sql"),
            |raw: &RawInput| -> Result<String, TransformError> { Ok(raw.name().to_string()) },
            CollectValues,
            |v: &Vec<String>| -> Result<String, EmitError> { Ok(v.join(",")) },
        )
        .with_empty_policy(EmptyPolicy::Skip),
    );
    let mut engine = Engine::new(vec![skip, names_rule()], EngineConfig::default()).unwrap();

    let report = engine.run(&[], &RunContext::new()).unwrap();
    assert!(report.publication("skip.g.txt").is_none());
    assert_eq!(engine.published("names.g.txt"), Some("[]"));
    assert!(report.stats("skip").unwrap().skipped_empty);
}

#[test]
fn test_documents_are_never_removed_implicitly() {
    let mut engine = engine(Arc::new(AtomicUsize::new(0)), true);
    engine.run(&inputs("Z"), &RunContext::new()).unwrap();

    // every input disappears; the lines rule emits an empty document, which
    // replaces the text but the name stays published
    engine.run(&[], &RunContext::new()).unwrap();
    assert_eq!(engine.published("lines.g.txt"), Some(""));
    assert_eq!(engine.ledger().len(), 2);
}

#[test]
fn test_duplicate_rule_names_are_rejected() {
    let result = Engine::new(vec![names_rule(), names_rule()], EngineConfig::default());
    assert!(matches!(result, Err(SgenError::ConfigError(_))));
}
