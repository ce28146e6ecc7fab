//! End-to-end health-mode runs with an injected build check.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use verigate::analyze::{FakeProbe, ProbeReport};
use verigate::{AnalyzerResult, ArtifactScore, Mode, RunCoordinator, RunOutcome, Settings, Severity, Tier};

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("should create parent");
    }
    fs::write(path, content).expect("should write file");
}

fn run_health(dir: &Path, probe: FakeProbe) -> RunOutcome {
    RunCoordinator::new(dir, Mode::Health, Settings::default())
        .probe(Box::new(probe))
        .run()
        .expect("run should succeed")
}

fn only_score(outcome: &RunOutcome) -> &ArtifactScore {
    assert_eq!(outcome.scores.len(), 1, "health mode scores the tree as one artifact");
    &outcome.scores[0]
}

fn result<'a>(score: &'a ArtifactScore, analyzer: &str) -> &'a AnalyzerResult {
    score
        .results
        .iter()
        .find(|r| r.analyzer == analyzer)
        .unwrap_or_else(|| panic!("no {} result", analyzer))
}

fn clean_tree(dir: &Path) {
    write(dir, "LICENSE", "Apache License\nVersion 2.0\n");
    write(
        dir,
        "src/lib.rs",
        "pub fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n",
    );
}

#[test]
fn test_clean_tree_is_excellent() {
    let dir = TempDir::new().unwrap();
    clean_tree(dir.path());

    let outcome = run_health(dir.path(), FakeProbe::passing());
    let score = only_score(&outcome);

    assert_eq!(score.composite.total, 100);
    assert_eq!(score.composite.tier, Tier::Excellent);
    assert!(!outcome.aggregate.has_critical_findings());
    for r in &score.results {
        assert_eq!(r.deduction(), 0, "{} should not deduct", r.analyzer);
    }
}

#[test]
fn test_compile_failure_forces_critical() {
    let dir = TempDir::new().unwrap();
    clean_tree(dir.path());

    let outcome = run_health(dir.path(), FakeProbe::failing());
    let score = only_score(&outcome);

    assert_eq!(score.composite.tier, Tier::Critical);
    let compilation = result(score, "compilation");
    assert!(compilation.gate_failed);
    assert_eq!(compilation.deduction(), 40);
    assert_eq!(compilation.findings[0].severity, Severity::Critical);

    assert!(outcome.aggregate.has_critical_findings());
    assert_eq!(outcome.aggregate.tier_count(Tier::Critical), 1);
}

#[test]
fn test_mock_subsystem_flagged_under_global_ceiling() {
    let dir = TempDir::new().unwrap();
    clean_tree(dir.path());
    write(
        dir.path(),
        "src/api/handlers.rs",
        "pub fn handle() {\n\
         \x20   let mock_client = connect();\n\
         \x20   let fake_store = open();\n\
         \x20   let dummy_user = load();\n\
         \x20   let MockResponse = build();\n\
         }\n",
    );

    let outcome = run_health(dir.path(), FakeProbe::passing());
    let score = only_score(&outcome);
    let mocks = result(score, "mock_density");

    let flagged: Vec<_> = mocks
        .findings
        .iter()
        .filter(|f| f.severity == Severity::High)
        .collect();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].location.as_deref(), Some("src/api"));
    assert_eq!(mocks.deduction(), 3);
    assert_eq!(score.composite.total, 97);
}

#[test]
fn test_stubs_and_markers_deduct() {
    let dir = TempDir::new().unwrap();
    clean_tree(dir.path());
    write(
        dir.path(),
        "src/engine.rs",
        "pub fn run() {\n    todo!()\n}\n// TODO: cache results\n",
    );

    let outcome = run_health(dir.path(), FakeProbe::passing());
    let score = only_score(&outcome);
    let completeness = result(score, "completeness");

    assert_eq!(completeness.deduction(), 3);
    assert!(completeness
        .findings
        .iter()
        .any(|f| f.severity == Severity::High && f.message.contains("src/engine.rs:2")));
    assert_eq!(score.composite.total, 97);
}

#[test]
fn test_test_files_not_counted() {
    let dir = TempDir::new().unwrap();
    clean_tree(dir.path());
    write(
        dir.path(),
        "tests/integration.rs",
        "fn t() { let mock_a = 1; let mock_b = 2; let mock_c = 3; let mock_d = 4; todo!() }\n",
    );

    let outcome = run_health(dir.path(), FakeProbe::passing());
    assert_eq!(only_score(&outcome).composite.total, 100);
}

#[test]
fn test_missing_license_and_build_warnings() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/lib.rs", "pub fn f() {}\n");

    let probe = FakeProbe::new(ProbeReport::passed("fake", 14));
    let outcome = run_health(dir.path(), probe);
    let score = only_score(&outcome);

    assert_eq!(result(score, "license").deduction(), 5);
    assert_eq!(result(score, "warnings").deduction(), 4);
    assert_eq!(score.composite.total, 91);
    assert_eq!(score.composite.tier, Tier::Good);
}
