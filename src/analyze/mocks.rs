//! Mock and placeholder density in production code.
//!
//! Markers are counted globally and per subsystem, where a subsystem is a
//! file's parent directory relative to the root. A subsystem over its cap is
//! flagged even when the global count is within the ceiling.

use lazy_static::lazy_static;
use std::collections::BTreeMap;
use std::path::Path;

use super::rules::{self, Rule};
use super::source::production_sources;
use super::{AnalysisContext, Analyzer, AnalyzerResult, Finding, Severity};

pub const MOCK_DENSITY_MAX: u32 = 15;

const GLOBAL_DEDUCTION_CAP: u32 = 5;
const SUBSYSTEM_DEDUCTION: u32 = 3;
const SUBSYSTEM_DEDUCTION_CAP: u32 = 10;

lazy_static! {
    static ref MOCK_RULES: Vec<Rule> = vec![
        Rule::new(r"\b[Mm]ock(?:[A-Z_]\w*)?\b", 1, "mock object"),
        Rule::new(r"\b[Ff]ake(?:[A-Z_]\w*)?\b", 1, "fake object"),
        Rule::new(r"\b[Dd]ummy(?:[A-Z_]\w*)?\b", 1, "dummy value"),
        Rule::new(r"(?i)\bplaceholder\b", 1, "placeholder"),
        Rule::new(r"(?i)\blorem ipsum\b", 1, "lorem ipsum text"),
        Rule::new(r"\bexample\.(?:com|org|net)\b", 1, "example domain"),
    ];
}

/// Subsystem key for a file: its parent directory relative to the root.
pub fn subsystem_of(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    match rel.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_string_lossy().replace('\\', "/"),
        _ => ".".to_string(),
    }
}

/// Mock marker counts per subsystem, skipping test code.
pub fn count_by_subsystem(ctx: &AnalysisContext<'_>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for (artifact, text) in production_sources(&ctx.run.sources, &ctx.run.root) {
        let hits = rules::scan(&MOCK_RULES, text.lines(), false).len();
        if hits > 0 {
            *counts
                .entry(subsystem_of(&ctx.run.root, &artifact.path))
                .or_insert(0) += hits;
        }
    }
    counts
}

pub struct MockDensityAnalyzer;

impl Analyzer for MockDensityAnalyzer {
    fn name(&self) -> &'static str {
        "mock_density"
    }

    fn max_score(&self) -> u32 {
        MOCK_DENSITY_MAX
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> anyhow::Result<AnalyzerResult> {
        let settings = &ctx.run.settings;
        let counts = count_by_subsystem(ctx);
        let global: usize = counts.values().sum();
        let mut findings = Vec::new();

        let global_deduction = if global > settings.global_mock_ceiling {
            let excess = global - settings.global_mock_ceiling;
            findings.push(Finding::new(
                Severity::Medium,
                format!(
                    "{} mock/placeholder markers in production code (ceiling {})",
                    global, settings.global_mock_ceiling
                ),
                "Replace mocks and placeholder data with real implementations",
            ));
            (excess as u32).min(GLOBAL_DEDUCTION_CAP)
        } else {
            0
        };

        let mut subsystem_deduction = 0;
        for (subsystem, count) in &counts {
            if *count > settings.per_subsystem_mock_cap {
                findings.push(
                    Finding::new(
                        Severity::High,
                        format!(
                            "subsystem {} has {} mock/placeholder markers (cap {})",
                            subsystem, count, settings.per_subsystem_mock_cap
                        ),
                        "Replace mocks concentrated in one subsystem with real implementations",
                    )
                    .at(subsystem.clone()),
                );
                subsystem_deduction += SUBSYSTEM_DEDUCTION;
            }
        }
        let subsystem_deduction = subsystem_deduction.min(SUBSYSTEM_DEDUCTION_CAP);

        Ok(AnalyzerResult::deducted(
            self.name(),
            global_deduction + subsystem_deduction,
            MOCK_DENSITY_MAX,
            findings,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::testutil::{analyze_tree, source};

    #[test]
    fn test_subsystem_of() {
        let root = Path::new("/repo");
        assert_eq!(subsystem_of(root, Path::new("/repo/src/net/tcp.rs")), "src/net");
        assert_eq!(subsystem_of(root, Path::new("/repo/main.go")), ".");
    }

    #[test]
    fn test_subsystem_over_cap_flagged_under_global_ceiling() {
        let r = analyze_tree(
            &MockDensityAnalyzer,
            vec![
                source(
                    "src/payments/client.rs",
                    "let c = MockClient::new();\nlet d = mock_data();\nlet e = FakeGateway;\nlet f = \"https://example.com\";\n",
                ),
                source("src/core/lib.rs", "let x = mock_value;\n"),
            ],
        );
        assert_eq!(r.deduction(), 3);
        let high: Vec<_> = r
            .findings
            .iter()
            .filter(|f| f.severity == Severity::High)
            .collect();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].location.as_deref(), Some("src/payments"));
    }

    #[test]
    fn test_global_ceiling() {
        // 12 markers spread over 6 subsystems of 2 each
        let files: Vec<_> = (0..6)
            .map(|i| source(&format!("mod{}/a.rs", i), "let a = dummy;\nlet b = placeholder;\n"))
            .collect();
        let r = analyze_tree(&MockDensityAnalyzer, files);
        assert_eq!(r.deduction(), 2);
        assert_eq!(r.worst_severity(), Some(Severity::Medium));
    }

    #[test]
    fn test_deduction_caps() {
        let heavy = "let m = mock;\n".repeat(20);
        let files: Vec<_> = (0..5)
            .map(|i| source(&format!("s{}/x.rs", i), &heavy))
            .collect();
        let r = analyze_tree(&MockDensityAnalyzer, files);
        // global capped at 5, subsystems 5 x 3 capped at 10
        assert_eq!(r.deduction(), 15);
    }

    #[test]
    fn test_tests_excluded() {
        let r = analyze_tree(
            &MockDensityAnalyzer,
            vec![
                source("pkg/handler_test.go", &"m := mockStore\n".repeat(10)),
                source(
                    "src/lib.rs",
                    "pub fn real() {}\n#[cfg(test)]\nmod tests {\n    struct MockA; struct MockB; struct MockC; struct MockD;\n}\n",
                ),
            ],
        );
        assert_eq!(r.deduction(), 0);
        assert!(r.findings.is_empty());
    }

    #[test]
    fn test_identifiers_containing_mock_are_not_markers() {
        let r = analyze_tree(
            &MockDensityAnalyzer,
            vec![source("src/a.rs", "let hammock = 1; let mockingbird = 2; let unfaked = 3;\n")],
        );
        assert_eq!(r.deduction(), 0);
    }
}
