//! Compiler warnings plus lint suppressions in source.

use lazy_static::lazy_static;

use super::rules::{self, Rule};
use super::source::production_sources;
use super::{AnalysisContext, Analyzer, AnalyzerResult, Finding, Severity};

pub const WARNINGS_MAX: u32 = 10;

lazy_static! {
    static ref SUPPRESSION_RULES: Vec<Rule> = vec![
        Rule::new(r"#\[allow\(", 1, "#[allow(...)]"),
        Rule::new(r"#!\[allow\(", 1, "#![allow(...)]"),
        Rule::new(r"@SuppressWarnings\b", 1, "@SuppressWarnings"),
        Rule::new(r"\beslint-disable", 1, "eslint-disable"),
        Rule::new(r"#\s*noqa\b", 1, "# noqa"),
        Rule::new(r"//\s*nolint\b", 1, "//nolint"),
    ];
}

pub struct WarningAnalyzer;

impl Analyzer for WarningAnalyzer {
    fn name(&self) -> &'static str {
        "warnings"
    }

    fn max_score(&self) -> u32 {
        WARNINGS_MAX
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> anyhow::Result<AnalyzerResult> {
        let compiler = ctx.run.probe.warnings;
        let suppressions: usize = production_sources(&ctx.run.sources, &ctx.run.root)
            .map(|(_, text)| rules::scan(&SUPPRESSION_RULES, text.lines(), true).len())
            .sum();
        let total = compiler + suppressions;
        let threshold = ctx.run.settings.warning_threshold;

        let mut findings = Vec::new();
        let deduction = if total > threshold {
            findings.push(Finding::new(
                Severity::Medium,
                format!(
                    "{} warnings ({} from the compiler, {} suppressed in source), threshold {}",
                    total, compiler, suppressions, threshold
                ),
                "Fix compiler warnings instead of suppressing them",
            ));
            ((total - threshold) as u32).min(WARNINGS_MAX)
        } else {
            if total > 0 {
                findings.push(Finding::new(
                    Severity::Info,
                    format!("{} warnings, within threshold {}", total, threshold),
                    "Keep the warning count low",
                ));
            }
            0
        };

        Ok(AnalyzerResult::deducted(self.name(), deduction, WARNINGS_MAX, findings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::probe::ProbeReport;
    use crate::analyze::testutil::{analyze_tree_with, source};

    #[test]
    fn test_suppressions_counted() {
        let body = "#[allow(dead_code)]\nfn a() {}\n#![allow(unused)]\n".repeat(6);
        let r = analyze_tree_with(
            &WarningAnalyzer,
            vec![
                source("src/a.rs", &body),
                source("web/app.ts", "// eslint-disable-next-line\nconst x = 1;\n"),
                source("py/m.py", "import os  # noqa: F401\n"),
            ],
            ProbeReport::passed("cargo check", 0),
        );
        // 12 + 1 + 1 = 14 over a threshold of 10
        assert_eq!(r.deduction(), 4);
        assert_eq!(r.worst_severity(), Some(Severity::Medium));
    }

    #[test]
    fn test_probe_warnings_added() {
        let r = analyze_tree_with(
            &WarningAnalyzer,
            vec![source("src/a.rs", "#[allow(dead_code)]\nfn a() {}\n")],
            ProbeReport::passed("cargo check", 25),
        );
        assert_eq!(r.deduction(), 10);
    }

    #[test]
    fn test_within_threshold() {
        let r = analyze_tree_with(
            &WarningAnalyzer,
            vec![source("src/a.rs", "#[allow(dead_code)]\nfn a() {}\n")],
            ProbeReport::passed("cargo check", 3),
        );
        assert_eq!(r.deduction(), 0);
        assert_eq!(r.worst_severity(), Some(Severity::Info));
    }
}
