//! Output formatting for verification results.
//!
//! Supports two report formats plus a terminal status line:
//! - Markdown: per-artifact sections followed by a summary table
//! - JSON: structured output for programmatic consumption
//! - Status: one colored PASS/FAIL line on stderr

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::recommend::Recommendation;
use crate::run::{AggregateReport, ArtifactScore, RunOutcome};
use crate::score::{Mode, Tier};

/// Pass/fail evaluation of a run against the minimum score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub average: f64,
    pub min_score: u32,
    pub below_floor: bool,
    pub has_critical: bool,
}

impl Verdict {
    /// An empty run has no average to fall below.
    pub fn evaluate(aggregate: &AggregateReport, min_score: u32) -> Self {
        let average = aggregate.average_score();
        Self {
            average,
            min_score,
            below_floor: aggregate.artifact_count > 0 && average < f64::from(min_score),
            has_critical: aggregate.has_critical_findings(),
        }
    }

    pub fn passed(&self) -> bool {
        !self.below_floor && !self.has_critical
    }

    pub fn as_str(&self) -> &'static str {
        if self.passed() {
            "PASS"
        } else {
            "FAIL"
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport {
    pub timestamp: String,
    pub target: String,
    pub mode: String,
    pub overall_result: String,
    /// Average composite score across artifacts
    pub score: f64,
    pub min_score: u32,
    pub partial: bool,
    pub tier_counts: BTreeMap<String, usize>,
    pub issues: Vec<JsonIssue>,
    pub artifacts: Vec<JsonArtifact>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonIssue {
    pub file: String,
    pub analyzer: String,
    pub severity: String,
    pub description: String,
    pub recommendation: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonArtifact {
    pub file: String,
    pub score: u32,
    pub tier: String,
    pub breakdown: Vec<JsonBreakdown>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonBreakdown {
    pub analyzer: String,
    pub score: u32,
    pub max_score: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub gate_failed: bool,
}

fn issues_for(score: &ArtifactScore) -> impl Iterator<Item = JsonIssue> + '_ {
    score.findings().map(move |(analyzer, f)| JsonIssue {
        file: f.location.clone().unwrap_or_else(|| score.file.clone()),
        analyzer: analyzer.to_string(),
        severity: f.severity.to_string(),
        description: f.message.clone(),
        recommendation: f.recommendation.clone(),
    })
}

/// Build the JSON report structure.
pub fn json_report(outcome: &RunOutcome, min_score: u32, timestamp: &str) -> JsonReport {
    let verdict = Verdict::evaluate(&outcome.aggregate, min_score);
    let tier_counts = Tier::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), outcome.aggregate.tier_count(*t)))
        .collect();

    let artifacts = outcome
        .scores
        .iter()
        .map(|s| JsonArtifact {
            file: s.file.clone(),
            score: s.composite.total,
            tier: s.composite.tier.to_string(),
            breakdown: s
                .results
                .iter()
                .map(|r| JsonBreakdown {
                    analyzer: r.analyzer.clone(),
                    score: r.score,
                    max_score: r.max_score,
                    gate_failed: r.gate_failed,
                })
                .collect(),
            recommendations: s.recommendations.clone(),
        })
        .collect();

    JsonReport {
        timestamp: timestamp.to_string(),
        target: outcome.root.display().to_string(),
        mode: outcome.mode.to_string(),
        overall_result: verdict.as_str().to_string(),
        score: round2(verdict.average),
        min_score,
        partial: outcome.aggregate.partial,
        tier_counts,
        issues: outcome.scores.iter().flat_map(issues_for).collect(),
        artifacts,
    }
}

/// Render results as pretty-printed JSON.
pub fn render_json(outcome: &RunOutcome, min_score: u32, timestamp: &str) -> anyhow::Result<String> {
    let report = json_report(outcome, min_score, timestamp);
    Ok(serde_json::to_string_pretty(&report)?)
}

// =============================================================================
// Markdown Format
// =============================================================================

/// Render results as a Markdown document.
pub fn render_markdown(outcome: &RunOutcome, min_score: u32, timestamp: &str) -> String {
    let mut out = String::new();
    let verdict = Verdict::evaluate(&outcome.aggregate, min_score);

    let _ = writeln!(out, "# Verification Report\n");
    let _ = writeln!(out, "- **Target:** `{}`", outcome.root.display());
    let _ = writeln!(out, "- **Mode:** {}", outcome.mode);
    let _ = writeln!(out, "- **Generated:** {}", timestamp);
    if outcome.aggregate.partial {
        let _ = writeln!(out, "- **Partial:** run was cancelled before every artifact was scored");
    }
    out.push('\n');

    for score in &outcome.scores {
        render_artifact(&mut out, outcome.mode, score);
    }

    render_summary(&mut out, &outcome.aggregate, &verdict);
    out
}

fn render_artifact(out: &mut String, mode: Mode, score: &ArtifactScore) {
    let _ = writeln!(out, "## {}\n", score.file);
    let _ = writeln!(
        out,
        "**Score:** {}/100 ({})\n",
        score.composite.total, score.composite.tier
    );

    match mode {
        Mode::Docs => {
            let _ = writeln!(out, "| Analyzer | Score | Max |");
            let _ = writeln!(out, "|----------|------:|----:|");
            for r in &score.results {
                let _ = writeln!(out, "| {} | {} | {} |", r.analyzer, r.score, r.max_score);
            }
        }
        Mode::Health => {
            let _ = writeln!(out, "| Analyzer | Deduction | Cap |");
            let _ = writeln!(out, "|----------|----------:|----:|");
            for r in &score.results {
                let gate = if r.gate_failed { " (gate failed)" } else { "" };
                let _ = writeln!(
                    out,
                    "| {}{} | -{} | {} |",
                    r.analyzer,
                    gate,
                    r.deduction(),
                    r.max_score
                );
            }
        }
    }
    out.push('\n');

    let findings: Vec<_> = score.findings().collect();
    if !findings.is_empty() {
        let _ = writeln!(out, "### Findings\n");
        for (analyzer, f) in findings {
            let location = f
                .location
                .as_deref()
                .map(|l| format!(" ({})", l))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "- **{}** `{}`: {}{}",
                f.severity, analyzer, f.message, location
            );
        }
        out.push('\n');
    }

    if !score.recommendations.is_empty() {
        let _ = writeln!(out, "### Recommendations\n");
        for (i, rec) in score.recommendations.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. [{}] {}",
                i + 1,
                rec.priority.as_str().to_uppercase(),
                rec.text
            );
        }
        out.push('\n');
    }
}

fn render_summary(out: &mut String, aggregate: &AggregateReport, verdict: &Verdict) {
    let _ = writeln!(out, "## Summary\n");
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|--------|------:|");
    let _ = writeln!(out, "| Artifacts | {} |", aggregate.artifact_count);
    let _ = writeln!(out, "| Average score | {:.1} |", verdict.average);
    let _ = writeln!(out, "| Minimum score | {} |", verdict.min_score);
    for tier in Tier::ALL {
        let _ = writeln!(out, "| {} | {} |", tier, aggregate.tier_count(tier));
    }
    let _ = writeln!(
        out,
        "| Critical findings | {} |",
        aggregate.critical_findings.len()
    );
    let _ = writeln!(out, "| Result | {} |", verdict.as_str());

    if !aggregate.critical_findings.is_empty() {
        let _ = writeln!(out, "\n### Critical Findings\n");
        for c in &aggregate.critical_findings {
            let _ = writeln!(out, "- `{}` ({}): {}", c.file, c.analyzer, c.message);
        }
    }
}

// =============================================================================
// Terminal status
// =============================================================================

/// Write the colored one-line status to stderr.
pub fn write_status(aggregate: &AggregateReport, verdict: &Verdict) {
    let status = if verdict.passed() {
        "✓ PASS".green()
    } else {
        "✗ FAIL".red()
    };
    let average = format!("{:.1}", verdict.average);
    let average = match Tier::from_score(verdict.average.round() as u32) {
        Tier::Excellent => average.green().bold(),
        Tier::Good => average.green(),
        Tier::Fair => average.yellow(),
        Tier::Poor => average.yellow().bold(),
        Tier::Critical => average.red(),
    };

    let mut line = format!(
        "  {}  Average: {}  Artifacts: {}",
        status, average, aggregate.artifact_count
    );
    if aggregate.has_critical_findings() {
        line.push_str(&format!(
            "  {}",
            format!("{} critical", aggregate.critical_findings.len()).red()
        ));
    }
    if aggregate.partial {
        line.push_str(&format!("  {}", "(partial)".dimmed()));
    }
    eprintln!("{}", line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{AnalyzerResult, Finding, Severity};
    use crate::run::ArtifactScore;
    use std::path::PathBuf;

    fn outcome() -> RunOutcome {
        let good = ArtifactScore::from_results(
            "docs/guide.md".to_string(),
            Mode::Docs,
            vec![
                AnalyzerResult::scored("structure", 25, 25, vec![]),
                AnalyzerResult::scored(
                    "links",
                    5,
                    15,
                    vec![Finding::new(Severity::Medium, "broken link to gone.md (line 3)", "Fix links")],
                ),
            ],
        );
        let bad = ArtifactScore::from_results(
            "docs/empty.md".to_string(),
            Mode::Docs,
            vec![AnalyzerResult::scored(
                "structure",
                0,
                25,
                vec![Finding::new(Severity::Critical, "unreadable", "Fix it")],
            )],
        );
        let mut aggregate = AggregateReport::new();
        aggregate.absorb(&good);
        aggregate.absorb(&bad);
        RunOutcome {
            mode: Mode::Docs,
            root: PathBuf::from("/work/project"),
            scores: vec![good, bad],
            aggregate,
        }
    }

    #[test]
    fn test_verdict() {
        let o = outcome();
        let v = Verdict::evaluate(&o.aggregate, 60);
        assert!(v.has_critical);
        assert!(v.below_floor);
        assert_eq!(v.as_str(), "FAIL");

        let empty = Verdict::evaluate(&AggregateReport::new(), 60);
        assert!(empty.passed());
    }

    #[test]
    fn test_json_shape() {
        let json = render_json(&outcome(), 60, "2024-06-01T00:00:00Z").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["timestamp"], "2024-06-01T00:00:00Z");
        assert_eq!(value["target"], "/work/project");
        assert_eq!(value["overallResult"], "FAIL");
        assert_eq!(value["mode"], "docs");
        assert_eq!(value["minScore"], 60);
        assert_eq!(value["partial"], false);
        assert_eq!(value["score"], 15.0);
        assert_eq!(value["tierCounts"]["Critical"], 2);
        assert_eq!(value["tierCounts"]["Excellent"], 0);

        let issues = value["issues"].as_array().unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0]["file"], "docs/guide.md");
        assert_eq!(issues[0]["analyzer"], "links");
        assert_eq!(issues[0]["severity"], "medium");
        assert_eq!(issues[0]["recommendation"], "Fix links");

        let artifacts = value["artifacts"].as_array().unwrap();
        assert_eq!(artifacts[0]["breakdown"][0]["maxScore"], 25);
        assert!(artifacts[0]["breakdown"][0].get("gateFailed").is_none());
    }

    #[test]
    fn test_markdown_sections() {
        let md = render_markdown(&outcome(), 60, "2024-06-01T00:00:00Z");
        assert!(md.starts_with("# Verification Report"));
        assert!(md.contains("## docs/guide.md"));
        assert!(md.contains("| structure | 25 | 25 |"));
        assert!(md.contains("**medium** `links`: broken link to gone.md (line 3)"));
        assert!(md.contains("### Recommendations"));
        assert!(md.contains("## Summary"));
        assert!(md.contains("| Artifacts | 2 |"));
        assert!(md.contains("| Average score | 15.0 |"));
        assert!(md.contains("| Result | FAIL |"));
        assert!(md.contains("### Critical Findings"));
    }
}
