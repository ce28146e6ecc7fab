//! Prioritized, deduplicated action items.

use serde::{Deserialize, Serialize};

use crate::analyze::{AnalyzerResult, Finding, Severity};
use crate::score::{tiers, CompositeScore, Mode};

/// Recommendation urgency, lowest first so that `Ord` sorts by urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Minor,
    Moderate,
    Major,
    Critical,
}

impl Priority {
    /// Priority earned by a group whose worst finding has this severity.
    pub fn for_severity(severity: Severity) -> Option<Priority> {
        match severity {
            Severity::Critical => Some(Priority::Critical),
            Severity::High => Some(Priority::Major),
            Severity::Medium => Some(Priority::Moderate),
            Severity::Low => Some(Priority::Minor),
            Severity::Info => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Minor => "minor",
            Priority::Moderate => "moderate",
            Priority::Major => "major",
            Priority::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub text: String,
    /// Analyzer the recommendation came from; absent for the score banner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
}

/// Most severe finding; the earliest wins ties.
fn worst_finding(findings: &[Finding]) -> Option<&Finding> {
    findings
        .iter()
        .fold(None, |worst: Option<&Finding>, f| match worst {
            Some(w) if w.severity >= f.severity => Some(w),
            _ => Some(f),
        })
}

fn banner(mode: Mode, composite: &CompositeScore) -> Recommendation {
    let total = composite.total;
    let (priority, text) = if total < tiers::POOR_MIN {
        let action = match mode {
            Mode::Docs => "complete rewrite recommended",
            Mode::Health => "immediate overhaul required",
        };
        (Priority::Critical, format!("Score {}/100: {}", total, action))
    } else if total < tiers::FAIR_MIN {
        (
            Priority::Major,
            format!("Score {}/100: major revision needed", total),
        )
    } else if total < tiers::GOOD_MIN {
        (
            Priority::Moderate,
            format!("Score {}/100: targeted improvements recommended", total),
        )
    } else {
        (
            Priority::Minor,
            format!("Score {}/100: polish the remaining minor issues", total),
        )
    };
    Recommendation {
        priority,
        text,
        analyzer: None,
    }
}

/// Build the action list for one artifact.
///
/// One recommendation per analyzer with actionable findings, plus a score
/// banner, stably sorted by priority descending.
pub fn recommend(mode: Mode, results: &[AnalyzerResult], composite: &CompositeScore) -> Vec<Recommendation> {
    let mut recs: Vec<Recommendation> = Vec::new();

    for result in results {
        let Some(worst) = worst_finding(&result.findings) else {
            continue;
        };
        let Some(priority) = Priority::for_severity(worst.severity) else {
            continue;
        };

        let text = if result.findings.len() > 1 {
            format!("{} ({} findings)", worst.recommendation, result.findings.len())
        } else {
            worst.recommendation.clone()
        };

        // one entry per (analyzer, priority)
        let duplicate = recs.iter().any(|r| {
            r.priority == priority && r.analyzer.as_deref() == Some(result.analyzer.as_str())
        });
        if !duplicate {
            recs.push(Recommendation {
                priority,
                text,
                analyzer: Some(result.analyzer.clone()),
            });
        }
    }

    recs.push(banner(mode, composite));
    recs.sort_by(|a, b| b.priority.cmp(&a.priority));
    recs
}
