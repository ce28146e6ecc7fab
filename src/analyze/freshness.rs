//! Document freshness.
//!
//! The date comes from a `Last updated: YYYY-MM-DD` marker in the content,
//! falling back to the file's modification time.

use chrono::{DateTime, Local, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

use super::{AnalysisContext, Analyzer, AnalyzerResult, Finding, Severity};

pub const FRESHNESS_MAX: u32 = 10;

mod points {
    pub const FRESH: u32 = 10;
    pub const AGING: u32 = 5;
    pub const UNDATED: u32 = 5;
}

lazy_static! {
    static ref UPDATED_MARKER: Regex =
        Regex::new(r"(?i)last[\s_-]*updated\W{0,4}\s*(\d{4}-\d{2}-\d{2})").unwrap();
}

/// Where a document's date was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Marker,
    Modified,
}

/// Date from an explicit marker in the content.
pub fn marker_date(content: &str) -> Option<NaiveDate> {
    UPDATED_MARKER
        .captures_iter(content)
        .filter_map(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok())
        .max()
}

fn modified_date(path: &Path) -> Option<NaiveDate> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified).date_naive())
}

/// Best known date for a document.
pub fn document_date(path: &Path, content: &str) -> Option<(NaiveDate, DateSource)> {
    marker_date(content)
        .map(|d| (d, DateSource::Marker))
        .or_else(|| modified_date(path).map(|d| (d, DateSource::Modified)))
}

pub struct FreshnessAnalyzer;

impl Analyzer for FreshnessAnalyzer {
    fn name(&self) -> &'static str {
        "freshness"
    }

    fn max_score(&self) -> u32 {
        FRESHNESS_MAX
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> anyhow::Result<AnalyzerResult> {
        let Some((date, source)) = document_date(&ctx.artifact.path, &ctx.artifact.content) else {
            return Ok(AnalyzerResult::scored(
                self.name(),
                points::UNDATED,
                FRESHNESS_MAX,
                vec![Finding::new(
                    Severity::Info,
                    "document has no date",
                    "Add a `Last updated: YYYY-MM-DD` line",
                )],
            ));
        };

        let stale_days = i64::from(ctx.run.settings.stale_days);
        let age = (ctx.run.today - date).num_days();
        let origin = match source {
            DateSource::Marker => "last updated",
            DateSource::Modified => "last modified",
        };

        let result = if age <= stale_days {
            AnalyzerResult::scored(self.name(), points::FRESH, FRESHNESS_MAX, vec![])
        } else if age <= stale_days * 2 {
            AnalyzerResult::scored(
                self.name(),
                points::AGING,
                FRESHNESS_MAX,
                vec![Finding::new(
                    Severity::Low,
                    format!("{} {} ({} days ago)", origin, date, age),
                    "Review the document and refresh its `Last updated` date",
                )],
            )
        } else {
            AnalyzerResult::scored(
                self.name(),
                0,
                FRESHNESS_MAX,
                vec![Finding::new(
                    Severity::Medium,
                    format!("stale: {} {} ({} days ago)", origin, date, age),
                    "Update the stale document to match the current code",
                )],
            )
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::testutil::{docs_artifact, docs_run};

    // docs_run() is pinned to 2024-06-01 with the default 90 day window
    fn score(content: &str) -> AnalyzerResult {
        let run = docs_run();
        let artifact = docs_artifact("README.md", content);
        FreshnessAnalyzer
            .analyze(&AnalysisContext::new(&artifact, &run))
            .unwrap()
    }

    #[test]
    fn test_marker_date() {
        assert_eq!(
            marker_date("Last updated: 2024-05-01"),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert_eq!(
            marker_date("*Last Updated:* 2023-01-02"),
            NaiveDate::from_ymd_opt(2023, 1, 2)
        );
        assert_eq!(marker_date("Last updated: 2024-13-45"), None);
        assert_eq!(marker_date("no date"), None);
    }

    #[test]
    fn test_fresh() {
        let r = score("Last updated: 2024-05-01\n");
        assert_eq!(r.score, 10);
        assert!(r.findings.is_empty());
    }

    #[test]
    fn test_aging() {
        let r = score("Last updated: 2024-01-01\n");
        assert_eq!(r.score, 5);
        assert_eq!(r.worst_severity(), Some(Severity::Low));
    }

    #[test]
    fn test_stale() {
        let r = score("Last updated: 2022-01-01\n");
        assert_eq!(r.score, 0);
        assert_eq!(r.worst_severity(), Some(Severity::Medium));
    }

    #[test]
    fn test_undated_without_file() {
        let r = score("no marker, and the path does not exist\n");
        assert_eq!(r.score, 5);
        assert_eq!(r.worst_severity(), Some(Severity::Info));
    }

    #[test]
    fn test_mtime_fallback() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("doc.md");
        std::fs::write(&path, "body").unwrap();
        let (_, source) = document_date(&path, "body").unwrap();
        assert_eq!(source, DateSource::Modified);
    }
}
