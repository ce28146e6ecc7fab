//! Title and heading hierarchy.

use lazy_static::lazy_static;
use regex::Regex;

use super::markdown::MarkdownDoc;
use super::{AnalysisContext, Analyzer, AnalyzerResult, Finding, Severity};

pub const STRUCTURE_MAX: u32 = 25;

mod points {
    pub const SINGLE_TITLE: u32 = 15;
    pub const MULTIPLE_TITLES: u32 = 10;
    pub const MALFORMED_TITLE: u32 = 5;
    pub const FULL_HIERARCHY: u32 = 10;
    pub const TWO_SECTIONS: u32 = 7;
    pub const ONE_SECTION: u32 = 4;
}

lazy_static! {
    static ref TITLE: Regex = Regex::new(r"^# +\S").unwrap();
    /// `#Title` or a bare `#`; `#!` shebangs are not titles
    static ref MALFORMED_TITLE: Regex = Regex::new(r"^#(?:[^#\s!]|\s*$)").unwrap();
    static ref SECTION: Regex = Regex::new(r"^## +\S").unwrap();
    static ref SUBSECTION: Regex = Regex::new(r"^### +\S").unwrap();
}

#[derive(Debug, Default, PartialEq, Eq)]
struct HeadingCounts {
    titles: usize,
    malformed_titles: usize,
    sections: usize,
    subsections: usize,
}

fn count_headings(doc: &MarkdownDoc<'_>) -> HeadingCounts {
    let mut counts = HeadingCounts::default();
    for (_, line) in &doc.prose {
        let line = line.trim_end();
        if TITLE.is_match(line) {
            counts.titles += 1;
        } else if MALFORMED_TITLE.is_match(line) {
            counts.malformed_titles += 1;
        } else if SECTION.is_match(line) {
            counts.sections += 1;
        } else if SUBSECTION.is_match(line) {
            counts.subsections += 1;
        }
    }
    counts
}

pub struct StructureAnalyzer;

impl Analyzer for StructureAnalyzer {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn max_score(&self) -> u32 {
        STRUCTURE_MAX
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> anyhow::Result<AnalyzerResult> {
        let doc = MarkdownDoc::parse(&ctx.artifact.content);
        let counts = count_headings(&doc);
        let mut findings = Vec::new();

        let title = match (counts.titles, counts.malformed_titles) {
            (1, _) => points::SINGLE_TITLE,
            (n, _) if n > 1 => {
                findings.push(Finding::new(
                    Severity::Low,
                    format!("{} top-level titles found", n),
                    "Keep a single `# Title` and demote the others to `##` sections",
                ));
                points::MULTIPLE_TITLES
            }
            (_, m) if m > 0 => {
                findings.push(Finding::new(
                    Severity::Low,
                    "title is malformed",
                    "Write the title as `# Title` with a space after the hash",
                ));
                points::MALFORMED_TITLE
            }
            _ => {
                findings.push(Finding::new(
                    Severity::Medium,
                    "document has no title",
                    "Add a `# Title` line at the top of the document",
                ));
                0
            }
        };

        let hierarchy = if counts.sections >= 3 && counts.subsections >= 1 {
            points::FULL_HIERARCHY
        } else if counts.sections >= 2 {
            points::TWO_SECTIONS
        } else if counts.sections >= 1 {
            points::ONE_SECTION
        } else {
            findings.push(Finding::new(
                Severity::Low,
                "document has no section headers",
                "Organize the content under `##` section headers",
            ));
            0
        };

        Ok(AnalyzerResult::scored(
            self.name(),
            title + hierarchy,
            STRUCTURE_MAX,
            findings,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::RunContext;
    use crate::artifact::Artifact;
    use crate::config::Settings;
    use crate::score::Mode;
    use chrono::NaiveDate;

    fn score(content: &str) -> AnalyzerResult {
        let run = RunContext::new(
            "/docs",
            Mode::Docs,
            Settings::default(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        let artifact = Artifact::new("/docs/README.md", content.to_string());
        StructureAnalyzer
            .analyze(&AnalysisContext::new(&artifact, &run))
            .unwrap()
    }

    #[test]
    fn test_full_structure() {
        let r = score("# Guide\n## One\n## Two\n### Two a\n## Three\n");
        assert_eq!(r.score, 25);
        assert!(r.findings.is_empty());
    }

    #[test]
    fn test_title_only() {
        let r = score("# Guide\n\nsome text\n");
        assert_eq!(r.score, 15);
        assert_eq!(r.findings.len(), 1);
        assert_eq!(r.findings[0].severity, Severity::Low);
    }

    #[test]
    fn test_multiple_titles() {
        let r = score("# One\n# Two\n## A\n## B\n");
        assert_eq!(r.score, 10 + 7);
    }

    #[test]
    fn test_malformed_title() {
        let r = score("#Guide\n## A\n");
        assert_eq!(r.score, 5 + 4);
        assert!(r.findings.iter().any(|f| f.message.contains("malformed")));

        let r = score("#\n");
        assert_eq!(r.score, 5);
    }

    #[test]
    fn test_no_title() {
        let r = score("just prose\n");
        assert_eq!(r.score, 0);
        assert_eq!(r.worst_severity(), Some(Severity::Medium));
    }

    #[test]
    fn test_headings_in_fences_ignored() {
        let r = score("# Guide\n```\n# fake\n## fake\n## fake\n```\n");
        assert_eq!(r.score, 15);
    }
}
