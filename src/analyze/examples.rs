//! Fenced code example coverage.

use super::markdown::MarkdownDoc;
use super::{AnalysisContext, Analyzer, AnalyzerResult, Finding, Severity};

pub const EXAMPLES_MAX: u32 = 15;

const LANGUAGE_TAG_BONUS: u32 = 5;

fn block_points(blocks: usize) -> u32 {
    match blocks {
        0 => 0,
        1 => 5,
        2 => 8,
        _ => 10,
    }
}

pub struct ExampleAnalyzer;

impl Analyzer for ExampleAnalyzer {
    fn name(&self) -> &'static str {
        "examples"
    }

    fn max_score(&self) -> u32 {
        EXAMPLES_MAX
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> anyhow::Result<AnalyzerResult> {
        let doc = MarkdownDoc::parse(&ctx.artifact.content);
        let blocks = doc.blocks.len();
        let mut score = block_points(blocks);
        let mut findings = Vec::new();

        if blocks == 0 {
            findings.push(Finding::new(
                Severity::Medium,
                "document contains no code examples",
                "Add code examples",
            ));
        } else if doc.blocks.iter().any(|b| b.language.is_some()) {
            score += LANGUAGE_TAG_BONUS;
        } else {
            findings.push(Finding::new(
                Severity::Low,
                format!("none of the {} code blocks declares a language", blocks),
                "Tag code fences with their language (e.g. ```rust) for highlighting",
            ));
        }

        Ok(AnalyzerResult::scored(self.name(), score, EXAMPLES_MAX, findings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::testutil::{docs_artifact, docs_run};

    fn score(content: &str) -> AnalyzerResult {
        let run = docs_run();
        let artifact = docs_artifact("README.md", content);
        ExampleAnalyzer
            .analyze(&AnalysisContext::new(&artifact, &run))
            .unwrap()
    }

    #[test]
    fn test_no_examples() {
        let r = score("# Title\n\ntext\n");
        assert_eq!(r.score, 0);
        assert_eq!(r.findings[0].recommendation, "Add code examples");
    }

    #[test]
    fn test_block_bands() {
        assert_eq!(score("```\na\n```\n").score, 5);
        assert_eq!(score("```\na\n```\n```\nb\n```\n").score, 8);
        assert_eq!(score("```\na\n```\n```\nb\n```\n~~~\nc\n~~~\n").score, 10);
        assert_eq!(score("```\na\n```\n```\nb\n```\n```\nc\n```\n```\nd\n```\n").score, 10);
    }

    #[test]
    fn test_language_bonus() {
        let r = score("```rust\nfn main() {}\n```\n```\nplain\n```\n```sh\nls\n```\n");
        assert_eq!(r.score, 15);
        assert!(r.findings.is_empty());

        let r = score("```\nplain\n```\n");
        assert_eq!(r.score, 5);
        assert_eq!(r.findings[0].severity, Severity::Low);
    }
}
