//! Internal link validation.
//!
//! Only local targets are checked. External URLs, `mailto:` targets and
//! same-document anchors are skipped; there is no network access.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::PathBuf;

use super::markdown::MarkdownDoc;
use super::{AnalysisContext, Analyzer, AnalyzerResult, Finding, Severity};

pub const LINKS_MAX: u32 = 15;

mod points {
    pub const NO_INTERNAL_LINKS: u32 = 10;
    pub const ALL_PRESENT: u32 = 15;
    pub const MOSTLY_PRESENT: u32 = 10;
    pub const MANY_BROKEN: u32 = 5;
}

lazy_static! {
    /// `[text](target)` or `[text](target "title")`, also matching images
    static ref LINK: Regex =
        Regex::new(r#"\[[^\]]*\]\(\s*<?([^)\s>]+)>?(?:\s+(?:"[^"]*"|'[^']*'))?\s*\)"#).unwrap();
    static ref SCHEME: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").unwrap();
}

/// A link target found in prose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    pub target: String,
    pub line: usize,
}

/// Internal link targets in document order, after skipping external ones.
pub fn internal_links(content: &str) -> Vec<LinkRef> {
    let doc = MarkdownDoc::parse(content);
    let mut links = Vec::new();
    for (line_no, line) in &doc.prose {
        for caps in LINK.captures_iter(line) {
            let target = &caps[1];
            if is_external(target) {
                continue;
            }
            links.push(LinkRef {
                target: target.to_string(),
                line: *line_no,
            });
        }
    }
    links
}

fn is_external(target: &str) -> bool {
    SCHEME.is_match(target)
        || target.to_lowercase().starts_with("mailto:")
        || target.starts_with('#')
}

/// Drop `#fragment` and `?query` suffixes.
fn strip_suffixes(target: &str) -> &str {
    let end = target.find(['#', '?']).unwrap_or(target.len());
    &target[..end]
}

pub struct ReferenceValidator;

impl ReferenceValidator {
    fn resolve(&self, ctx: &AnalysisContext<'_>, target: &str) -> PathBuf {
        match target.strip_prefix('/') {
            Some(rest) => ctx.run.root.join(rest),
            None => ctx.artifact.directory().join(target),
        }
    }
}

impl Analyzer for ReferenceValidator {
    fn name(&self) -> &'static str {
        "links"
    }

    fn max_score(&self) -> u32 {
        LINKS_MAX
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> anyhow::Result<AnalyzerResult> {
        let links: Vec<LinkRef> = internal_links(&ctx.artifact.content)
            .into_iter()
            .filter(|l| !strip_suffixes(&l.target).is_empty())
            .collect();

        if links.is_empty() {
            return Ok(AnalyzerResult::scored(
                self.name(),
                points::NO_INTERNAL_LINKS,
                LINKS_MAX,
                vec![],
            ));
        }

        let mut findings = Vec::new();
        for link in &links {
            let path = self.resolve(ctx, strip_suffixes(&link.target));
            if !path.exists() {
                findings.push(Finding::new(
                    Severity::Medium,
                    format!("broken link to {} (line {})", link.target, link.line),
                    "Fix or remove broken internal links",
                ));
            }
        }

        let total = links.len();
        let present = total - findings.len();
        let score = if present == total {
            points::ALL_PRESENT
        } else if present * 5 >= total * 4 {
            points::MOSTLY_PRESENT
        } else {
            points::MANY_BROKEN
        };

        Ok(AnalyzerResult::scored(self.name(), score, LINKS_MAX, findings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::testutil::run_at;
    use crate::artifact::Artifact;
    use tempfile::TempDir;

    fn score_in(temp: &TempDir, rel: &str, content: &str) -> AnalyzerResult {
        let run = run_at(temp.path());
        let artifact = Artifact::new(temp.path().join(rel), content.to_string());
        ReferenceValidator
            .analyze(&AnalysisContext::new(&artifact, &run))
            .unwrap()
    }

    #[test]
    fn test_internal_links_skip_external() {
        let content = r#"
[site](https://example.com) [mail](mailto:a@b.c) [anchor](#usage)
[guide](guide.md "The guide") [api](/docs/api.md#types)
```
[in fence](missing.md)
```
"#;
        let links = internal_links(content);
        let targets: Vec<&str> = links.iter().map(|l| l.target.as_str()).collect();
        assert_eq!(targets, vec!["guide.md", "/docs/api.md#types"]);
        assert_eq!(links[0].line, 3);
    }

    #[test]
    fn test_strip_suffixes() {
        assert_eq!(strip_suffixes("a.md#x"), "a.md");
        assert_eq!(strip_suffixes("a.md?raw=1"), "a.md");
        assert_eq!(strip_suffixes("a.md"), "a.md");
    }

    #[test]
    fn test_no_internal_links() {
        let temp = TempDir::new().unwrap();
        let r = score_in(&temp, "README.md", "[x](https://example.com)\n");
        assert_eq!(r.score, 10);
        assert!(r.findings.is_empty());
    }

    #[test]
    fn test_all_present_and_root_relative() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("docs")).unwrap();
        std::fs::write(temp.path().join("docs/a.md"), "a").unwrap();
        std::fs::write(temp.path().join("LICENSE"), "l").unwrap();
        let r = score_in(
            &temp,
            "docs/README.md",
            "[a](a.md#top) [l](/LICENSE) [up](../LICENSE)\n",
        );
        assert_eq!(r.score, 15);
    }

    #[test]
    fn test_broken_link_bands() {
        let temp = TempDir::new().unwrap();
        for name in ["a.md", "b.md", "c.md", "d.md"] {
            std::fs::write(temp.path().join(name), "x").unwrap();
        }

        let r = score_in(&temp, "README.md", "[gone](gone.md)\n");
        assert_eq!(r.score, 5);
        assert_eq!(r.findings.len(), 1);
        assert_eq!(r.findings[0].severity, Severity::Medium);
        assert!(r.findings[0].message.contains("gone.md"));

        let r = score_in(
            &temp,
            "README.md",
            "[a](a.md) [b](b.md) [c](c.md) [d](d.md) [gone](gone.md)\n",
        );
        assert_eq!(r.score, 10);

        let r = score_in(&temp, "README.md", "[a](a.md) [b](b.md)\n");
        assert_eq!(r.score, 15);
    }
}
