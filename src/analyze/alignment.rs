//! Documentation/code alignment: how many of the public symbols declared
//! next to a document the document actually mentions.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use super::{AnalysisContext, Analyzer, AnalyzerResult, Finding, Severity};

pub const ALIGNMENT_MAX: u32 = 20;

/// Awarded when there is no code to align with.
pub const BASELINE: u32 = 15;

/// Unreferenced symbols listed in the detail finding.
const LISTED_SYMBOLS: usize = 5;

lazy_static! {
    static ref IDENT: Regex = Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").unwrap();
}

/// Map a mention ratio to its band.
fn band(mentioned: usize, total: usize) -> u32 {
    // ratio >= n/4  <=>  4 * mentioned >= n * total
    if mentioned * 4 >= total * 3 {
        20
    } else if mentioned * 2 >= total {
        15
    } else if mentioned * 4 >= total {
        10
    } else if mentioned > 0 {
        5
    } else {
        0
    }
}

pub struct AlignmentAnalyzer;

impl Analyzer for AlignmentAnalyzer {
    fn name(&self) -> &'static str {
        "alignment"
    }

    fn max_score(&self) -> u32 {
        ALIGNMENT_MAX
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> anyhow::Result<AnalyzerResult> {
        let symbols = ctx.run.symbols.symbols_for(ctx.artifact.directory());
        if symbols.is_empty() {
            return Ok(AnalyzerResult::scored(
                self.name(),
                BASELINE,
                ALIGNMENT_MAX,
                vec![Finding::new(
                    Severity::Info,
                    "no public symbols declared alongside this document",
                    "Nothing to align with; baseline score applied",
                )],
            ));
        }

        let tokens: HashSet<&str> = IDENT
            .find_iter(&ctx.artifact.content)
            .map(|m| m.as_str())
            .collect();

        // BTreeSet iteration keeps the unreferenced list sorted
        let unreferenced: Vec<&String> = symbols
            .iter()
            .filter(|s| !tokens.contains(s.as_str()))
            .collect();
        let total = symbols.len();
        let mentioned = total - unreferenced.len();
        let score = band(mentioned, total);

        let mut findings = Vec::new();
        if mentioned == 0 {
            findings.push(Finding::new(
                Severity::High,
                format!("none of the {} public symbols in this directory is documented", total),
                "Document the public API declared alongside this file",
            ));
        }
        if score < ALIGNMENT_MAX {
            let listed: Vec<&str> = unreferenced
                .iter()
                .take(LISTED_SYMBOLS)
                .map(|s| s.as_str())
                .collect();
            findings.push(Finding::new(
                Severity::Low,
                format!(
                    "{} of {} public symbols unreferenced: {}",
                    unreferenced.len(),
                    total,
                    listed.join(", ")
                ),
                "Mention the undocumented symbols in the documentation",
            ));
        }

        Ok(AnalyzerResult::scored(self.name(), score, ALIGNMENT_MAX, findings))
    }
}
