//! Compliance tagging and topic coverage.
//!
//! Tags are written `[XXX-N]`, e.g. `[AIR-3]`. Two vocabularies are known:
//! AI labelling and Bitcoin compliance. Tags outside both vocabularies still
//! satisfy `requiredTags` but earn no points.

use lazy_static::lazy_static;
use phf::phf_map;
use regex::Regex;
use std::collections::BTreeSet;

use super::markdown::MarkdownDoc;
use super::rules::{self, Rule};
use super::{AnalysisContext, Analyzer, AnalyzerResult, Finding, Severity};

pub const COMPLIANCE_MAX: u32 = 15;

const POINTS_PER_TAG: u32 = 2;
const TAG_POINTS_CAP: u32 = 8;

/// Known tag prefixes and the vocabulary each belongs to.
static TAG_VOCABULARY: phf::Map<&'static str, &'static str> = phf_map! {
    "AIR" => "ai-labelling",
    "AIS" => "ai-labelling",
    "AIT" => "ai-labelling",
    "AIM" => "ai-labelling",
    "AIP" => "ai-labelling",
    "AIE" => "ai-labelling",
    "BPC" => "bitcoin",
    "RES" => "bitcoin",
    "SCL" => "bitcoin",
    "PFM" => "bitcoin",
    "DAO" => "bitcoin",
    "DID" => "bitcoin",
    "W5C" => "bitcoin",
    "UXA" => "bitcoin",
};

lazy_static! {
    static ref TAG: Regex = Regex::new(r"\[([A-Z][A-Z0-9]{1,4})-(\d+)\]").unwrap();
    static ref TAG_SHAPE: Regex = Regex::new(r"^[A-Z][A-Z0-9]{1,4}-\d+$").unwrap();

    /// Topic keywords: security 3, testing 2, standards 2
    static ref TOPIC_RULES: Vec<Rule> = vec![
        Rule::new(
            r"(?i)\b(security|secure|authenticat\w*|authori[sz]ation|encrypt\w*|vulnerabilit(y|ies)|threat model)\b",
            3,
            "security",
        ),
        Rule::new(
            r"(?i)\b(test(s|ing|ed)?|coverage|benchmarks?|fuzz(ing)?)\b",
            2,
            "testing",
        ),
        Rule::new(
            r"(?i)\b(standards?|complian(ce|t)|specification|BIP-?\d+|RFC ?\d+|ISO ?\d+)\b",
            2,
            "standards",
        ),
    ];
}

/// Whether `tag` (without brackets) has the `XXX-N` shape.
pub fn is_tag_shaped(tag: &str) -> bool {
    TAG_SHAPE.is_match(tag)
}

/// Vocabulary a tag prefix belongs to, if known.
pub fn vocabulary_of(prefix: &str) -> Option<&'static str> {
    TAG_VOCABULARY.get(prefix).copied()
}

/// Distinct known tags in `text`, in sorted order.
pub fn known_tags(text: &str) -> BTreeSet<String> {
    TAG.captures_iter(text)
        .filter(|c| TAG_VOCABULARY.contains_key(&c[1]))
        .map(|c| format!("{}-{}", &c[1], &c[2]))
        .collect()
}

pub struct ComplianceAnalyzer;

impl Analyzer for ComplianceAnalyzer {
    fn name(&self) -> &'static str {
        "compliance"
    }

    fn max_score(&self) -> u32 {
        COMPLIANCE_MAX
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> anyhow::Result<AnalyzerResult> {
        let prose = MarkdownDoc::parse(&ctx.artifact.content).prose_text();
        let tags = known_tags(&prose);
        let mut findings = Vec::new();

        let tag_points = (tags.len() as u32 * POINTS_PER_TAG).min(TAG_POINTS_CAP);
        let topic_points = rules::weighted_presence(&TOPIC_RULES, &prose);

        for required in &ctx.run.settings.required_tags {
            if !prose.contains(&format!("[{}]", required)) {
                findings.push(Finding::new(
                    Severity::Medium,
                    format!("required tag [{}] is missing", required),
                    format!("Add the [{}] compliance tag", required),
                ));
            }
        }

        if tags.is_empty() && !TAG.is_match(&prose) {
            findings.push(Finding::new(
                Severity::Low,
                "document carries no compliance tags",
                "Label the document with compliance tags such as [AIR-3] or [BPC-3]",
            ));
        }

        Ok(AnalyzerResult::scored(
            self.name(),
            tag_points + topic_points,
            COMPLIANCE_MAX,
            findings,
        ))
    }
}
