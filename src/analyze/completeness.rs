//! Unfinished-code detection.
//!
//! Two marker kinds are tracked separately:
//! - stub implementations (`todo!()`, `unimplemented!()`,
//!   `raise NotImplementedError`, `panic("not implemented")`, ...)
//! - work markers in comments (`TODO`, `FIXME`, `XXX`, `HACK`)

use lazy_static::lazy_static;

use super::rules::{self, Rule, RuleHit};
use super::source::production_sources;
use super::{AnalysisContext, Analyzer, AnalyzerResult, Finding, Severity};

pub const COMPLETENESS_MAX: u32 = 25;

const STUB_CAP: u32 = 15;
const WORK_MARKER_CAP: u32 = 10;

/// Occurrences quoted in a finding.
const QUOTED_LOCATIONS: usize = 3;

lazy_static! {
    static ref STUB_RULES: Vec<Rule> = vec![
        Rule::new(r"\btodo!\s*\(", 2, "todo!() macro"),
        Rule::new(r"\bunimplemented!\s*\(", 2, "unimplemented!() macro"),
        Rule::new(r"\bNotImplementedError\b", 2, "NotImplementedError raised"),
        Rule::new(r#"(?i)\bpanic!?\(\s*"not (yet )?implemented"#, 2, "panic on unimplemented path"),
        Rule::new(
            r#"(?i)\bthrow\s+new\s+\w*Error\(\s*["'`]not (yet )?implemented"#,
            2,
            "throw on unimplemented path",
        ),
    ];

    static ref WORK_MARKER_RULES: Vec<Rule> = vec![
        Rule::new(r"\bTODO\b", 1, "TODO"),
        Rule::new(r"\bFIXME\b", 1, "FIXME"),
        Rule::new(r"\bXXX\b", 1, "XXX"),
        Rule::new(r"\bHACK\b", 1, "HACK"),
    ];
}

/// Marker hits for one file, tagged with its display path.
struct Located<'r> {
    file: String,
    hit: RuleHit<'r>,
}

fn deduction(hits: &[Located<'_>], cap: u32) -> u32 {
    hits.iter().map(|l| l.hit.rule.weight).sum::<u32>().min(cap)
}

fn quote(hits: &[Located<'_>]) -> String {
    let mut quoted: Vec<String> = hits
        .iter()
        .take(QUOTED_LOCATIONS)
        .map(|l| format!("{}:{}", l.file, l.hit.line))
        .collect();
    if hits.len() > QUOTED_LOCATIONS {
        quoted.push("...".to_string());
    }
    quoted.join(", ")
}

pub struct CompletenessAnalyzer;

impl Analyzer for CompletenessAnalyzer {
    fn name(&self) -> &'static str {
        "completeness"
    }

    fn max_score(&self) -> u32 {
        COMPLETENESS_MAX
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> anyhow::Result<AnalyzerResult> {
        let mut stubs = Vec::new();
        let mut markers = Vec::new();

        for (artifact, text) in production_sources(&ctx.run.sources, &ctx.run.root) {
            let file = ctx.run.relative(&artifact.path);
            for hit in rules::scan(&STUB_RULES, text.lines(), false) {
                stubs.push(Located { file: file.clone(), hit });
            }
            for hit in rules::scan(&WORK_MARKER_RULES, text.lines(), true) {
                markers.push(Located { file: file.clone(), hit });
            }
        }

        let mut findings = Vec::new();
        if !stubs.is_empty() {
            findings.push(Finding::new(
                Severity::High,
                format!("{} stub implementations ({})", stubs.len(), quote(&stubs)),
                "Implement or remove stubbed code paths before release",
            ));
        }
        if !markers.is_empty() {
            findings.push(Finding::new(
                Severity::Low,
                format!("{} TODO/FIXME/XXX/HACK markers ({})", markers.len(), quote(&markers)),
                "Resolve outstanding work markers or track them in the issue tracker",
            ));
        }

        let total = deduction(&stubs, STUB_CAP) + deduction(&markers, WORK_MARKER_CAP);
        Ok(AnalyzerResult::deducted(self.name(), total, COMPLETENESS_MAX, findings))
    }
}
