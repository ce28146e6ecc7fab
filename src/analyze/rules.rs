//! Declarative rule tables and the generic matcher that interprets them.
//!
//! Analyzers describe what they look for as data (`pattern`, `weight`,
//! `message`) and share one matcher, so adding a rule never touches analyzer
//! logic.

use regex::Regex;

/// One table entry.
#[derive(Debug)]
pub struct Rule {
    pub regex: Regex,
    pub weight: u32,
    pub message: &'static str,
}

impl Rule {
    /// Build a rule for a static table.
    ///
    /// Panics if `pattern` is not a valid regex.
    pub fn new(pattern: &str, weight: u32, message: &'static str) -> Self {
        Self {
            regex: Regex::new(pattern).unwrap(),
            weight,
            message,
        }
    }
}

/// A single rule occurrence.
#[derive(Debug, Clone, Copy)]
pub struct RuleHit<'r> {
    pub rule: &'r Rule,
    /// 1-based line number
    pub line: usize,
}

/// Match every rule against every line, counting each occurrence.
///
/// With `skip_strings`, occurrences inside double-quoted or backtick string
/// literals on the same line are ignored.
pub fn scan<'r, I>(rules: &'r [Rule], lines: I, skip_strings: bool) -> Vec<RuleHit<'r>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut hits = Vec::new();
    for (idx, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        for rule in rules {
            for mat in rule.regex.find_iter(line) {
                if skip_strings && is_inside_string_literal(line, mat.start()) {
                    continue;
                }
                hits.push(RuleHit { rule, line: idx + 1 });
            }
        }
    }
    hits
}

/// Rules that match anywhere in `text`, each reported once, in table order.
pub fn matched<'r>(rules: &'r [Rule], text: &str) -> Vec<&'r Rule> {
    rules.iter().filter(|r| r.regex.is_match(text)).collect()
}

/// Sum of the weights of the rules present in `text`.
pub fn weighted_presence(rules: &[Rule], text: &str) -> u32 {
    matched(rules, text).iter().map(|r| r.weight).sum()
}

/// Check if a byte offset in a line falls within a string literal.
/// Supports double-quoted and backtick strings with escape handling.
pub fn is_inside_string_literal(line: &str, pos: usize) -> bool {
    let mut in_string = false;
    let mut string_char = None;
    let mut escaped = false;

    for (i, ch) in line.char_indices() {
        if i >= pos {
            return in_string;
        }

        if escaped {
            escaped = false;
            continue;
        }

        if ch == '\\' && in_string {
            escaped = true;
            continue;
        }

        if ch == '"' || ch == '`' {
            if !in_string {
                in_string = true;
                string_char = Some(ch);
            } else if Some(ch) == string_char {
                in_string = false;
                string_char = None;
            }
        }
    }

    in_string
}
