//! Core types for analyzer results.

use serde::{Deserialize, Serialize};

/// Severity levels for findings, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// One specific problem detected by one analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
    pub recommendation: String,
    /// File the finding points at, when it is not the artifact itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Finding {
    pub fn new<M: Into<String>, R: Into<String>>(severity: Severity, message: M, recommendation: R) -> Self {
        Self {
            severity,
            message: message.into(),
            recommendation: recommendation.into(),
            location: None,
        }
    }

    /// Attach a location other than the artifact.
    pub fn at<L: Into<String>>(mut self, location: L) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Outcome of one analyzer on one artifact.
///
/// In deductive mode `max_score` is the analyzer's deduction cap and the
/// deduction is `max_score - score`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerResult {
    pub analyzer: String,
    pub score: u32,
    pub max_score: u32,
    pub findings: Vec<Finding>,
    /// Set when the result is an overriding gate failure
    #[serde(default)]
    pub gate_failed: bool,
}

impl AnalyzerResult {
    /// A result scored upward from zero. The score is clamped to `max_score`.
    pub fn scored(analyzer: &str, score: u32, max_score: u32, findings: Vec<Finding>) -> Self {
        Self {
            analyzer: analyzer.to_string(),
            score: score.min(max_score),
            max_score,
            findings,
            gate_failed: false,
        }
    }

    /// A result expressed as a deduction from the analyzer's cap.
    pub fn deducted(analyzer: &str, deduction: u32, max_score: u32, findings: Vec<Finding>) -> Self {
        Self {
            analyzer: analyzer.to_string(),
            score: max_score - deduction.min(max_score),
            max_score,
            findings,
            gate_failed: false,
        }
    }

    /// Points removed from the analyzer's cap.
    pub fn deduction(&self) -> u32 {
        self.max_score - self.score
    }

    /// Most severe finding, if any.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}
