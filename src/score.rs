//! Score aggregation and tier classification.
//!
//! Docs mode adds analyzer points up to 100. Health mode starts from 100 and
//! subtracts each analyzer's deduction, floored at 0; a failed build gate
//! forces the Critical tier whatever the number says.

use serde::{Deserialize, Serialize};

use crate::analyze::AnalyzerResult;

/// Tier lower bounds, inclusive. Shared by both modes.
pub mod tiers {
    pub const EXCELLENT_MIN: u32 = 95;
    pub const GOOD_MIN: u32 = 80;
    pub const FAIR_MIN: u32 = 60;
    pub const POOR_MIN: u32 = 40;
}

/// Maximum composite score.
pub const MAX_SCORE: u32 = 100;

/// Rubric selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Documentation artifacts, additive rubric
    Docs,
    /// Whole codebase, deductive budget
    Health,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Docs => "docs",
            Mode::Health => "health",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "docs" | "doc" | "documentation" => Ok(Mode::Docs),
            "health" | "code" => Ok(Mode::Health),
            _ => Err(format!("unknown mode: {} (expected docs or health)", s)),
        }
    }
}

/// Named quality bucket, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl Tier {
    pub const ALL: [Tier; 5] = [Tier::Excellent, Tier::Good, Tier::Fair, Tier::Poor, Tier::Critical];

    /// Classify a composite total.
    pub fn from_score(total: u32) -> Tier {
        match total {
            s if s >= tiers::EXCELLENT_MIN => Tier::Excellent,
            s if s >= tiers::GOOD_MIN => Tier::Good,
            s if s >= tiers::FAIR_MIN => Tier::Fair,
            s if s >= tiers::POOR_MIN => Tier::Poor,
            _ => Tier::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Excellent => "Excellent",
            Tier::Good => "Good",
            Tier::Fair => "Fair",
            Tier::Poor => "Poor",
            Tier::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single 0-100 number summarizing one artifact, and its tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub total: u32,
    pub tier: Tier,
}

impl CompositeScore {
    pub fn new(total: u32) -> Self {
        let total = total.min(MAX_SCORE);
        Self {
            total,
            tier: Tier::from_score(total),
        }
    }

    /// Zero score in the Critical tier, for artifacts that could not be scored.
    pub fn zero() -> Self {
        Self::new(0)
    }
}

/// Combine per-analyzer results into one composite according to the mode.
pub fn aggregate(mode: Mode, results: &[AnalyzerResult]) -> CompositeScore {
    let mut composite = match mode {
        Mode::Docs => {
            let sum: u32 = results.iter().map(|r| r.score.min(r.max_score)).sum();
            CompositeScore::new(sum)
        }
        Mode::Health => {
            let deducted: u32 = results.iter().map(|r| r.deduction()).sum();
            CompositeScore::new(MAX_SCORE.saturating_sub(deducted))
        }
    };

    if results.iter().any(|r| r.gate_failed) {
        composite.tier = Tier::Critical;
    }
    composite
}
