//! The analyzer seam.

use super::{AnalysisContext, AnalyzerResult};

/// One scoring dimension.
///
/// Each implementation reads the artifact and the shared run context and
/// returns exactly one result. Implementations hold no mutable state, so a
/// single instance is shared by every worker thread.
///
/// In additive mode `max_score` is the analyzer's share of the 100-point
/// rubric; in deductive mode it is the most the analyzer may subtract.
pub trait Analyzer: Send + Sync {
    /// Stable identifier used in reports and recommendation grouping.
    fn name(&self) -> &'static str;

    /// Upper bound of the result's score.
    fn max_score(&self) -> u32;

    /// Score one artifact.
    ///
    /// Returning an error does not abort the run: the pipeline records the
    /// failure against this analyzer only.
    fn analyze(&self, ctx: &AnalysisContext<'_>) -> anyhow::Result<AnalyzerResult>;
}
