//! Ordered analyzer pipeline with per-analyzer failure isolation.

use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use super::{
    AlignmentAnalyzer, AnalysisContext, Analyzer, AnalyzerResult, CompilationAnalyzer,
    CompletenessAnalyzer, ComplianceAnalyzer, ExampleAnalyzer, Finding, FreshnessAnalyzer,
    LicenseAnalyzer, MockDensityAnalyzer, ReferenceValidator, RunContext, Severity,
    StructureAnalyzer, WarningAnalyzer,
};
use crate::artifact::Artifact;
use crate::score::Mode;

/// Executes the registered analyzers, in order, against one artifact.
pub struct Pipeline {
    mode: Mode,
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            analyzers: Vec::new(),
        }
    }

    /// The standard analyzer set for a mode.
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Docs => Self::new(mode)
                .register(StructureAnalyzer)
                .register(AlignmentAnalyzer)
                .register(ReferenceValidator)
                .register(ExampleAnalyzer)
                .register(ComplianceAnalyzer)
                .register(FreshnessAnalyzer),
            Mode::Health => Self::new(mode)
                .register(CompilationAnalyzer)
                .register(CompletenessAnalyzer)
                .register(MockDensityAnalyzer)
                .register(WarningAnalyzer)
                .register(LicenseAnalyzer),
        }
    }

    /// Append an analyzer.
    pub fn register<A: Analyzer + 'static>(mut self, analyzer: A) -> Self {
        self.analyzers.push(Box::new(analyzer));
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Names of the registered analyzers, in order.
    pub fn analyzer_names(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    /// Sum of the registered analyzers' maxima.
    pub fn total_max(&self) -> u32 {
        self.analyzers.iter().map(|a| a.max_score()).sum()
    }

    /// Run every analyzer on one artifact. Always yields one result per
    /// analyzer, even when an analyzer errors or panics.
    pub fn run(&self, artifact: &Artifact, run: &RunContext) -> Vec<AnalyzerResult> {
        let ctx = AnalysisContext::new(artifact, run);
        self.analyzers
            .iter()
            .map(|analyzer| self.run_one(analyzer.as_ref(), &ctx))
            .collect()
    }

    fn run_one(&self, analyzer: &dyn Analyzer, ctx: &AnalysisContext<'_>) -> AnalyzerResult {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(ctx)));
        let reason = match outcome {
            Ok(Ok(mut result)) => {
                // score never exceeds max
                result.score = result.score.min(result.max_score);
                debug!(
                    "{} on {}: {}/{}",
                    analyzer.name(),
                    ctx.artifact.path.display(),
                    result.score,
                    result.max_score
                );
                return result;
            }
            Ok(Err(e)) => format!("{:#}", e),
            Err(payload) => panic_message(payload.as_ref()),
        };

        warn!(
            "analyzer {} failed on {}: {}",
            analyzer.name(),
            ctx.artifact.path.display(),
            reason
        );
        failure_result(analyzer.name(), analyzer.max_score(), self.mode, &reason)
    }
}

/// Result recorded for an analyzer that errored or panicked: it contributes
/// nothing to the composite (no points, no deduction).
pub fn failure_result(analyzer: &str, max_score: u32, mode: Mode, reason: &str) -> AnalyzerResult {
    let findings = vec![Finding::new(
        Severity::Medium,
        format!("internal analyzer failure: {}", reason),
        "Report this analyzer failure; the dimension was not scored",
    )];
    match mode {
        Mode::Docs => AnalyzerResult::scored(analyzer, 0, max_score, findings),
        Mode::Health => AnalyzerResult::deducted(analyzer, 0, max_score, findings),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::testutil::{docs_artifact, docs_run};

    struct Failing;

    impl Analyzer for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn max_score(&self) -> u32 {
            10
        }
        fn analyze(&self, _ctx: &AnalysisContext<'_>) -> anyhow::Result<AnalyzerResult> {
            anyhow::bail!("boom")
        }
    }

    struct Panicking;

    impl Analyzer for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }
        fn max_score(&self) -> u32 {
            10
        }
        fn analyze(&self, _ctx: &AnalysisContext<'_>) -> anyhow::Result<AnalyzerResult> {
            panic!("index out of range")
        }
    }

    #[test]
    fn test_rubric_partitions_sum_to_100() {
        assert_eq!(Pipeline::for_mode(Mode::Docs).total_max(), 100);
        assert_eq!(Pipeline::for_mode(Mode::Health).total_max(), 100);
    }

    #[test]
    fn test_docs_pipeline_order() {
        assert_eq!(
            Pipeline::for_mode(Mode::Docs).analyzer_names(),
            vec!["structure", "alignment", "links", "examples", "compliance", "freshness"]
        );
    }

    #[test]
    fn test_failures_isolated() {
        let pipeline = Pipeline::new(Mode::Docs)
            .register(Failing)
            .register(StructureAnalyzer)
            .register(Panicking);
        let run = docs_run();
        let artifact = docs_artifact("README.md", "# A title that is long enough\n");
        let results = pipeline.run(&artifact, &run);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].score, 0);
        assert!(results[0].findings[0].message.contains("boom"));
        assert_eq!(results[1].analyzer, "structure");
        assert_eq!(results[1].score, 15);
        assert_eq!(results[2].score, 0);
        assert_eq!(results[2].findings[0].severity, Severity::Medium);
        assert!(results[2].findings[0].message.contains("index out of range"));
    }

    #[test]
    fn test_failure_in_health_mode_deducts_nothing() {
        let r = failure_result("completeness", 25, Mode::Health, "boom");
        assert_eq!(r.deduction(), 0);
        let r = failure_result("structure", 25, Mode::Docs, "boom");
        assert_eq!(r.score, 0);
    }
}
