//! Analyzers: one scoring dimension each, run through an ordered pipeline.
//!
//! Documentation mode (additive, 100 points):
//! - structure (25), alignment (20), links (15), examples (15),
//!   compliance (15), freshness (10)
//!
//! Health mode (deductive, 100-point budget):
//! - compilation (40), completeness (25), mock density (15),
//!   warnings (10), license (10)

mod alignment;
mod completeness;
mod compliance;
mod context;
mod examples;
mod freshness;
mod license;
mod links;
pub mod markdown;
mod mocks;
mod pipeline;
pub mod probe;
pub mod rules;
pub mod source;
mod structure;
mod traits;
mod types;
mod warnings;

pub use alignment::AlignmentAnalyzer;
pub use completeness::CompletenessAnalyzer;
pub use compliance::{is_tag_shaped, known_tags, vocabulary_of, ComplianceAnalyzer};
pub use context::{AnalysisContext, RunContext};
pub use examples::ExampleAnalyzer;
pub use freshness::{document_date, marker_date, DateSource, FreshnessAnalyzer};
pub use license::{has_license_file, LicenseAnalyzer};
pub use links::{internal_links, LinkRef, ReferenceValidator};
pub use mocks::{subsystem_of, MockDensityAnalyzer};
pub use pipeline::{failure_result, Pipeline};
pub use probe::{
    CommandProbe, CompilationAnalyzer, CompilationProbe, FakeProbe, ProbeReport, ProbeStatus,
};
pub use structure::StructureAnalyzer;
pub use traits::Analyzer;
pub use types::{AnalyzerResult, Finding, Severity};
pub use warnings::WarningAnalyzer;
