//! verigate - multi-dimensional verification and scoring engine.
//!
//! One engine, two rubrics:
//!
//! - **docs** mode scores each Markdown artifact additively out of 100
//!   (structure, alignment with sibling code, internal links, examples,
//!   compliance tags, freshness).
//! - **health** mode scores a whole source tree against a 100-point deduction
//!   budget (build gate, stubs and work markers, mock density, warnings,
//!   licensing).
//!
//! # Architecture
//!
//! - `artifact`: discovery and loading of candidate files
//! - `symbols`: per-directory index of public declarations
//! - `analyze`: the `Analyzer` trait, the analyzers and the ordered pipeline
//! - `score`: composite aggregation and tier classification
//! - `recommend`: prioritized action items
//! - `run`: the coordinator and the aggregate fold
//! - `report`: Markdown and JSON output
//! - `config`: rubric configuration file
//!
//! # Example
//!
//! ```no_run
//! use verigate::{config::Settings, run::RunCoordinator, score::Mode};
//!
//! let outcome = RunCoordinator::new("docs", Mode::Docs, Settings::default()).run()?;
//! println!("average {:.1}", outcome.aggregate.average_score());
//! # Ok::<(), verigate::VerifyError>(())
//! ```

pub mod analyze;
pub mod artifact;
pub mod cli;
pub mod config;
pub mod error;
pub mod recommend;
pub mod report;
pub mod run;
pub mod score;
pub mod symbols;

pub use analyze::{Analyzer, AnalyzerResult, Finding, Pipeline, RunContext, Severity};
pub use artifact::{Artifact, ArtifactLoader};
pub use config::{RubricConfig, Settings};
pub use error::VerifyError;
pub use recommend::{Priority, Recommendation};
pub use run::{AggregateReport, ArtifactScore, CancelToken, RunCoordinator, RunOutcome};
pub use score::{CompositeScore, Mode, Tier};
pub use symbols::SymbolIndex;
