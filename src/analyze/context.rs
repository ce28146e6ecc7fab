//! Shared, read-only state threaded through every analyzer.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use super::probe::ProbeReport;
use crate::artifact::Artifact;
use crate::config::Settings;
use crate::score::Mode;
use crate::symbols::SymbolIndex;

/// Everything an analyzer may read beyond its own artifact.
///
/// Built once before analysis starts (after the symbol index and the
/// compilation probe have finished) and never mutated afterwards, so it can
/// be shared by reference across worker threads.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Scan directory (the parent when a single file is verified); absolute-style
    /// link targets resolve against it
    pub root: PathBuf,
    pub mode: Mode,
    pub settings: Settings,
    pub symbols: SymbolIndex,
    /// Source files of the tree (health mode only)
    pub sources: Vec<Artifact>,
    pub probe: ProbeReport,
    /// Reference date for freshness checks
    pub today: NaiveDate,
}

impl RunContext {
    /// A context with no symbols, no sources and a skipped probe.
    pub fn new<P: AsRef<Path>>(root: P, mode: Mode, settings: Settings, today: NaiveDate) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            mode,
            settings,
            symbols: SymbolIndex::new(),
            sources: Vec::new(),
            probe: ProbeReport::skipped("not run"),
            today,
        }
    }

    pub fn with_symbols(mut self, symbols: SymbolIndex) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn with_sources(mut self, sources: Vec<Artifact>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_probe(mut self, probe: ProbeReport) -> Self {
        self.probe = probe;
        self
    }

    /// Path of `path` relative to the root, with forward slashes.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let s = rel.to_string_lossy().replace('\\', "/");
        if s.is_empty() {
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| ".".to_string())
        } else {
            s
        }
    }
}

/// Input for one (artifact, analyzer) evaluation.
#[derive(Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub artifact: &'a Artifact,
    pub run: &'a RunContext,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(artifact: &'a Artifact, run: &'a RunContext) -> Self {
        Self { artifact, run }
    }
}
