//! Run coordination: discovery, the pre-analysis barrier, parallel
//! per-artifact scoring and the aggregate fold.

use chrono::{Local, NaiveDate};
use globset::GlobSet;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::analyze::{
    AnalyzerResult, CommandProbe, CompilationProbe, Finding, Pipeline, ProbeReport, RunContext,
    Severity,
};
use crate::artifact::{Artifact, ArtifactLoader, Loaded, DOC_EXTENSIONS, SOURCE_EXTENSIONS};
use crate::config::Settings;
use crate::error::VerifyError;
use crate::recommend::{recommend, Recommendation};
use crate::score::{aggregate, CompositeScore, Mode, Tier};
use crate::symbols::SymbolIndex;

/// Shared flag checked between artifacts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything produced for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactScore {
    /// Path relative to the scan root
    pub file: String,
    pub composite: CompositeScore,
    pub results: Vec<AnalyzerResult>,
    pub recommendations: Vec<Recommendation>,
}

impl ArtifactScore {
    /// Score an artifact from its analyzer results.
    pub fn from_results(file: String, mode: Mode, results: Vec<AnalyzerResult>) -> Self {
        let composite = aggregate(mode, &results);
        let recommendations = recommend(mode, &results, &composite);
        Self {
            file,
            composite,
            results,
            recommendations,
        }
    }

    /// A 0/Critical entry carrying a single synthetic finding.
    pub fn forced_critical(file: String, mode: Mode, analyzer: &str, finding: Finding) -> Self {
        let result = AnalyzerResult::scored(analyzer, 0, 0, vec![finding]);
        let composite = CompositeScore::zero();
        let recommendations = recommend(mode, std::slice::from_ref(&result), &composite);
        Self {
            file,
            composite,
            results: vec![result],
            recommendations,
        }
    }

    /// All findings with the analyzer that produced them.
    pub fn findings(&self) -> impl Iterator<Item = (&str, &Finding)> {
        self.results
            .iter()
            .flat_map(|r| r.findings.iter().map(move |f| (r.analyzer.as_str(), f)))
    }
}

/// A Critical finding lifted into the run summary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriticalFinding {
    pub file: String,
    pub analyzer: String,
    pub message: String,
}

/// Run-level statistics, built by a commutative and associative fold.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateReport {
    pub artifact_count: usize,
    pub tier_counts: BTreeMap<Tier, usize>,
    /// Sum of composite totals; the average is derived from it
    pub score_sum: u64,
    /// Kept sorted so that fold order cannot change the report
    pub critical_findings: Vec<CriticalFinding>,
    pub partial: bool,
}

impl AggregateReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one artifact into the report.
    pub fn absorb(&mut self, score: &ArtifactScore) {
        self.artifact_count += 1;
        *self.tier_counts.entry(score.composite.tier).or_insert(0) += 1;
        self.score_sum += u64::from(score.composite.total);
        for (analyzer, finding) in score.findings() {
            if finding.severity == Severity::Critical {
                let critical = CriticalFinding {
                    file: finding.location.clone().unwrap_or_else(|| score.file.clone()),
                    analyzer: analyzer.to_string(),
                    message: finding.message.clone(),
                };
                let at = self.critical_findings.partition_point(|c| c <= &critical);
                self.critical_findings.insert(at, critical);
            }
        }
    }

    /// Combine two partial reports.
    pub fn merge(mut self, other: AggregateReport) -> AggregateReport {
        self.artifact_count += other.artifact_count;
        for (tier, count) in other.tier_counts {
            *self.tier_counts.entry(tier).or_insert(0) += count;
        }
        self.score_sum += other.score_sum;
        self.critical_findings.extend(other.critical_findings);
        self.critical_findings.sort();
        self.partial |= other.partial;
        self
    }

    /// Arithmetic mean of the composite totals; 0 for an empty run.
    pub fn average_score(&self) -> f64 {
        if self.artifact_count == 0 {
            0.0
        } else {
            self.score_sum as f64 / self.artifact_count as f64
        }
    }

    pub fn tier_count(&self, tier: Tier) -> usize {
        self.tier_counts.get(&tier).copied().unwrap_or(0)
    }

    pub fn has_critical_findings(&self) -> bool {
        !self.critical_findings.is_empty()
    }
}

/// Result of a whole run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub mode: Mode,
    pub root: PathBuf,
    pub scores: Vec<ArtifactScore>,
    pub aggregate: AggregateReport,
}

/// Orchestrates one run over a root.
pub struct RunCoordinator {
    root: PathBuf,
    mode: Mode,
    settings: Settings,
    exclude: GlobSet,
    cancel: CancelToken,
    progress: bool,
    probe: Option<Box<dyn CompilationProbe>>,
    today: NaiveDate,
}

impl RunCoordinator {
    pub fn new<P: AsRef<Path>>(root: P, mode: Mode, settings: Settings) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            mode,
            settings,
            exclude: GlobSet::empty(),
            cancel: CancelToken::new(),
            progress: false,
            probe: None,
            today: Local::now().date_naive(),
        }
    }

    pub fn exclude(mut self, exclude: GlobSet) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Show a progress bar on stderr.
    pub fn progress(mut self, show: bool) -> Self {
        self.progress = show;
        self
    }

    /// Use this probe instead of detecting one from the tree.
    pub fn probe(mut self, probe: Box<dyn CompilationProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Reference date for freshness checks.
    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Run the pipeline over every discovered artifact.
    pub fn run(&self) -> Result<RunOutcome, VerifyError> {
        let root = std::fs::canonicalize(&self.root).map_err(|e| VerifyError::Root {
            path: self.root.clone(),
            source: e,
        })?;
        info!("verifying {} in {} mode", root.display(), self.mode);

        let (items, context) = match self.mode {
            Mode::Docs => self.prepare_docs(&root),
            Mode::Health => self.prepare_health(&root),
        };
        let pipeline = Pipeline::for_mode(self.mode);

        let bar = self.progress_bar(items.len());
        let scored: Vec<Option<ArtifactScore>> = items
            .par_iter()
            .map(|item| {
                if self.cancel.is_cancelled() {
                    return None;
                }
                let score = score_item(item, &pipeline, &context);
                if let Some(bar) = &bar {
                    bar.inc(1);
                }
                Some(score)
            })
            .collect();
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }

        let skipped = scored.iter().filter(|s| s.is_none()).count();
        let scores: Vec<ArtifactScore> = scored.into_iter().flatten().collect();
        let mut report = scores.iter().fold(AggregateReport::new(), |mut acc, s| {
            acc.absorb(s);
            acc
        });
        if skipped > 0 {
            warn!("run cancelled, {} artifacts not analyzed", skipped);
            report.partial = true;
        }

        Ok(RunOutcome {
            mode: self.mode,
            root,
            scores,
            aggregate: report,
        })
    }

    fn loader(&self, root: &Path, extensions: &'static [&'static str]) -> ArtifactLoader {
        ArtifactLoader::new(root, extensions).exclude(self.exclude.clone())
    }

    fn prepare_docs(&self, root: &Path) -> (Vec<Item>, RunContext) {
        let loaded = self
            .loader(root, DOC_EXTENSIONS)
            .min_bytes(self.settings.min_artifact_bytes)
            .load_all();

        let dirs: BTreeSet<PathBuf> = loaded
            .iter()
            .filter_map(|l| l.path().parent().map(Path::to_path_buf))
            .collect();
        let dirs: Vec<PathBuf> = dirs.into_iter().collect();
        let symbols = SymbolIndex::build(&dirs);
        debug!("symbol index covers {} directories", symbols.len());

        let context = self.context(root).with_symbols(symbols);
        (loaded.into_iter().map(Item::Loaded).collect(), context)
    }

    fn prepare_health(&self, root: &Path) -> (Vec<Item>, RunContext) {
        let context = self.context(root);
        let (sources, unreadable) =
            split_sources(self.loader(root, SOURCE_EXTENSIONS).load_all(), &context);

        let mut tree = Artifact::new(root, String::new());
        tree.size_bytes = sources.iter().map(|a| a.size_bytes).sum();
        tree.line_count = sources.iter().map(|a| a.line_count).sum();

        let probe = if self.cancel.is_cancelled() {
            ProbeReport::skipped("run cancelled")
        } else {
            self.run_probe(root)
        };

        let context = context.with_sources(sources).with_probe(probe);
        (vec![Item::Tree(tree, unreadable)], context)
    }

    fn run_probe(&self, root: &Path) -> ProbeReport {
        let dir = base_dir(root);
        if let Some(probe) = &self.probe {
            return probe.run(dir);
        }

        let timeout = Duration::from_secs(self.settings.probe_timeout_secs);
        let detected = match &self.settings.probe_command {
            Some(command) => Some(CommandProbe::new(command.clone(), timeout)),
            None => CommandProbe::detect(dir, timeout),
        };
        match detected {
            Some(probe) => probe.run(dir),
            None => ProbeReport::skipped("no build manifest found"),
        }
    }

    /// Context rooted at the scan directory; a file root resolves to its parent.
    fn context(&self, root: &Path) -> RunContext {
        RunContext::new(base_dir(root), self.mode, self.settings.clone(), self.today)
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.progress || len == 0 {
            return None;
        }
        let bar = ProgressBar::new(len as u64);
        let style = ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        bar.set_style(style);
        bar.set_message(format!("scoring ({})", self.mode));
        Some(bar)
    }
}

/// Readable sources, plus one Medium finding per file that could not be read.
fn split_sources(loaded: Vec<Loaded>, context: &RunContext) -> (Vec<Artifact>, Vec<Finding>) {
    let mut sources = Vec::new();
    let mut unreadable = Vec::new();
    for item in loaded {
        match item {
            Loaded::Ready(a) | Loaded::TooSmall(a) => sources.push(a),
            Loaded::Unreadable { path, error } => {
                warn!("skipping unreadable source {}: {}", path.display(), error);
                unreadable.push(
                    Finding::new(
                        Severity::Medium,
                        format!("source file could not be analyzed: {}", error),
                        "Check the file's permissions and encoding",
                    )
                    .at(context.relative(&path)),
                );
            }
        }
    }
    (sources, unreadable)
}

fn base_dir(root: &Path) -> &Path {
    if root.is_file() {
        root.parent().unwrap_or(root)
    } else {
        root
    }
}

/// Unit of parallel work.
enum Item {
    Loaded(Loaded),
    /// The whole source tree, with findings for files that could not be read
    Tree(Artifact, Vec<Finding>),
}

fn score_item(item: &Item, pipeline: &Pipeline, context: &RunContext) -> ArtifactScore {
    let mode = pipeline.mode();
    match item {
        Item::Tree(tree, unreadable) => {
            let mut results = pipeline.run(tree, context);
            if !unreadable.is_empty() {
                // zero cap: reported, never deducted
                results.push(AnalyzerResult::deducted("loader", 0, 0, unreadable.clone()));
            }
            ArtifactScore::from_results(context.relative(&tree.path), mode, results)
        }
        Item::Loaded(Loaded::Ready(artifact)) => ArtifactScore::from_results(
            context.relative(&artifact.path),
            mode,
            pipeline.run(artifact, context),
        ),
        Item::Loaded(Loaded::TooSmall(artifact)) => ArtifactScore::forced_critical(
            context.relative(&artifact.path),
            mode,
            "loader",
            Finding::new(
                Severity::High,
                format!(
                    "artifact too small to be meaningful ({} bytes)",
                    artifact.size_bytes
                ),
                "Flesh out the document or remove it",
            ),
        ),
        Item::Loaded(Loaded::Unreadable { path, error }) => ArtifactScore::forced_critical(
            context.relative(path),
            mode,
            "loader",
            Finding::new(
                Severity::Critical,
                error.clone(),
                "Check the file's permissions and encoding",
            ),
        ),
    }
}
