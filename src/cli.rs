//! Command-line interface for the verify binary.

use chrono::{SecondsFormat, Utc};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::{self, RubricConfig, Settings};
use crate::report::{self, Verdict};
use crate::run::{CancelToken, RunCoordinator};
use crate::score::Mode;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Markdown report
    #[value(alias = "markdown")]
    Md,
    /// JSON report
    Json,
}

/// Multi-dimensional verification and scoring engine.
///
/// Scores documentation against a quality rubric (docs mode) or a whole
/// codebase against a production-readiness budget (health mode), and
/// reports per-artifact scores, tiers and prioritized recommendations.
#[derive(Parser, Debug)]
#[command(name = "verify")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to verify (file or directory)
    pub root: PathBuf,

    /// Rubric: docs (additive) or health (deductive)
    #[arg(short, long, default_value = "docs")]
    pub mode: Mode,

    /// Minimum acceptable average score (overrides the config file)
    #[arg(long)]
    pub min_score: Option<u32>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "md")]
    pub format: OutputFormat,

    /// Exit non-zero on Critical findings or an average below the minimum
    #[arg(long)]
    pub strict: bool,

    /// Rubric configuration file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Suppress the progress bar and status line
    #[arg(short, long)]
    pub quiet: bool,
}

/// Load, validate and resolve the rubric configuration.
fn load_config(cli: &Cli) -> anyhow::Result<RubricConfig> {
    let path = match &cli.config {
        Some(p) => Some(p.clone()),
        None => config::discover(&cli.root),
    };

    let config = match path {
        Some(path) => {
            debug!("using configuration {}", path.display());
            RubricConfig::parse_file(&path)?
        }
        None => RubricConfig::default(),
    };
    config::validate(&config)?;

    if let Some(min) = cli.min_score {
        if min > 100 {
            anyhow::bail!("--min-score must be between 0 and 100, got {}", min);
        }
    }
    Ok(config)
}

/// Exit code for a finished run.
pub fn exit_code(verdict: &Verdict, strict: bool) -> i32 {
    if strict && !verdict.passed() {
        EXIT_FAILED
    } else {
        EXIT_SUCCESS
    }
}

/// Run a verification and print the report to stdout.
pub fn run_verify(cli: &Cli) -> anyhow::Result<i32> {
    if !cli.root.exists() {
        eprintln!("Error: cannot access path {:?}", cli.root);
        return Ok(EXIT_ERROR);
    }

    let config = match load_config(cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: invalid configuration: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let mut settings = Settings::from_config(&config);
    if let Some(min) = cli.min_score {
        settings.min_score = min;
    }
    let min_score = settings.min_score;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("cannot install Ctrl-C handler: {}", e);
    }

    let coordinator = RunCoordinator::new(&cli.root, cli.mode, settings)
        .exclude(config.exclude_matcher()?)
        .cancel_token(cancel)
        .progress(!cli.quiet && cli.format == OutputFormat::Md);

    let outcome = match coordinator.run() {
        Ok(outcome) => outcome,
        Err(e) if e.is_config() => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
        Err(e) => return Err(e.into()),
    };

    if outcome.scores.is_empty() {
        warn!("no artifacts found under {}", outcome.root.display());
    }

    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    match cli.format {
        OutputFormat::Json => println!("{}", report::render_json(&outcome, min_score, &timestamp)?),
        OutputFormat::Md => print!("{}", report::render_markdown(&outcome, min_score, &timestamp)),
    }

    let verdict = Verdict::evaluate(&outcome.aggregate, min_score);
    if !cli.quiet {
        report::write_status(&outcome.aggregate, &verdict);
    }

    Ok(exit_code(&verdict, cli.strict))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::AggregateReport;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "verify", "docs/", "--mode", "health", "--min-score", "70", "--format", "json",
            "--strict", "--quiet",
        ])
        .unwrap();
        assert_eq!(cli.mode, Mode::Health);
        assert_eq!(cli.min_score, Some(70));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.strict && cli.quiet);

        let cli = Cli::try_parse_from(["verify", "."]).unwrap();
        assert_eq!(cli.mode, Mode::Docs);
        assert_eq!(cli.format, OutputFormat::Md);
        assert!(Cli::try_parse_from(["verify", ".", "--mode", "speed"]).is_err());
    }

    #[test]
    fn test_exit_code() {
        let empty = Verdict::evaluate(&AggregateReport::new(), 60);
        assert_eq!(exit_code(&empty, true), EXIT_SUCCESS);

        let failing = Verdict {
            average: 30.0,
            min_score: 60,
            below_floor: true,
            has_critical: false,
        };
        assert_eq!(exit_code(&failing, false), EXIT_SUCCESS);
        assert_eq!(exit_code(&failing, true), EXIT_FAILED);
    }
}
