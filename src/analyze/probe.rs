//! External build invocation behind the `CompilationProbe` trait.
//!
//! The probe runs once per health run, before any analyzer starts, and its
//! report is shared read-only through the run context. A probe never fails
//! the run: spawn errors, non-zero exits and timeouts all become a failed
//! report.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{AnalysisContext, Analyzer, AnalyzerResult, Finding, Severity};
use crate::error::VerifyError;

/// Deduction cap for a failed build. Dominates the health budget.
pub const COMPILATION_MAX: u32 = 40;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

lazy_static! {
    /// Compiler warning lines (`warning: ...`, `warning[E0001]: ...`), optionally
    /// prefixed with a `file:line:col: ` location as in short message format
    static ref WARNING_LINE: Regex =
        Regex::new(r"(?m)^(?:\S+:\d+:\d+: )?warning(?:\[[\w-]+\])?:\s").unwrap();
    /// Cargo's trailing "generated N warnings" summary, not a warning itself
    static ref WARNING_SUMMARY: Regex = Regex::new(r"(?m)^warning: .* generated \d+ warnings?").unwrap();
}

/// How the probe ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Passed,
    Failed,
    TimedOut,
    Skipped,
}

/// Result of one build invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub status: ProbeStatus,
    pub tool: String,
    /// Compiler warnings reported by the build
    pub warnings: usize,
    /// Short human-readable detail (error excerpt, skip reason)
    pub detail: String,
}

impl ProbeReport {
    pub fn passed<T: Into<String>>(tool: T, warnings: usize) -> Self {
        Self {
            status: ProbeStatus::Passed,
            tool: tool.into(),
            warnings,
            detail: String::new(),
        }
    }

    pub fn failed<T: Into<String>, D: Into<String>>(tool: T, detail: D) -> Self {
        Self {
            status: ProbeStatus::Failed,
            tool: tool.into(),
            warnings: 0,
            detail: detail.into(),
        }
    }

    pub fn skipped<D: Into<String>>(detail: D) -> Self {
        Self {
            status: ProbeStatus::Skipped,
            tool: String::new(),
            warnings: 0,
            detail: detail.into(),
        }
    }

    /// Whether the build gate failed (including timeouts).
    pub fn is_failure(&self) -> bool {
        matches!(self.status, ProbeStatus::Failed | ProbeStatus::TimedOut)
    }
}

/// Pass/fail build check for a source tree.
pub trait CompilationProbe: Send + Sync {
    /// Human-readable tool name.
    fn name(&self) -> &str;

    /// Build the tree at `root`. Never panics on tool failure.
    fn run(&self, root: &Path) -> ProbeReport;
}

/// Probe that shells out to a build command with a bounded timeout.
pub struct CommandProbe {
    command: Vec<String>,
    timeout: Duration,
}

impl CommandProbe {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    /// Pick a build command from the manifests present in `root`.
    pub fn detect(root: &Path, timeout: Duration) -> Option<Self> {
        let command: &[&str] = if root.join("Cargo.toml").is_file() {
            &["cargo", "check", "--quiet", "--message-format", "short"]
        } else if root.join("go.mod").is_file() {
            &["go", "build", "./..."]
        } else if root.join("tsconfig.json").is_file() {
            &["npx", "--no-install", "tsc", "--noEmit"]
        } else {
            return None;
        };
        Some(Self::new(
            command.iter().map(|s| s.to_string()).collect(),
            timeout,
        ))
    }

    fn tool(&self) -> String {
        self.command.join(" ")
    }
}

impl CompilationProbe for CommandProbe {
    fn name(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or("build")
    }

    fn run(&self, root: &Path) -> ProbeReport {
        let tool = self.tool();
        if self.command.is_empty() {
            return ProbeReport::failed(tool, "empty probe command");
        }

        debug!("running probe: {} in {}", tool, root.display());
        let mut child = match Command::new(&self.command[0])
            .args(&self.command[1..])
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return ProbeReport::failed(tool, format!("{} not found", self.command[0]));
            }
            Err(e) => return ProbeReport::failed(tool, format!("failed to start: {}", e)),
        };

        // A full pipe stalls the child, so drain both while polling.
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let start = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() >= self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        let err = VerifyError::ProbeTimeout {
                            tool: tool.clone(),
                            secs: self.timeout.as_secs(),
                        };
                        warn!("{}", err);
                        return ProbeReport {
                            status: ProbeStatus::TimedOut,
                            tool,
                            warnings: 0,
                            detail: err.to_string(),
                        };
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return ProbeReport::failed(tool, format!("failed to wait: {}", e)),
            }
        };

        let stdout = stdout.and_then(|h| h.join().ok()).unwrap_or_default();
        let stderr = stderr.and_then(|h| h.join().ok()).unwrap_or_default();
        let combined = format!("{}\n{}", stdout, stderr);
        let warnings = count_warnings(&combined);

        info!(
            "probe {} finished in {:.1}s ({})",
            tool,
            start.elapsed().as_secs_f64(),
            status
        );

        if status.success() {
            ProbeReport::passed(tool, warnings)
        } else {
            let mut report = ProbeReport::failed(tool, excerpt(&stderr, &stdout));
            report.warnings = warnings;
            report
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Count compiler warning lines in build output.
pub fn count_warnings(output: &str) -> usize {
    let all = WARNING_LINE.find_iter(output).count();
    let summaries = WARNING_SUMMARY.find_iter(output).count();
    all.saturating_sub(summaries)
}

/// First error-looking line of the build output, for the finding message.
fn excerpt(stderr: &str, stdout: &str) -> String {
    stderr
        .lines()
        .chain(stdout.lines())
        .find(|l| l.trim_start().starts_with("error") || l.contains(": error"))
        .or_else(|| stderr.lines().find(|l| !l.trim().is_empty()))
        .unwrap_or("build failed")
        .trim()
        .to_string()
}

/// Probe returning a fixed report, for tests and dry runs.
pub struct FakeProbe {
    report: ProbeReport,
}

impl FakeProbe {
    pub fn new(report: ProbeReport) -> Self {
        Self { report }
    }

    pub fn passing() -> Self {
        Self::new(ProbeReport::passed("fake", 0))
    }

    pub fn failing() -> Self {
        Self::new(ProbeReport::failed("fake", "error: forced failure"))
    }
}

impl CompilationProbe for FakeProbe {
    fn name(&self) -> &str {
        "fake"
    }

    fn run(&self, _root: &Path) -> ProbeReport {
        self.report.clone()
    }
}

/// Scores the shared probe report as an overriding gate.
pub struct CompilationAnalyzer;

impl Analyzer for CompilationAnalyzer {
    fn name(&self) -> &'static str {
        "compilation"
    }

    fn max_score(&self) -> u32 {
        COMPILATION_MAX
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> anyhow::Result<AnalyzerResult> {
        let probe = &ctx.run.probe;
        let result = match probe.status {
            ProbeStatus::Passed => AnalyzerResult::deducted(self.name(), 0, COMPILATION_MAX, vec![]),
            ProbeStatus::Skipped => AnalyzerResult::deducted(
                self.name(),
                0,
                COMPILATION_MAX,
                vec![Finding::new(
                    Severity::Info,
                    format!("build check skipped: {}", probe.detail),
                    "Add a build manifest or configure probeCommand to enable the build gate",
                )],
            ),
            ProbeStatus::Failed | ProbeStatus::TimedOut => {
                let mut result = AnalyzerResult::deducted(
                    self.name(),
                    COMPILATION_MAX,
                    COMPILATION_MAX,
                    vec![Finding::new(
                        Severity::Critical,
                        format!("build failed ({}): {}", probe.tool, probe.detail),
                        "Fix compilation errors before anything else; the build gate overrides all other scores",
                    )],
                );
                result.gate_failed = true;
                result
            }
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_warnings() {
        let output = r#"
warning: unused variable: `x`
 --> src/lib.rs:3:9
warning[E0170]: pattern binding named like a variant
error: could not compile
warning: `demo` (lib) generated 2 warnings
"#;
        assert_eq!(count_warnings(output), 2);
        assert_eq!(count_warnings("all clean\n"), 0);
    }

    #[test]
    fn test_count_warnings_short_format() {
        let output = "src/main.rs:1:17: warning: unused variable: `a`\n\
                      src/main.rs:1:25: warning: unused variable: `b`\n\
                      warning: `demo` (bin \"demo\") generated 2 warnings\n";
        assert_eq!(count_warnings(output), 2);
        assert_eq!(
            count_warnings("src/lib.rs:4:5: warning[unused_imports]: unused import\n"),
            1
        );
    }

    #[test]
    fn test_excerpt_short_format_error() {
        let stderr = "src/main.rs:2:5: error[E0425]: cannot find value `y` in this scope\n";
        assert!(excerpt(stderr, "").contains("E0425"));
    }

    #[test]
    fn test_excerpt_prefers_error_line() {
        let stderr = "   Compiling demo\nerror[E0425]: cannot find value `y`\n";
        assert_eq!(excerpt(stderr, ""), "error[E0425]: cannot find value `y`");
        assert_eq!(excerpt("", ""), "build failed");
    }

    #[test]
    fn test_detect_without_manifest() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(CommandProbe::detect(temp.path(), Duration::from_secs(1)).is_none());
        std::fs::write(temp.path().join("go.mod"), "module demo\n").unwrap();
        let probe = CommandProbe::detect(temp.path(), Duration::from_secs(1)).unwrap();
        assert_eq!(probe.name(), "go");
    }

    #[test]
    fn test_missing_tool_is_failure_not_panic() {
        let temp = tempfile::TempDir::new().unwrap();
        let probe = CommandProbe::new(
            vec!["definitely-not-a-real-build-tool-xyz".to_string()],
            Duration::from_secs(5),
        );
        let report = probe.run(temp.path());
        assert_eq!(report.status, ProbeStatus::Failed);
        assert!(report.is_failure());
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_is_failure() {
        let temp = tempfile::TempDir::new().unwrap();
        let probe = CommandProbe::new(
            vec!["sleep".to_string(), "5".to_string()],
            Duration::from_millis(200),
        );
        let report = probe.run(temp.path());
        assert_eq!(report.status, ProbeStatus::TimedOut);
        assert!(report.is_failure());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_failure() {
        let temp = tempfile::TempDir::new().unwrap();
        let probe = CommandProbe::new(vec!["false".to_string()], Duration::from_secs(5));
        assert_eq!(probe.run(temp.path()).status, ProbeStatus::Failed);

        let probe = CommandProbe::new(vec!["true".to_string()], Duration::from_secs(5));
        assert_eq!(probe.run(temp.path()).status, ProbeStatus::Passed);
    }
}
