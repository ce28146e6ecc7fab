//! License file and per-file SPDX headers.

use std::path::Path;

use super::source::production_sources;
use super::{AnalysisContext, Analyzer, AnalyzerResult, Finding, Severity};

pub const LICENSE_MAX: u32 = 10;

const MISSING_LICENSE_DEDUCTION: u32 = 5;
const HEADER_DEDUCTION_CAP: u32 = 5;

/// Lines from the top of a file searched for the SPDX identifier.
const HEADER_LINES: usize = 10;

const SPDX_MARKER: &str = "SPDX-License-Identifier";

/// Whether the directory holds a `LICENSE*` or `COPYING*` file.
pub fn has_license_file(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries.filter_map(Result::ok).any(|entry| {
        let name = entry.file_name().to_string_lossy().to_uppercase();
        (name.starts_with("LICENSE") || name.starts_with("LICENCE") || name.starts_with("COPYING"))
            && entry.path().is_file()
    })
}

fn has_spdx_header(text: &str) -> bool {
    text.lines().take(HEADER_LINES).any(|l| l.contains(SPDX_MARKER))
}

pub struct LicenseAnalyzer;

impl Analyzer for LicenseAnalyzer {
    fn name(&self) -> &'static str {
        "license"
    }

    fn max_score(&self) -> u32 {
        LICENSE_MAX
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> anyhow::Result<AnalyzerResult> {
        let root = &ctx.run.root;

        let mut findings = Vec::new();
        let mut deduction = 0;

        if !has_license_file(root) {
            findings.push(Finding::new(
                Severity::High,
                "no LICENSE or COPYING file at the repository root",
                "Add a LICENSE file stating the project's license",
            ));
            deduction += MISSING_LICENSE_DEDUCTION;
        }

        let missing: Vec<String> = production_sources(&ctx.run.sources, root)
            .filter(|(artifact, _)| !has_spdx_header(&artifact.content))
            .map(|(artifact, _)| ctx.run.relative(&artifact.path))
            .collect();
        let threshold = ctx.run.settings.license_header_threshold;
        if missing.len() > threshold {
            let excess = missing.len() - threshold;
            findings.push(Finding::new(
                Severity::Low,
                format!(
                    "{} source files lack an {} header (threshold {})",
                    missing.len(),
                    SPDX_MARKER,
                    threshold
                ),
                "Add SPDX-License-Identifier headers to source files",
            ));
            deduction += (excess as u32).min(HEADER_DEDUCTION_CAP);
        }

        Ok(AnalyzerResult::deducted(self.name(), deduction, LICENSE_MAX, findings))
    }
}
