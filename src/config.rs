//! Rubric configuration.
//!
//! A configuration file tunes the rubric: which tags are required, the
//! minimum acceptable average, which paths to exclude, and the numeric
//! thresholds the analyzers use. Every option is optional; unknown options
//! are ignored so older engines accept newer files.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::VerifyError;

/// Configuration file names searched for in the scan root.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["verify.yaml", "verify.yml", ".verify.yaml", "verify.json"];

/// Default values for every tunable threshold.
///
/// These reproduce the documented rubric behaviour; none of them is an
/// invariant and all can be overridden from the configuration file.
pub mod defaults {
    pub const MIN_SCORE: u32 = 60;
    pub const STALE_DAYS: u32 = 90;
    pub const PER_SUBSYSTEM_MOCK_CAP: usize = 3;
    pub const GLOBAL_MOCK_CEILING: usize = 10;
    pub const MIN_ARTIFACT_BYTES: u64 = 32;
    pub const WARNING_THRESHOLD: usize = 10;
    pub const LICENSE_HEADER_THRESHOLD: usize = 5;
    pub const PROBE_TIMEOUT_SECS: u64 = 300;
}

/// Top-level rubric configuration as read from disk.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RubricConfig {
    /// Compliance tags every artifact must carry, e.g. `AIR-3`
    #[serde(alias = "required_tags")]
    pub required_tags: Vec<String>,
    /// Minimum acceptable average score under `--strict`
    #[serde(alias = "min_score")]
    pub min_score: Option<u32>,
    /// Glob patterns (relative to the scan root) to skip
    #[serde(alias = "exclude_patterns")]
    pub exclude_patterns: Vec<String>,
    /// Age in days after which a document counts as stale
    #[serde(alias = "stale_days")]
    pub stale_days: Option<u32>,
    /// Mock markers tolerated in a single subsystem directory
    #[serde(alias = "per_subsystem_mock_cap")]
    pub per_subsystem_mock_cap: Option<usize>,
    #[serde(alias = "min_artifact_bytes")]
    pub min_artifact_bytes: Option<u64>,
    #[serde(alias = "global_mock_ceiling")]
    pub global_mock_ceiling: Option<usize>,
    #[serde(alias = "warning_threshold")]
    pub warning_threshold: Option<usize>,
    #[serde(alias = "license_header_threshold")]
    pub license_header_threshold: Option<usize>,
    /// Build command for the compilation probe, e.g. `["cargo", "check"]`
    #[serde(alias = "probe_command")]
    pub probe_command: Option<Vec<String>>,
    #[serde(alias = "probe_timeout_secs")]
    pub probe_timeout_secs: Option<u64>,
}

impl RubricConfig {
    /// Parse a configuration from a YAML (or JSON) file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, VerifyError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| VerifyError::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::parse_str(&content)
            .map_err(|e| VerifyError::Config(format!("parsing {}: {}", path.display(), e)))
    }

    /// Parse a configuration from text. An empty document yields the defaults.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: RubricConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Build a matcher for `exclude_patterns`.
    ///
    /// Uses globset, which supports `**` for recursive directory matching.
    pub fn exclude_matcher(&self) -> anyhow::Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }

    /// Required tags normalized to their bare `XXX-N` form.
    pub fn normalized_required_tags(&self) -> Vec<String> {
        self.required_tags
            .iter()
            .map(|t| t.trim().trim_start_matches('[').trim_end_matches(']').to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Look for a configuration file in the scan root, then in the user's
/// configuration directory.
pub fn discover(root: &Path) -> Option<PathBuf> {
    let dir = if root.is_dir() {
        root.to_path_buf()
    } else {
        root.parent().map(Path::to_path_buf).unwrap_or_default()
    };

    for name in DEFAULT_CONFIG_NAMES {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let user_dir = directories::ProjectDirs::from("", "", "verigate")?;
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| user_dir.config_dir().join(name))
        .find(|p| p.is_file())
}

/// Validate a configuration for correctness.
pub fn validate(config: &RubricConfig) -> Result<(), VerifyError> {
    if let Some(min) = config.min_score {
        if min > 100 {
            return Err(VerifyError::Config(format!(
                "minScore must be between 0 and 100, got {}",
                min
            )));
        }
    }

    if config.stale_days == Some(0) {
        return Err(VerifyError::Config("staleDays must be positive".to_string()));
    }

    if config.per_subsystem_mock_cap == Some(0) {
        return Err(VerifyError::Config(
            "perSubsystemMockCap must be positive".to_string(),
        ));
    }

    for pattern in &config.exclude_patterns {
        Glob::new(pattern).map_err(|e| {
            VerifyError::Config(format!("invalid excludePatterns entry {:?}: {}", pattern, e))
        })?;
    }

    for tag in config.normalized_required_tags() {
        if !crate::analyze::is_tag_shaped(&tag) {
            return Err(VerifyError::Config(format!(
                "invalid requiredTags entry {:?}, expected a form like AIR-3",
                tag
            )));
        }
    }

    if let Some(cmd) = &config.probe_command {
        if cmd.is_empty() || cmd[0].trim().is_empty() {
            return Err(VerifyError::Config("probeCommand must not be empty".to_string()));
        }
    }

    if config.probe_timeout_secs == Some(0) {
        return Err(VerifyError::Config(
            "probeTimeoutSecs must be positive".to_string(),
        ));
    }

    Ok(())
}

/// Fully resolved settings the analyzers read.
#[derive(Debug, Clone)]
pub struct Settings {
    pub required_tags: Vec<String>,
    pub min_score: u32,
    pub stale_days: u32,
    pub per_subsystem_mock_cap: usize,
    pub global_mock_ceiling: usize,
    pub min_artifact_bytes: u64,
    pub warning_threshold: usize,
    pub license_header_threshold: usize,
    pub probe_command: Option<Vec<String>>,
    pub probe_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&RubricConfig::default())
    }
}

impl Settings {
    /// Resolve a configuration against the defaults.
    pub fn from_config(config: &RubricConfig) -> Self {
        Self {
            required_tags: config.normalized_required_tags(),
            min_score: config.min_score.unwrap_or(defaults::MIN_SCORE),
            stale_days: config.stale_days.unwrap_or(defaults::STALE_DAYS),
            per_subsystem_mock_cap: config
                .per_subsystem_mock_cap
                .unwrap_or(defaults::PER_SUBSYSTEM_MOCK_CAP),
            global_mock_ceiling: config
                .global_mock_ceiling
                .unwrap_or(defaults::GLOBAL_MOCK_CEILING),
            min_artifact_bytes: config
                .min_artifact_bytes
                .unwrap_or(defaults::MIN_ARTIFACT_BYTES),
            warning_threshold: config
                .warning_threshold
                .unwrap_or(defaults::WARNING_THRESHOLD),
            license_header_threshold: config
                .license_header_threshold
                .unwrap_or(defaults::LICENSE_HEADER_THRESHOLD),
            probe_command: config.probe_command.clone(),
            probe_timeout_secs: config
                .probe_timeout_secs
                .unwrap_or(defaults::PROBE_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
requiredTags: ["AIR-3", "[BPC-3]"]
minScore: 75
excludePatterns:
  - "archive/**"
staleDays: 30
perSubsystemMockCap: 5
"#;
        let config = RubricConfig::parse_str(yaml).unwrap();
        assert_eq!(config.min_score, Some(75));
        assert_eq!(config.normalized_required_tags(), vec!["AIR-3", "BPC-3"]);
        assert_eq!(config.exclude_patterns.len(), 1);
        assert_eq!(config.per_subsystem_mock_cap, Some(5));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_unknown_options_ignored() {
        let yaml = r#"
minScore: 50
colourScheme: solarized
nested:
  anything: [1, 2, 3]
"#;
        let config = RubricConfig::parse_str(yaml).unwrap();
        assert_eq!(config.min_score, Some(50));
    }

    #[test]
    fn test_snake_case_aliases() {
        let config = RubricConfig::parse_str("stale_days: 10\nper_subsystem_mock_cap: 2\n").unwrap();
        assert_eq!(config.stale_days, Some(10));
        assert_eq!(config.per_subsystem_mock_cap, Some(2));
    }

    #[test]
    fn test_json_config() {
        let config = RubricConfig::parse_str(r#"{"minScore": 90, "staleDays": 7}"#).unwrap();
        assert_eq!(config.min_score, Some(90));
        assert_eq!(config.stale_days, Some(7));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = RubricConfig::parse_str("   \n").unwrap();
        let settings = Settings::from_config(&config);
        assert_eq!(settings.min_score, defaults::MIN_SCORE);
        assert_eq!(settings.per_subsystem_mock_cap, 3);
    }

    #[test]
    fn test_wrong_type_is_error() {
        assert!(RubricConfig::parse_str("minScore: lots\n").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RubricConfig {
            min_score: Some(101),
            ..Default::default()
        };
        assert!(validate(&config).is_err());

        config.min_score = None;
        config.exclude_patterns = vec!["[unclosed".to_string()];
        assert!(validate(&config).is_err());

        config.exclude_patterns.clear();
        config.required_tags = vec!["not a tag".to_string()];
        assert!(validate(&config).is_err());

        config.required_tags.clear();
        config.probe_command = Some(vec![]);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_exclude_matcher() {
        let config = RubricConfig {
            exclude_patterns: vec!["archive/**".to_string(), "**/CHANGELOG.md".to_string()],
            ..Default::default()
        };
        let matcher = config.exclude_matcher().unwrap();
        assert!(matcher.is_match("archive/old/notes.md"));
        assert!(matcher.is_match("docs/CHANGELOG.md"));
        assert!(!matcher.is_match("docs/guide.md"));
    }

    #[test]
    fn test_discover_in_root() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("verify.yaml"), "minScore: 10\n").unwrap();
        let found = discover(temp.path()).unwrap();
        assert!(found.ends_with("verify.yaml"));
    }
}
