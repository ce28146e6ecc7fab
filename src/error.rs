//! Error categories the command line needs to tell apart.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run or change its exit code.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// Malformed or invalid rubric configuration. Always fatal, exit code 2.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The scan root itself cannot be read. Always fatal, exit code 2.
    #[error("cannot access root {path:?}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An individual artifact could not be read.
    #[error("cannot read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The external build invocation did not finish within its bound.
    #[error("{tool} timed out after {secs}s")]
    ProbeTimeout { tool: String, secs: u64 },
}

impl VerifyError {
    /// Whether this error should map to the configuration exit code.
    pub fn is_config(&self) -> bool {
        matches!(self, VerifyError::Config(_) | VerifyError::Root { .. })
    }
}
