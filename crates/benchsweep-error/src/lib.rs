//! Unified error types for benchsweep.
//!
//! Every layer reports failures through one of these enums so the CLI can
//! tell a fatal discovery failure apart from a broken config or ledger.

use std::path::PathBuf;

/// The build-graph query could not produce a target list.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("failed to launch discovery query {argv:?}: {reason}")]
    Launch { argv: Vec<String>, reason: String },

    #[error("discovery query exited with code {exit_code}")]
    QueryFailed { exit_code: i32, stderr: String },
}

impl DiscoveryError {
    /// Captured stderr of the failed query, if the query ran at all.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            DiscoveryError::QueryFailed { stderr, .. } => Some(stderr),
            DiscoveryError::Launch { .. } => None,
        }
    }
}

/// A benchmark target could not be started.
///
/// A target that starts and exits nonzero is not an error; its exit code is
/// reported as data.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to launch target {target}: {reason}")]
    Launch { target: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to create ledger {path}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to append to ledger {path}")]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("workspace root is not set (pass --workspace-root or set {0})")]
    MissingWorkspaceRoot(&'static str),

    #[error("target_suffix must not be empty")]
    EmptySuffix,

    #[error("ledger_file must be relative to the bench directory, got {0}")]
    AbsoluteLedger(PathBuf),

    #[error("failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StatsError {
    #[error("no samples to summarize")]
    NoSamples,

    #[error("sample {index} is not a finite number")]
    NonFinite { index: usize },
}
