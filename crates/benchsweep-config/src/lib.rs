//! Configuration for benchsweep.
//!
//! Settings come from three places, highest precedence first: CLI overrides,
//! an optional `benchsweep.toml` at the workspace root, built-in defaults.
//! The workspace root itself comes from the override or from the
//! environment variable the build tool sets.

use benchsweep_error::ConfigError;
use benchsweep_types::{
    DEFAULT_BENCH_DIR, DEFAULT_BUILD_TOOL, DEFAULT_LEDGER_FILE, DEFAULT_QUERY_PATTERN,
    DEFAULT_TARGET_SUFFIX, WORKSPACE_ENV,
};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "benchsweep.toml";

/// On-disk config. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Bench directory, relative to the workspace root.
    pub bench_dir: Option<PathBuf>,

    /// Ledger file name, relative to the bench directory.
    pub ledger_file: Option<PathBuf>,

    pub target_suffix: Option<String>,
    pub query_pattern: Option<String>,
    pub build_tool: Option<String>,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub workspace_root: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub build_tool: Option<String>,
    pub target_suffix: Option<String>,
    pub query_pattern: Option<String>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    pub workspace_root: PathBuf,

    /// `<workspace_root>/<bench_dir>`; every process and file operation is
    /// resolved against this.
    pub bench_dir: PathBuf,

    /// Relative to `bench_dir`. Passed to benchmarks verbatim.
    pub ledger_file: PathBuf,

    pub target_suffix: String,
    pub query_pattern: String,
    pub build_tool: String,
}

impl SweepConfig {
    pub fn ledger_path(&self) -> PathBuf {
        self.bench_dir.join(&self.ledger_file)
    }
}

pub fn parse_config_file(path: &Path, text: &str) -> Result<ConfigFile, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_file(path, &text)
}

/// Resolve using the process environment for the workspace root.
pub fn resolve_from_env(overrides: Overrides) -> Result<SweepConfig, ConfigError> {
    resolve(overrides, std::env::var_os(WORKSPACE_ENV))
}

/// Resolve with an explicit value for the workspace-root environment variable.
pub fn resolve(
    overrides: Overrides,
    env_root: Option<OsString>,
) -> Result<SweepConfig, ConfigError> {
    let workspace_root = overrides
        .workspace_root
        .clone()
        .or_else(|| env_root.filter(|v| !v.is_empty()).map(PathBuf::from))
        .ok_or(ConfigError::MissingWorkspaceRoot(WORKSPACE_ENV))?;

    let file = match &overrides.config_path {
        Some(path) => load_config_file(path)?,
        None => {
            let default_path = workspace_root.join(CONFIG_FILE_NAME);
            if default_path.is_file() {
                tracing::debug!(path = %default_path.display(), "loading config");
                load_config_file(&default_path)?
            } else {
                ConfigFile::default()
            }
        }
    };

    merge(workspace_root, file, overrides)
}

fn merge(
    workspace_root: PathBuf,
    file: ConfigFile,
    overrides: Overrides,
) -> Result<SweepConfig, ConfigError> {
    let bench_dir = workspace_root.join(
        file.bench_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BENCH_DIR)),
    );

    let ledger_file = file
        .ledger_file
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_FILE));
    if ledger_file.is_absolute() {
        return Err(ConfigError::AbsoluteLedger(ledger_file));
    }

    let target_suffix = overrides
        .target_suffix
        .or(file.target_suffix)
        .unwrap_or_else(|| DEFAULT_TARGET_SUFFIX.to_string());
    if target_suffix.is_empty() {
        return Err(ConfigError::EmptySuffix);
    }

    let query_pattern = overrides
        .query_pattern
        .or(file.query_pattern)
        .unwrap_or_else(|| DEFAULT_QUERY_PATTERN.to_string());

    let build_tool = overrides
        .build_tool
        .or(file.build_tool)
        .unwrap_or_else(|| DEFAULT_BUILD_TOOL.to_string());

    Ok(SweepConfig {
        workspace_root,
        bench_dir,
        ledger_file,
        target_suffix,
        query_pattern,
        build_tool,
    })
}
