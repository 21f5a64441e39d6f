//! Shared types for benchsweep.
//!
//! Design goal: explicit and boring. The ledger layout here is the contract
//! between the sweep runner and every benchmark program that appends to it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable the build tool sets to the workspace root.
pub const WORKSPACE_ENV: &str = "BUILD_WORKSPACE_DIRECTORY";

pub const DEFAULT_BENCH_DIR: &str = "bench";
pub const DEFAULT_LEDGER_FILE: &str = "bench_results.csv";
pub const DEFAULT_TARGET_SUFFIX: &str = ":benchmark";
pub const DEFAULT_QUERY_PATTERN: &str = "//...";
pub const DEFAULT_BUILD_TOOL: &str = "bazel";

/// Ledger columns, in file order.
pub const LEDGER_COLUMNS: [&str; 8] = [
    "datetime",
    "bench_set",
    "function_name",
    "test_name",
    "mean",
    "variance",
    "stdev",
    "coef_of_variance",
];

/// The ledger header line, newline-terminated.
pub fn ledger_header() -> String {
    let mut line = LEDGER_COLUMNS.join(",");
    line.push('\n');
    line
}

/// A build target in the build tool's own addressing syntax, e.g. `//core:benchmark`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetLabel(String);

impl TargetLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetLabel {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Timestamp shared by every row written during one sweep (`YYYY-MM-DD HH:MM:SS`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunStamp(String);

impl RunStamp {
    pub fn new(stamp: impl Into<String>) -> Self {
        Self(stamp.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Summary statistics over one benchmark's timing samples (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub mean: f64,

    /// Population variance (divides by N).
    pub variance: f64,

    pub stdev: f64,

    /// `100 * stdev / mean`, in percent.
    pub coef_of_variance: f64,
}

/// One data row of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub datetime: RunStamp,
    pub bench_set: String,
    pub function_name: String,
    pub test_name: String,
    pub summary: SampleSummary,
}

/// How a dispatched target ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStatus {
    /// Process exit code; `-1` when the process was killed by a signal.
    pub exit_code: i32,
    pub wall_ms: u64,
}

impl DispatchStatus {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub target: TargetLabel,
    pub status: DispatchStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_exact() {
        assert_eq!(
            ledger_header(),
            "datetime,bench_set,function_name,test_name,mean,variance,stdev,coef_of_variance\n"
        );
    }

    #[test]
    fn labels_display_verbatim() {
        let label = TargetLabel::from("//core:benchmark");
        assert_eq!(label.to_string(), "//core:benchmark");
        assert_eq!(label.as_str(), "//core:benchmark");
    }

    #[test]
    fn dispatch_status_success_is_exit_zero() {
        let ok = DispatchStatus {
            exit_code: 0,
            wall_ms: 10,
        };
        let failed = DispatchStatus {
            exit_code: 1,
            wall_ms: 10,
        };
        assert!(ok.success());
        assert!(!failed.success());
    }
}
