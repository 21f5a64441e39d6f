//! The benchmark side of the ledger contract.
//!
//! A dispatched benchmark receives `<stamp> <ledger>` as its first two
//! arguments. It measures, summarizes, and appends its own rows.

use anyhow::Context;
use benchsweep_adapters::LedgerFile;
use benchsweep_domain::{order_by_mean_desc, summarize_samples};
use benchsweep_types::{LedgerRow, RunStamp};
use std::path::{Path, PathBuf};

/// Positional arguments a benchmark program was launched with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchArgs {
    pub stamp: Option<RunStamp>,
    pub ledger_file: Option<PathBuf>,
}

impl BenchArgs {
    /// Parse from a full argv (program name first), e.g. `std::env::args()`.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut it = args.into_iter().skip(1).map(Into::into);
        let stamp = it.next().map(RunStamp::new);
        let ledger_file = it.next().map(PathBuf::from);
        Self { stamp, ledger_file }
    }

    /// The ledger to append to, or `None` when results should stay on screen.
    pub fn ledger_in(&self, bench_dir: &Path) -> Option<LedgerFile> {
        self.ledger_file
            .as_ref()
            .map(|file| LedgerFile::new(bench_dir.join(file)))
    }
}

/// Raw timings (seconds) for one function/test pair.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchResult {
    pub function_name: String,
    pub test_name: String,
    pub samples: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct RecordRequest {
    pub bench_set: String,
    pub stamp: RunStamp,
    pub results: Vec<BenchResult>,
}

pub struct RecordUseCase;

impl RecordUseCase {
    /// Summarize every result; most expensive mean first.
    pub fn summarize(req: &RecordRequest) -> anyhow::Result<Vec<LedgerRow>> {
        let mut rows = Vec::with_capacity(req.results.len());
        for result in &req.results {
            let summary = summarize_samples(&result.samples).with_context(|| {
                format!(
                    "summarize {}.{}.{}",
                    req.bench_set, result.function_name, result.test_name
                )
            })?;
            rows.push(LedgerRow {
                datetime: req.stamp.clone(),
                bench_set: req.bench_set.clone(),
                function_name: result.function_name.clone(),
                test_name: result.test_name.clone(),
                summary,
            });
        }
        order_by_mean_desc(&mut rows);
        Ok(rows)
    }

    /// Summarize and append to `ledger`, creating it with its header if absent.
    pub fn execute(ledger: &LedgerFile, req: RecordRequest) -> anyhow::Result<Vec<LedgerRow>> {
        let rows = Self::summarize(&req)?;
        ledger
            .append_rows(&rows)
            .with_context(|| format!("append results to {}", ledger.path().display()))?;
        tracing::info!(
            rows = rows.len(),
            bench_set = %req.bench_set,
            path = %ledger.path().display(),
            "appended results"
        );
        Ok(rows)
    }
}
