//! Domain logic for benchsweep.
//!
//! This crate is intentionally I/O-free: it tokenizes query output, picks
//! benchmark targets, and turns timing samples into ledger rows.

use benchsweep_error::StatsError;
use benchsweep_types::{LedgerRow, SampleSummary, TargetLabel};
use statrs::statistics::Statistics;

/// Split raw query output on ASCII whitespace, decoding each token as UTF-8 (lossily).
///
/// Vertical tab counts as whitespace too, although `u8::is_ascii_whitespace`
/// leaves it out.
pub fn tokenize_query_output(stdout: &[u8]) -> Vec<String> {
    stdout
        .split(|&b| is_separator(b))
        .filter(|tok| !tok.is_empty())
        .map(|tok| String::from_utf8_lossy(tok).into_owned())
        .collect()
}

fn is_separator(b: u8) -> bool {
    b.is_ascii_whitespace() || b == 0x0b
}

/// True if `token` ends with `suffix` and has at least one character before it.
pub fn is_benchmark_target(token: &str, suffix: &str) -> bool {
    token.len() > suffix.len() && token.ends_with(suffix)
}

/// Keep tokens that name benchmark targets.
///
/// Discovery order is preserved and duplicates are kept.
pub fn select_benchmark_targets<I, S>(tokens: I, suffix: &str) -> Vec<TargetLabel>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .filter(|tok| is_benchmark_target(tok.as_ref(), suffix))
        .map(|tok| TargetLabel::new(tok.as_ref()))
        .collect()
}

/// Hard cap on samples taken for one benchmark.
pub const MAX_SAMPLES: usize = 1000;

/// Once the time budget is spent, sampling still continues up to this count.
pub const MIN_SAMPLES_OVER_BUDGET: usize = 50;

/// Total measured seconds after which a benchmark may stop early.
pub const SAMPLE_TIME_BUDGET_SECS: f64 = 1.0;

/// Whether a benchmark that has taken `samples` samples, adding up to
/// `total_secs` of measured time, should stop.
pub fn sampling_done(samples: usize, total_secs: f64) -> bool {
    samples >= MAX_SAMPLES
        || (total_secs >= SAMPLE_TIME_BUDGET_SECS && samples >= MIN_SAMPLES_OVER_BUDGET)
}

/// Summarize timing samples with population statistics.
pub fn summarize_samples(samples: &[f64]) -> Result<SampleSummary, StatsError> {
    if samples.is_empty() {
        return Err(StatsError::NoSamples);
    }
    if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
        return Err(StatsError::NonFinite { index });
    }

    let mean = samples.iter().mean();
    let variance = samples.iter().population_variance();
    let stdev = variance.sqrt();
    let coef_of_variance = if mean == 0.0 {
        0.0
    } else {
        100.0 * stdev / mean
    };

    Ok(SampleSummary {
        mean,
        variance,
        stdev,
        coef_of_variance,
    })
}

/// Most expensive mean first. Ties keep their input order.
pub fn order_by_mean_desc(rows: &mut [LedgerRow]) {
    rows.sort_by(|a, b| b.summary.mean.total_cmp(&a.summary.mean));
}

/// Encode one ledger row as a newline-terminated CSV line.
pub fn encode_row(row: &LedgerRow) -> String {
    let s = &row.summary;
    format!(
        "{},{},{},{},{},{},{},{}\n",
        csv_field(row.datetime.as_str()),
        csv_field(&row.bench_set),
        csv_field(&row.function_name),
        csv_field(&row.test_name),
        s.mean,
        s.variance,
        s.stdev,
        s.coef_of_variance,
    )
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
