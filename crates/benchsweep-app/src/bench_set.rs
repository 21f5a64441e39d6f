//! A benchmark program's harness: time functions, report, append to the ledger.
//!
//! ```no_run
//! use benchsweep_app::{BenchArgs, BenchSet};
//! # fn bench_dir() -> std::path::PathBuf { "bench".into() }
//!
//! let mut set = BenchSet::new("strings", file!(), BenchArgs::from_args(std::env::args()));
//! set.run("concat", "short", || ("a".to_string(), "b"), |(mut a, b)| {
//!     a.push_str(b);
//!     a
//! });
//! set.finish(&mut std::io::stdout(), &bench_dir()).unwrap();
//! ```

use crate::{BenchArgs, BenchResult, RecordRequest, RecordUseCase};
use anyhow::Context;
use benchsweep_domain::{sampling_done, summarize_samples};
use benchsweep_types::SampleSummary;
use std::hint::black_box;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Measures how long one call takes.
pub trait SampleTimer {
    /// Seconds spent inside `f`.
    fn time(&self, f: &mut dyn FnMut()) -> f64;
}

impl<T: SampleTimer + ?Sized> SampleTimer for &T {
    fn time(&self, f: &mut dyn FnMut()) -> f64 {
        (**self).time(f)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct InstantTimer;

impl SampleTimer for InstantTimer {
    fn time(&self, f: &mut dyn FnMut()) -> f64 {
        let start = Instant::now();
        f();
        start.elapsed().as_secs_f64()
    }
}

/// One benchmark set, as run by a single benchmark program.
pub struct BenchSet<T: SampleTimer = InstantTimer> {
    name: String,
    source: String,
    args: BenchArgs,
    timer: T,
    results: Vec<BenchResult>,
}

impl BenchSet<InstantTimer> {
    pub fn new(name: impl Into<String>, source: impl Into<String>, args: BenchArgs) -> Self {
        Self::with_timer(name, source, args, InstantTimer)
    }
}

impl<T: SampleTimer> BenchSet<T> {
    pub fn with_timer(
        name: impl Into<String>,
        source: impl Into<String>,
        args: BenchArgs,
        timer: T,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            args,
            timer,
            results: Vec::new(),
        }
    }

    pub fn results(&self) -> &[BenchResult] {
        &self.results
    }

    /// Time `f` repeatedly until [`sampling_done`] says stop.
    ///
    /// `setup` runs before every call and is not timed; its output is what
    /// `f` receives.
    pub fn run<I, R>(
        &mut self,
        function: &str,
        test: &str,
        mut setup: impl FnMut() -> I,
        mut f: impl FnMut(I) -> R,
    ) {
        let mut samples = Vec::new();
        let mut total = 0.0;

        while !sampling_done(samples.len(), total) {
            let mut input = Some(setup());
            let secs = self.timer.time(&mut || {
                if let Some(input) = input.take() {
                    black_box(f(input));
                }
            });
            samples.push(secs);
            total += secs;
        }

        tracing::debug!(
            set = %self.name,
            function,
            test,
            iterations = samples.len(),
            total_secs = total,
            "benchmark sampled"
        );
        self.results.push(BenchResult {
            function_name: function.to_string(),
            test_name: test.to_string(),
            samples,
        });
    }

    /// Write the report to `out` and, when the program was given a ledger,
    /// append one row per result to `<bench_dir>/<ledger>`.
    ///
    /// `bench_dir` is usually `SweepConfig::bench_dir`; a dispatched benchmark
    /// does not run from the bench directory itself.
    pub fn finish(&self, out: &mut dyn Write, bench_dir: &Path) -> anyhow::Result<()> {
        let lines = self.report_lines()?;
        out.write_all(render_report(&self.name, &self.source, &lines).as_bytes())
            .context("write benchmark report")?;

        if lines.is_empty() {
            return Ok(());
        }

        if let (Some(ledger), Some(stamp)) = (self.args.ledger_in(bench_dir), &self.args.stamp) {
            writeln!(out, "Appending results to file {}", ledger.path().display())
                .context("write benchmark report")?;
            RecordUseCase::execute(
                &ledger,
                RecordRequest {
                    bench_set: self.name.clone(),
                    stamp: stamp.clone(),
                    results: self.results.clone(),
                },
            )?;
        }
        Ok(())
    }

    fn report_lines(&self) -> anyhow::Result<Vec<ReportLine>> {
        let mut lines = Vec::with_capacity(self.results.len());
        for result in &self.results {
            let summary = summarize_samples(&result.samples).with_context(|| {
                format!(
                    "summarize {}.{}.{}",
                    self.name, result.function_name, result.test_name
                )
            })?;
            lines.push(ReportLine {
                function_name: result.function_name.clone(),
                test_name: result.test_name.clone(),
                summary,
                iterations: result.samples.len(),
                total_secs: result.samples.iter().sum(),
            });
        }
        lines.sort_by(|a, b| b.summary.mean.total_cmp(&a.summary.mean));
        Ok(lines)
    }
}

/// One line of the console report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub function_name: String,
    pub test_name: String,
    pub summary: SampleSummary,
    pub iterations: usize,
    pub total_secs: f64,
}

/// The console report for a set, most expensive first.
pub fn render_report(set: &str, source: &str, lines: &[ReportLine]) -> String {
    let mut text = format!("\nRunning benchmarking set {set} in {source}\n");
    if lines.is_empty() {
        text.push_str("No benchmarks ran.\n");
        return text;
    }
    for line in lines {
        text.push_str(&format!(
            "{set}.{}.{} {} s ± {:.2}% ({} iterations, {:.3} s)\n",
            line.function_name,
            line.test_name,
            line.summary.mean,
            line.summary.coef_of_variance,
            line.iterations,
            line.total_secs,
        ));
    }
    text
}
