//! Cross-crate tests: resolved configuration flowing through the real bazel
//! adapter (over a fake process runner) and the benchmark-side recorder.

use benchsweep_adapters::{BazelBuildTool, LedgerFile, OutputMode};
use benchsweep_app::{
    BenchArgs, BenchResult, FixedClock, NoopObserver, RecordRequest, RecordUseCase,
    SweepRequest, SweepUseCase,
};
use benchsweep_config::{Overrides, SweepConfig, resolve};
use benchsweep_error::DiscoveryError;
use benchsweep_fake::FakeProcessRunner;
use benchsweep_types::{RunStamp, ledger_header};
use std::fs;
use tempfile::TempDir;

const STAMP: &str = "2024-03-01 12:00:00";

fn workspace(config: Option<&str>) -> (TempDir, SweepConfig) {
    let dir = tempfile::tempdir().expect("temp dir");
    if let Some(text) = config {
        fs::write(dir.path().join("benchsweep.toml"), text).expect("write config");
    }
    let cfg = resolve(Overrides::default(), Some(dir.path().as_os_str().to_owned()))
        .expect("config should resolve");
    fs::create_dir_all(&cfg.bench_dir).expect("bench dir");
    (dir, cfg)
}

fn request(cfg: &SweepConfig) -> SweepRequest {
    SweepRequest {
        ledger: LedgerFile::new(cfg.ledger_path()),
        ledger_arg: cfg.ledger_file.display().to_string(),
        target_suffix: cfg.target_suffix.clone(),
    }
}

#[test]
fn sweep_issues_query_then_runs_from_bench_dir() {
    let (_dir, cfg) = workspace(None);
    let runner = FakeProcessRunner::new();
    runner.push_result(0, "//a:benchmark\n//a:lib\n//b:benchmark\n", "");

    let tool = BazelBuildTool::new(&runner, &cfg.build_tool, &cfg.bench_dir, &cfg.query_pattern);
    let outcome = SweepUseCase::new(&tool, FixedClock(RunStamp::new(STAMP)))
        .execute(request(&cfg), &mut NoopObserver)
        .expect("sweep should succeed");

    assert!(outcome.ledger_created);
    assert_eq!(outcome.records.len(), 2);

    let specs = runner.specs();
    assert_eq!(specs.len(), 3);
    assert_eq!(specs[0].argv, vec!["bazel", "query", "//..."]);
    assert!(matches!(specs[0].output, OutputMode::Capture { .. }));
    assert_eq!(
        specs[1].argv,
        vec!["bazel", "run", "//a:benchmark", "--", STAMP, "bench_results.csv"]
    );
    assert_eq!(specs[2].argv[2], "//b:benchmark");
    for spec in &specs {
        assert_eq!(spec.cwd.as_deref(), Some(cfg.bench_dir.as_path()));
    }
    for spec in &specs[1..] {
        assert!(matches!(spec.output, OutputMode::Inherit));
    }
}

#[test]
fn config_file_drives_pattern_suffix_and_ledger() {
    let (_dir, cfg) = workspace(Some(
        "bench_dir = \"perf\"\nledger_file = \"perf.csv\"\ntarget_suffix = \":perf\"\nquery_pattern = \"//perf/...\"\n",
    ));
    assert!(cfg.bench_dir.ends_with("perf"));

    let runner = FakeProcessRunner::new();
    runner.push_result(0, "//perf:perf //perf:benchmark\n", "");
    let tool = BazelBuildTool::new(&runner, &cfg.build_tool, &cfg.bench_dir, &cfg.query_pattern);

    SweepUseCase::new(&tool, FixedClock(RunStamp::new(STAMP)))
        .execute(request(&cfg), &mut NoopObserver)
        .expect("sweep should succeed");

    let specs = runner.specs();
    assert_eq!(specs[0].argv, vec!["bazel", "query", "//perf/..."]);
    assert_eq!(specs.len(), 2);
    assert_eq!(
        specs[1].argv,
        vec!["bazel", "run", "//perf:perf", "--", STAMP, "perf.csv"]
    );
    assert_eq!(
        fs::read_to_string(cfg.bench_dir.join("perf.csv")).unwrap(),
        ledger_header()
    );
}

#[test]
fn failed_query_surfaces_stderr_after_bootstrap() {
    let (_dir, cfg) = workspace(None);
    let runner = FakeProcessRunner::new();
    runner.push_result(7, "", "ERROR: no such package 'broken'\n");
    let tool = BazelBuildTool::new(&runner, &cfg.build_tool, &cfg.bench_dir, &cfg.query_pattern);

    let err = SweepUseCase::new(&tool, FixedClock(RunStamp::new(STAMP)))
        .execute(request(&cfg), &mut NoopObserver)
        .unwrap_err();

    let discovery = err.downcast_ref::<DiscoveryError>().expect("discovery error");
    assert_eq!(discovery.stderr(), Some("ERROR: no such package 'broken'\n"));
    assert_eq!(runner.specs().len(), 1);
    assert_eq!(fs::read_to_string(cfg.ledger_path()).unwrap(), ledger_header());
}

#[test]
fn benchmark_records_into_the_ledger_a_sweep_created() {
    let (_dir, cfg) = workspace(None);
    let runner = FakeProcessRunner::new();
    runner.push_result(0, "//strings:benchmark\n", "");
    let tool = BazelBuildTool::new(&runner, &cfg.build_tool, &cfg.bench_dir, &cfg.query_pattern);

    SweepUseCase::new(&tool, FixedClock(RunStamp::new(STAMP)))
        .execute(request(&cfg), &mut NoopObserver)
        .expect("sweep should succeed");

    // Play the dispatched benchmark: it sees the forwarded arguments.
    let forwarded = runner.specs()[1].argv[4..].to_vec();
    let args = BenchArgs::from_args(std::iter::once("strings_bench".to_string()).chain(forwarded));
    assert_eq!(args.stamp, Some(RunStamp::new(STAMP)));
    let ledger = args.ledger_in(&cfg.bench_dir).expect("ledger argument");

    RecordUseCase::execute(
        &ledger,
        RecordRequest {
            bench_set: "strings".to_string(),
            stamp: args.stamp.clone().unwrap_or_else(|| RunStamp::new(STAMP)),
            results: vec![
                BenchResult {
                    function_name: "concat".to_string(),
                    test_name: "short".to_string(),
                    samples: vec![1.0, 1.0],
                },
                BenchResult {
                    function_name: "concat".to_string(),
                    test_name: "long".to_string(),
                    samples: vec![4.0, 6.0],
                },
            ],
        },
    )
    .expect("record should succeed");

    assert_eq!(
        fs::read_to_string(cfg.ledger_path()).unwrap(),
        format!(
            "{}{STAMP},strings,concat,long,5,1,1,20\n{STAMP},strings,concat,short,1,0,0,0\n",
            ledger_header()
        )
    );
}
