use benchsweep_adapters::{BazelBuildTool, BuildTool, LedgerFile, StdProcessRunner};
use benchsweep_app::{
    BenchResult, Clock, DiscoverUseCase, LocalClock, RecordRequest, RecordUseCase, SweepObserver,
    SweepRequest, SweepUseCase,
};
use benchsweep_config::{Overrides, SweepConfig, resolve_from_env};
use benchsweep_error::DiscoveryError;
use benchsweep_types::{DispatchRecord, RunStamp, TargetLabel};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "benchsweep",
    version,
    about = "Run every benchmark target in a Bazel workspace and collect results in a CSV ledger"
)]
struct Cli {
    /// Workspace root (defaults to $BUILD_WORKSPACE_DIRECTORY)
    #[arg(long, global = true)]
    workspace_root: Option<PathBuf>,

    /// Config file (defaults to <workspace_root>/benchsweep.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Build tool executable
    #[arg(long, global = true)]
    build_tool: Option<String>,

    /// Target name suffix that marks a benchmark
    #[arg(long, global = true)]
    target_suffix: Option<String>,

    /// Query pattern listing every target
    #[arg(long, global = true)]
    query_pattern: Option<String>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Discover and run every benchmark target, one at a time.
    Run {
        /// Exit nonzero if discovery failed, or if any benchmark exited
        /// nonzero or failed to start.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Print the benchmark targets a run would dispatch, without running them.
    List {
        /// Exit nonzero if discovery failed.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Append one result row to the ledger from raw timing samples (seconds).
    Record {
        /// Benchmark set name
        #[arg(long = "set")]
        bench_set: String,

        /// Benchmarked function name
        #[arg(long = "function")]
        function_name: String,

        /// Test case name
        #[arg(long = "test")]
        test_name: String,

        /// Run stamp (YYYY-MM-DD HH:MM:SS); defaults to now
        #[arg(long)]
        stamp: Option<String>,

        /// Ledger file relative to the bench directory; defaults to the configured one
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Timing samples in seconds, after `--`
        #[arg(last = true, required = true)]
        samples: Vec<f64>,
    },
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = resolve_from_env(Overrides {
        workspace_root: cli.workspace_root,
        config_path: cli.config,
        build_tool: cli.build_tool,
        target_suffix: cli.target_suffix,
        query_pattern: cli.query_pattern,
    })?;
    tracing::debug!(?cfg, "resolved config");

    match cli.cmd {
        Command::Run { strict } => cmd_run(&cfg, strict),
        Command::List { strict } => cmd_list(&cfg, strict),
        Command::Record {
            bench_set,
            function_name,
            test_name,
            stamp,
            ledger,
            samples,
        } => {
            let stamp = stamp
                .map(RunStamp::new)
                .unwrap_or_else(|| LocalClock.now_run_stamp());
            let ledger_file = ledger.unwrap_or_else(|| cfg.ledger_file.clone());
            let ledger = LedgerFile::new(cfg.bench_dir.join(ledger_file));

            RecordUseCase::execute(
                &ledger,
                RecordRequest {
                    bench_set,
                    stamp,
                    results: vec![BenchResult {
                        function_name,
                        test_name,
                        samples,
                    }],
                },
            )?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_tool(cfg: &SweepConfig) -> impl BuildTool {
    BazelBuildTool::new(
        StdProcessRunner,
        cfg.build_tool.clone(),
        cfg.bench_dir.clone(),
        cfg.query_pattern.clone(),
    )
}

fn cmd_run(cfg: &SweepConfig, strict: bool) -> anyhow::Result<ExitCode> {
    let usecase = SweepUseCase::new(build_tool(cfg), LocalClock);
    let mut console = Console::new();

    let result = usecase.execute(
        SweepRequest {
            ledger: LedgerFile::new(cfg.ledger_path()),
            ledger_arg: cfg.ledger_file.to_string_lossy().into_owned(),
            target_suffix: cfg.target_suffix.clone(),
        },
        &mut console,
    );

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => return report_discovery_failure(err, strict),
    };

    let failures = outcome.failures();
    if !failures.is_empty() {
        let names: Vec<String> = failures.iter().map(|r| r.target.to_string()).collect();
        tracing::warn!(count = failures.len(), targets = ?names, "some benchmarks failed");
        if strict {
            anyhow::bail!("benchmark targets failed: {}", names.join(", "));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_list(cfg: &SweepConfig, strict: bool) -> anyhow::Result<ExitCode> {
    let targets = match DiscoverUseCase::new(build_tool(cfg)).execute(&cfg.target_suffix) {
        Ok(targets) => targets,
        Err(err) => return report_discovery_failure(err.into(), strict),
    };
    for target in targets {
        println!("{target}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Discovery failures get the tool's own stderr echoed back verbatim.
///
/// The run stops there but still exits successfully unless `strict` is set.
fn report_discovery_failure(err: anyhow::Error, strict: bool) -> anyhow::Result<ExitCode> {
    if let Some(discovery) = err.downcast_ref::<DiscoveryError>() {
        println!("Error encountered!");
        match discovery.stderr() {
            Some(stderr) => print!("{stderr}"),
            None => println!("{discovery}"),
        }
        tracing::warn!(error = %discovery, "discovery failed, nothing dispatched");
        return Ok(if strict {
            ExitCode::from(1)
        } else {
            ExitCode::SUCCESS
        });
    }
    Err(err)
}

/// Writes sweep progress for humans.
struct Console {
    color: bool,
}

impl Console {
    fn new() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }
}

impl SweepObserver for Console {
    fn targets_selected(&mut self, targets: &[TargetLabel]) {
        let line = format!("Found {} benchmark targets to run.", targets.len());
        if self.color {
            println!("\x1b[1;31m{line}\x1b[0m");
        } else {
            println!("{line}");
        }
    }

    fn dispatch_started(&mut self, index: usize, target: &TargetLabel) {
        tracing::info!(index, label = %target, "dispatching");
    }

    fn dispatch_finished(&mut self, _index: usize, record: &DispatchRecord) {
        tracing::debug!(
            label = %record.target,
            exit_code = record.status.exit_code,
            wall_ms = record.status.wall_ms,
            "finished"
        );
    }
}
