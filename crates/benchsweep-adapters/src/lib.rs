//! Std adapters for benchsweep.
//!
//! In clean-arch terms: this is where we touch the world.

use anyhow::Context;
use std::path::PathBuf;
use std::time::Instant;

mod build_tool;
mod ledger;

pub use build_tool::{BazelBuildTool, BuildTool, DISCOVERY_OUTPUT_CAP};
pub use ledger::LedgerFile;

/// What to do with the child's stdout/stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Pipe and keep at most `cap_bytes` of each stream.
    Capture { cap_bytes: usize },

    /// Share the parent's streams; nothing is captured.
    Inherit,
}

#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub argv: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub output: OutputMode,
}

#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub wall_ms: u64,
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("command argv must not be empty")]
    EmptyArgv,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub trait ProcessRunner {
    /// Run to completion. Blocks until the child exits; there is no timeout.
    fn run(&self, spec: &CommandSpec) -> Result<RunResult, AdapterError>;
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &T {
    fn run(&self, spec: &CommandSpec) -> Result<RunResult, AdapterError> {
        (**self).run(spec)
    }
}

#[derive(Debug, Default, Clone)]
pub struct StdProcessRunner;

impl ProcessRunner for StdProcessRunner {
    fn run(&self, spec: &CommandSpec) -> Result<RunResult, AdapterError> {
        use std::process::{Command, Stdio};

        if spec.argv.is_empty() {
            return Err(AdapterError::EmptyArgv);
        }

        let start = Instant::now();
        let mut cmd = Command::new(&spec.argv[0]);
        if spec.argv.len() > 1 {
            cmd.args(&spec.argv[1..]);
        }

        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }

        for (k, v) in &spec.env {
            cmd.env(k, v);
        }

        let (exit_code, stdout, stderr) = match spec.output {
            OutputMode::Capture { cap_bytes } => {
                cmd.stdin(Stdio::null());
                let out = cmd
                    .output()
                    .with_context(|| format!("failed to run {:?}", spec.argv))?;
                (
                    exit_code_of(out.status),
                    truncate(out.stdout, cap_bytes),
                    truncate(out.stderr, cap_bytes),
                )
            }
            OutputMode::Inherit => {
                let status = cmd
                    .status()
                    .with_context(|| format!("failed to run {:?}", spec.argv))?;
                (exit_code_of(status), Vec::new(), Vec::new())
            }
        };

        Ok(RunResult {
            wall_ms: start.elapsed().as_millis() as u64,
            exit_code,
            stdout,
            stderr,
        })
    }
}

fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    // Killed by a signal on unix.
    status.code().unwrap_or(-1)
}

fn truncate(mut bytes: Vec<u8>, cap: usize) -> Vec<u8> {
    if bytes.len() > cap {
        bytes.truncate(cap);
    }
    bytes
}
