use crate::{AdapterError, CommandSpec, OutputMode, ProcessRunner};
use benchsweep_domain::tokenize_query_output;
use benchsweep_error::{DiscoveryError, DispatchError};
use benchsweep_types::{DispatchStatus, TargetLabel};
use std::path::PathBuf;

/// Upper bound on captured query output. Large monorepos list a lot of targets.
pub const DISCOVERY_OUTPUT_CAP: usize = 256 * 1024 * 1024;

/// Narrow seam over the build graph: enumerate targets, run one.
pub trait BuildTool {
    /// Every target in the workspace, in the order the tool printed them.
    fn list_all_targets(&self) -> Result<Vec<TargetLabel>, DiscoveryError>;

    /// Run `target`, forwarding `args` to the target itself. Streams are
    /// inherited. A nonzero exit is reported in the status, not as an error.
    fn dispatch(
        &self,
        target: &TargetLabel,
        args: &[String],
    ) -> Result<DispatchStatus, DispatchError>;
}

impl<T: BuildTool + ?Sized> BuildTool for &T {
    fn list_all_targets(&self) -> Result<Vec<TargetLabel>, DiscoveryError> {
        (**self).list_all_targets()
    }

    fn dispatch(
        &self,
        target: &TargetLabel,
        args: &[String],
    ) -> Result<DispatchStatus, DispatchError> {
        (**self).dispatch(target, args)
    }
}

/// `bazel query <pattern>` / `bazel run <target> -- <args>`.
#[derive(Debug, Clone)]
pub struct BazelBuildTool<R: ProcessRunner> {
    runner: R,
    program: String,
    workdir: PathBuf,
    query_pattern: String,
}

impl<R: ProcessRunner> BazelBuildTool<R> {
    pub fn new(
        runner: R,
        program: impl Into<String>,
        workdir: impl Into<PathBuf>,
        query_pattern: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            program: program.into(),
            workdir: workdir.into(),
            query_pattern: query_pattern.into(),
        }
    }

    fn query_argv(&self) -> Vec<String> {
        vec![
            self.program.clone(),
            "query".to_string(),
            self.query_pattern.clone(),
        ]
    }

    fn run_argv(&self, target: &TargetLabel, args: &[String]) -> Vec<String> {
        let mut argv = vec![
            self.program.clone(),
            "run".to_string(),
            target.as_str().to_string(),
            "--".to_string(),
        ];
        argv.extend(args.iter().cloned());
        argv
    }
}

impl<R: ProcessRunner> BuildTool for BazelBuildTool<R> {
    fn list_all_targets(&self) -> Result<Vec<TargetLabel>, DiscoveryError> {
        let argv = self.query_argv();
        tracing::debug!(?argv, workdir = %self.workdir.display(), "querying build graph");

        let spec = CommandSpec {
            argv: argv.clone(),
            cwd: Some(self.workdir.clone()),
            env: vec![],
            output: OutputMode::Capture {
                cap_bytes: DISCOVERY_OUTPUT_CAP,
            },
        };

        let run = self
            .runner
            .run(&spec)
            .map_err(|err| DiscoveryError::Launch {
                argv,
                reason: launch_reason(err),
            })?;

        if run.exit_code != 0 {
            return Err(DiscoveryError::QueryFailed {
                exit_code: run.exit_code,
                stderr: String::from_utf8_lossy(&run.stderr).into_owned(),
            });
        }

        let targets: Vec<TargetLabel> = tokenize_query_output(&run.stdout)
            .into_iter()
            .map(TargetLabel::new)
            .collect();
        tracing::debug!(count = targets.len(), wall_ms = run.wall_ms, "query finished");
        Ok(targets)
    }

    fn dispatch(
        &self,
        target: &TargetLabel,
        args: &[String],
    ) -> Result<DispatchStatus, DispatchError> {
        let spec = CommandSpec {
            argv: self.run_argv(target, args),
            cwd: Some(self.workdir.clone()),
            env: vec![],
            output: OutputMode::Inherit,
        };

        let run = self
            .runner
            .run(&spec)
            .map_err(|err| DispatchError::Launch {
                target: target.to_string(),
                reason: launch_reason(err),
            })?;

        Ok(DispatchStatus {
            exit_code: run.exit_code,
            wall_ms: run.wall_ms,
        })
    }
}

fn launch_reason(err: AdapterError) -> String {
    match err {
        AdapterError::Other(inner) => format!("{inner:#}"),
        other => other.to_string(),
    }
}
