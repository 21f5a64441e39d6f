//! Fake implementations of the benchsweep adapter seams.
//!
//! `FakeBuildTool` stands in for the build graph; `FakeProcessRunner` stands
//! in for the operating system. Both record what they were asked to do.

use benchsweep_adapters::{
    AdapterError, BuildTool, CommandSpec, LedgerFile, ProcessRunner, RunResult,
};
use benchsweep_error::{DiscoveryError, DispatchError};
use benchsweep_types::{DispatchStatus, LedgerRow, RunStamp, SampleSummary, TargetLabel};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

/// One recorded call to [`BuildTool::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchCall {
    pub target: TargetLabel,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
enum Discovery {
    Targets(Vec<TargetLabel>),
    Fails { exit_code: i32, stderr: String },
}

/// In-memory build graph.
#[derive(Debug)]
pub struct FakeBuildTool {
    discovery: Discovery,
    exit_codes: HashMap<TargetLabel, i32>,
    unlaunchable: HashSet<TargetLabel>,
    ledger: Option<LedgerFile>,
    list_calls: RefCell<usize>,
    calls: RefCell<Vec<DispatchCall>>,
}

impl FakeBuildTool {
    /// A graph whose query prints `labels` in this order.
    pub fn with_targets<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_discovery(Discovery::Targets(
            labels.into_iter().map(TargetLabel::new).collect(),
        ))
    }

    /// A graph whose query exits nonzero.
    pub fn failing_discovery(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::from_discovery(Discovery::Fails {
            exit_code,
            stderr: stderr.into(),
        })
    }

    fn from_discovery(discovery: Discovery) -> Self {
        Self {
            discovery,
            exit_codes: HashMap::new(),
            unlaunchable: HashSet::new(),
            ledger: None,
            list_calls: RefCell::new(0),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Make `target` exit with `code` when dispatched.
    pub fn with_exit_code(mut self, target: &str, code: i32) -> Self {
        self.exit_codes.insert(TargetLabel::from(target), code);
        self
    }

    /// Make `target` fail to launch at all.
    pub fn with_launch_failure(mut self, target: &str) -> Self {
        self.unlaunchable.insert(TargetLabel::from(target));
        self
    }

    /// Behave like a well-behaved benchmark: each successful dispatch appends
    /// one row to `ledger`, using the stamp it was given.
    pub fn appending_to(mut self, ledger: LedgerFile) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.borrow()
    }

    pub fn calls(&self) -> Vec<DispatchCall> {
        self.calls.borrow().clone()
    }

    pub fn dispatched_targets(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|c| c.target.to_string())
            .collect()
    }
}

impl BuildTool for FakeBuildTool {
    fn list_all_targets(&self) -> Result<Vec<TargetLabel>, DiscoveryError> {
        *self.list_calls.borrow_mut() += 1;
        match &self.discovery {
            Discovery::Targets(targets) => Ok(targets.clone()),
            Discovery::Fails { exit_code, stderr } => Err(DiscoveryError::QueryFailed {
                exit_code: *exit_code,
                stderr: stderr.clone(),
            }),
        }
    }

    fn dispatch(
        &self,
        target: &TargetLabel,
        args: &[String],
    ) -> Result<DispatchStatus, DispatchError> {
        self.calls.borrow_mut().push(DispatchCall {
            target: target.clone(),
            args: args.to_vec(),
        });

        if self.unlaunchable.contains(target) {
            return Err(DispatchError::Launch {
                target: target.to_string(),
                reason: "fake launch failure".to_string(),
            });
        }

        let exit_code = self.exit_codes.get(target).copied().unwrap_or(0);
        if exit_code == 0
            && let (Some(ledger), Some(stamp)) = (&self.ledger, args.first())
        {
            ledger
                .append_rows(&[fake_row(target, stamp)])
                .map_err(|err| DispatchError::Launch {
                    target: target.to_string(),
                    reason: err.to_string(),
                })?;
        }

        Ok(DispatchStatus {
            exit_code,
            wall_ms: 1,
        })
    }
}

fn fake_row(target: &TargetLabel, stamp: &str) -> LedgerRow {
    LedgerRow {
        datetime: RunStamp::new(stamp),
        bench_set: target.to_string(),
        function_name: "fake".to_string(),
        test_name: "default".to_string(),
        summary: SampleSummary {
            mean: 1.0,
            variance: 0.0,
            stdev: 0.0,
            coef_of_variance: 0.0,
        },
    }
}

/// Process runner that replays queued results and records every spec.
///
/// When the queue is empty it answers with a successful, silent run.
#[derive(Debug, Default)]
pub struct FakeProcessRunner {
    queued: RefCell<VecDeque<RunResult>>,
    specs: RefCell<Vec<CommandSpec>>,
}

impl FakeProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_result(&self, exit_code: i32, stdout: &str, stderr: &str) {
        self.queued.borrow_mut().push_back(RunResult {
            wall_ms: 1,
            exit_code,
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        });
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.specs.borrow().clone()
    }
}

impl ProcessRunner for FakeProcessRunner {
    fn run(&self, spec: &CommandSpec) -> Result<RunResult, AdapterError> {
        if spec.argv.is_empty() {
            return Err(AdapterError::EmptyArgv);
        }
        self.specs.borrow_mut().push(spec.clone());
        Ok(self.queued.borrow_mut().pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchsweep_adapters::{BazelBuildTool, OutputMode};
    use tempfile::tempdir;

    #[test]
    fn fake_tool_records_dispatches_in_order() {
        let tool = FakeBuildTool::with_targets(["//a:benchmark", "//b:benchmark"])
            .with_exit_code("//b:benchmark", 4);

        let a = tool
            .dispatch(&TargetLabel::from("//a:benchmark"), &["t".to_string()])
            .unwrap();
        let b = tool
            .dispatch(&TargetLabel::from("//b:benchmark"), &["t".to_string()])
            .unwrap();

        assert_eq!(a.exit_code, 0);
        assert_eq!(b.exit_code, 4);
        assert_eq!(
            tool.dispatched_targets(),
            vec!["//a:benchmark", "//b:benchmark"]
        );
    }

    #[test]
    fn failing_discovery_reports_stderr() {
        let tool = FakeBuildTool::failing_discovery(1, "ERROR: boom");
        let err = tool.list_all_targets().unwrap_err();
        assert_eq!(err.stderr(), Some("ERROR: boom"));
        assert_eq!(tool.list_calls(), 1);
    }

    #[test]
    fn appending_tool_writes_stamped_rows() {
        let dir = tempdir().unwrap();
        let ledger = LedgerFile::new(dir.path().join("bench_results.csv"));
        let tool = FakeBuildTool::with_targets(["//a:benchmark"]).appending_to(ledger.clone());

        tool.dispatch(
            &TargetLabel::from("//a:benchmark"),
            &["2024-03-01 12:00:00".to_string(), "bench_results.csv".to_string()],
        )
        .unwrap();

        let text = std::fs::read_to_string(ledger.path()).unwrap();
        assert!(text.contains("2024-03-01 12:00:00,//a:benchmark,fake,default"));
    }

    #[test]
    fn fake_runner_drives_bazel_adapter() {
        let runner = FakeProcessRunner::new();
        runner.push_result(0, "//a:benchmark //b:lib", "");
        let tool = BazelBuildTool::new(&runner, "bazel", "/ws/bench", "//...");

        let targets = tool.list_all_targets().unwrap();
        assert_eq!(targets.len(), 2);

        let specs = runner.specs();
        assert_eq!(specs[0].argv, vec!["bazel", "query", "//..."]);
        assert!(matches!(specs[0].output, OutputMode::Capture { .. }));
    }
}
