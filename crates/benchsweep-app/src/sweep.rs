//! The sweep: bootstrap the ledger, discover, dispatch every benchmark once.

use crate::{Clock, DiscoverUseCase};
use anyhow::Context;
use benchsweep_adapters::{BuildTool, LedgerFile};
use benchsweep_types::{DispatchRecord, DispatchStatus, RunStamp, TargetLabel};

/// Progress callbacks. The CLI uses these to talk to the user.
pub trait SweepObserver {
    fn targets_selected(&mut self, _targets: &[TargetLabel]) {}
    fn dispatch_started(&mut self, _index: usize, _target: &TargetLabel) {}
    fn dispatch_finished(&mut self, _index: usize, _record: &DispatchRecord) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SweepObserver for NoopObserver {}

#[derive(Debug, Clone)]
pub struct SweepRequest {
    pub ledger: LedgerFile,

    /// Ledger name as handed to each benchmark (relative to the bench dir).
    pub ledger_arg: String,

    pub target_suffix: String,
}

#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub stamp: RunStamp,
    pub ledger_created: bool,
    pub targets: Vec<TargetLabel>,

    /// One record per dispatch, in dispatch order.
    pub records: Vec<DispatchRecord>,
}

impl SweepOutcome {
    pub fn failures(&self) -> Vec<&DispatchRecord> {
        self.records
            .iter()
            .filter(|r| !r.status.success())
            .collect()
    }
}

pub struct SweepUseCase<B: BuildTool, C: Clock> {
    tool: B,
    clock: C,
}

impl<B: BuildTool, C: Clock> SweepUseCase<B, C> {
    pub fn new(tool: B, clock: C) -> Self {
        Self { tool, clock }
    }

    /// Run the whole pipeline.
    ///
    /// The ledger is bootstrapped before discovery, so it exists even when
    /// discovery fails. A discovery failure is returned as a
    /// [`benchsweep_error::DiscoveryError`] inside the `anyhow::Error`.
    /// Benchmarks that fail do not stop the sweep.
    pub fn execute(
        &self,
        req: SweepRequest,
        observer: &mut dyn SweepObserver,
    ) -> anyhow::Result<SweepOutcome> {
        let ledger_created = req
            .ledger
            .ensure_header()
            .with_context(|| format!("bootstrap ledger {}", req.ledger.path().display()))?;

        let stamp = self.clock.now_run_stamp();
        tracing::info!(%stamp, "sweep started");

        let targets = DiscoverUseCase::new(&self.tool).execute(&req.target_suffix)?;
        observer.targets_selected(&targets);

        let args = [stamp.to_string(), req.ledger_arg.clone()];
        let mut records = Vec::with_capacity(targets.len());

        for (index, target) in targets.iter().enumerate() {
            observer.dispatch_started(index, target);

            let status = match self.tool.dispatch(target, &args) {
                Ok(status) => status,
                Err(err) => {
                    tracing::warn!(label = %target, error = %err, "benchmark did not start");
                    DispatchStatus {
                        exit_code: -1,
                        wall_ms: 0,
                    }
                }
            };

            if !status.success() {
                tracing::warn!(label = %target, exit_code = status.exit_code, "benchmark failed");
            }

            let record = DispatchRecord {
                target: target.clone(),
                status,
            };
            observer.dispatch_finished(index, &record);
            records.push(record);
        }

        Ok(SweepOutcome {
            stamp,
            ledger_created,
            targets,
            records,
        })
    }
}
