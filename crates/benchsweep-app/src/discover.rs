use benchsweep_adapters::BuildTool;
use benchsweep_domain::select_benchmark_targets;
use benchsweep_error::DiscoveryError;
use benchsweep_types::TargetLabel;

/// Query the build graph and keep the benchmark targets.
pub struct DiscoverUseCase<B: BuildTool> {
    tool: B,
}

impl<B: BuildTool> DiscoverUseCase<B> {
    pub fn new(tool: B) -> Self {
        Self { tool }
    }

    /// Selected targets in discovery order, duplicates included.
    pub fn execute(&self, target_suffix: &str) -> Result<Vec<TargetLabel>, DiscoveryError> {
        let all = self.tool.list_all_targets()?;
        let selected = select_benchmark_targets(all.iter().map(TargetLabel::as_str), target_suffix);
        tracing::info!(
            discovered = all.len(),
            selected = selected.len(),
            suffix = target_suffix,
            "filtered build targets"
        );
        Ok(selected)
    }
}
