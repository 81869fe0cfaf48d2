//! Pipeline orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the pipeline orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Enable/disable the background stage worker.
    /// When disabled, queued stages sit until the worker is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Wait between a stage's dispatch and its successor becoming due
    /// (seconds). The fallback heuristic for "previous stage is likely done"
    /// when the task service reports no status.
    #[serde(default = "default_stage_delay")]
    pub stage_delay_secs: u64,

    /// How often the stage worker polls for due jobs (milliseconds).
    #[serde(default = "default_worker_interval")]
    pub worker_poll_interval_ms: u64,

    /// Maximum due jobs claimed per worker tick.
    #[serde(default = "default_claim_batch")]
    pub claim_batch: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_stage_delay() -> u64 {
    300 // 5 minutes
}

fn default_worker_interval() -> u64 {
    2000 // 2 seconds
}

fn default_claim_batch() -> usize {
    8
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            stage_delay_secs: default_stage_delay(),
            worker_poll_interval_ms: default_worker_interval(),
            claim_batch: default_claim_batch(),
        }
    }
}

impl PipelineConfig {
    /// Stage delay as a chrono duration.
    pub fn stage_delay(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stage_delay_secs as i64)
    }
}
