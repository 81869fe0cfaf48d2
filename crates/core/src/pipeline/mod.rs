//! Slate pipeline orchestration.
//!
//! Five fixed stages, each delegated to the external task service:
//! enrich → mine-angles → plan-schedule → assemble-assets → analyze-report.
//! Continuations are durable queue jobs claimed by a background worker;
//! progress is derived on demand from persisted entity counts.

mod config;
mod progress;
pub mod prompts;
mod runner;
mod schedule;
mod stage;
mod types;

pub use config::PipelineConfig;
pub use progress::{derive_stages, slate_progress, SlateProgress, StageProgress, StageStatus};
pub use runner::PipelineOrchestrator;
pub use schedule::{JobStatus, SqliteStageQueue, StageJob, StageQueue};
pub use stage::Stage;
pub use types::{PipelineError, StartSlateRequest, WorkerStatus};
