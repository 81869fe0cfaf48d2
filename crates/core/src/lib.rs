pub mod audit;
pub mod config;
pub mod dispatcher;
pub mod metrics;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod testing;

pub use audit::{
    create_audit_system, AuditError, AuditEventEnvelope, AuditFilter, AuditHandle, AuditRecord,
    AuditStore, AuditWriter, PipelineEvent, SqliteAuditStore,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    DispatcherConfig, SanitizedConfig, ServerConfig,
};
pub use dispatcher::{
    DispatchError, ExecutionMode, HttpDispatcher, TaskDispatcher, TaskHandle, TaskRequest,
    TaskState,
};
pub use pipeline::{
    derive_stages, slate_progress, JobStatus, PipelineConfig, PipelineError, PipelineOrchestrator,
    SlateProgress, SqliteStageQueue, Stage, StageJob, StageProgress, StageQueue, StageStatus,
    StartSlateRequest, WorkerStatus,
};
pub use source::{validate_platform_tag, SourceRef, ValidationError};
pub use store::{
    AssetKind, Campaign, CampaignFilter, CampaignMetadata, ContentAngle, Difficulty,
    EnrichmentUpdate, InsightReport, MediaAsset, NewCampaign, NewContentAngle, NewInsightReport,
    NewMediaAsset, NewScheduledPost, PostStatus, ScheduledPost, SlateStats, SlateStore,
    SqliteSlateStore, StageDispatchStatus, StageRecord, StoreError, PLACEHOLDER_TITLE, SLATE_DAYS,
};
