//! Types for the pipeline orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatcher::DispatchError;
use crate::source::ValidationError;
use crate::store::{CampaignMetadata, StoreError};

/// Errors that can occur while starting or advancing a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The start request failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Task submission to the external service failed. The chain halts at
    /// the failing stage; nothing downstream is ever scheduled.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Persistence failure in the store or the stage queue.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Campaign referenced by a job no longer resolves.
    #[error("campaign not found: {0}")]
    CampaignNotFound(String),
}

/// Request to start a slate pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSlateRequest {
    /// Reference artifact to build the slate from.
    pub source_ref: String,
    /// Target platform tag.
    pub platform: String,
    /// Optional campaign metadata.
    #[serde(default)]
    pub metadata: CampaignMetadata,
}

/// Current status of the stage worker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerStatus {
    /// Whether the worker loop is running.
    pub running: bool,
    /// Jobs waiting for their due time.
    pub pending_jobs: i64,
    /// Jobs whose stage was submitted.
    pub dispatched_jobs: i64,
    /// Jobs that halted their chain.
    pub failed_jobs: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::CampaignNotFound("c-404".to_string());
        assert_eq!(err.to_string(), "campaign not found: c-404");

        let err = PipelineError::Validation(ValidationError::EmptyReference);
        assert_eq!(err.to_string(), "validation error: source reference is empty");
    }

    #[test]
    fn test_start_request_metadata_defaults() {
        let request: StartSlateRequest =
            serde_json::from_str(r#"{"source_ref":"ref://track/1","platform":"tiktok"}"#).unwrap();
        assert!(request.metadata.artist_name.is_none());
        assert!(request.metadata.themes.is_empty());
    }

    #[test]
    fn test_worker_status_default() {
        let status = WorkerStatus::default();
        assert!(!status.running);
        assert_eq!(status.pending_jobs, 0);
    }
}
