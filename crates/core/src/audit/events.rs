//! Pipeline audit events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::Stage;

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    /// A slate pipeline was started for a campaign.
    SlateStarted {
        campaign_id: String,
        source_ref: String,
        platform: String,
    },

    /// A stage's task was submitted to the external service.
    StageDispatched {
        campaign_id: String,
        stage: Stage,
        task_id: String,
        duration_ms: u64,
    },

    /// A stage's task submission failed; the chain halts here.
    StageDispatchFailed {
        campaign_id: String,
        stage: Stage,
        error: String,
    },

    /// A due stage was pushed back because the previous stage's task still
    /// reported as running.
    StageDeferred {
        campaign_id: String,
        stage: Stage,
        task_id: String,
        until: DateTime<Utc>,
    },
}

impl PipelineEvent {
    /// Stable event type string, used as the storage discriminator.
    pub fn event_type(&self) -> &'static str {
        match self {
            PipelineEvent::ServiceStarted { .. } => "service_started",
            PipelineEvent::ServiceStopped { .. } => "service_stopped",
            PipelineEvent::SlateStarted { .. } => "slate_started",
            PipelineEvent::StageDispatched { .. } => "stage_dispatched",
            PipelineEvent::StageDispatchFailed { .. } => "stage_dispatch_failed",
            PipelineEvent::StageDeferred { .. } => "stage_deferred",
        }
    }

    /// Campaign the event belongs to, if any.
    pub fn campaign_id(&self) -> Option<&str> {
        match self {
            PipelineEvent::ServiceStarted { .. } | PipelineEvent::ServiceStopped { .. } => None,
            PipelineEvent::SlateStarted { campaign_id, .. }
            | PipelineEvent::StageDispatched { campaign_id, .. }
            | PipelineEvent::StageDispatchFailed { campaign_id, .. }
            | PipelineEvent::StageDeferred { campaign_id, .. } => Some(campaign_id),
        }
    }
}
