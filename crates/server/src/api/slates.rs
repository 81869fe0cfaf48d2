//! Slate pipeline API endpoints.
//!
//! The two public pipeline operations: start a slate for a source reference,
//! and read derived progress for a campaign. Plus a campaign listing for
//! operators.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use slateforge_core::{
    slate_progress, Campaign, CampaignFilter, CampaignMetadata, PipelineError, StartSlateRequest,
    StoreError,
};

use crate::state::AppState;

/// Request to start a slate.
#[derive(Debug, Deserialize)]
pub struct CreateSlateRequest {
    /// Reference artifact (streaming URL or internal handle).
    pub source_ref: String,
    /// Target platform tag (e.g. "tiktok").
    pub platform: String,
    /// Optional campaign metadata.
    #[serde(default)]
    pub metadata: CampaignMetadata,
}

/// Response for a started slate.
#[derive(Debug, Serialize)]
pub struct CreateSlateResponse {
    pub campaign_id: String,
}

/// Error payload.
#[derive(Debug, Serialize)]
pub struct SlateErrorResponse {
    pub error: String,
}

/// Query parameters for listing campaigns.
#[derive(Debug, Deserialize)]
pub struct ListSlatesParams {
    pub platform: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Response for campaign listing.
#[derive(Debug, Serialize)]
pub struct ListSlatesResponse {
    pub campaigns: Vec<Campaign>,
}

/// Start a slate pipeline.
///
/// Validates the source reference, creates the campaign, dispatches the
/// enrich stage and schedules the rest of the chain.
pub async fn create_slate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSlateRequest>,
) -> impl IntoResponse {
    let start_request = StartSlateRequest {
        source_ref: request.source_ref,
        platform: request.platform,
        metadata: request.metadata,
    };

    match state.orchestrator().start_slate(start_request).await {
        Ok(campaign_id) => (
            StatusCode::ACCEPTED,
            Json(CreateSlateResponse { campaign_id }),
        )
            .into_response(),
        Err(PipelineError::Validation(e)) => (
            StatusCode::BAD_REQUEST,
            Json(SlateErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
        Err(PipelineError::Dispatch(e)) => (
            StatusCode::BAD_GATEWAY,
            Json(SlateErrorResponse {
                error: format!("task service rejected the pipeline start: {}", e),
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SlateErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Get derived pipeline progress for a campaign.
///
/// Computed purely from persisted entity counts; safe to poll at any
/// frequency.
pub async fn get_slate_status(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<String>,
) -> impl IntoResponse {
    match slate_progress(state.store().as_ref(), &campaign_id) {
        Ok(progress) => (StatusCode::OK, Json(progress)).into_response(),
        Err(StoreError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(SlateErrorResponse {
                error: format!("campaign not found: {}", campaign_id),
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SlateErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Get one campaign without derived progress.
pub async fn get_slate(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<String>,
) -> impl IntoResponse {
    match state.store().get_campaign(&campaign_id) {
        Ok(Some(campaign)) => (StatusCode::OK, Json(campaign)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(SlateErrorResponse {
                error: format!("campaign not found: {}", campaign_id),
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SlateErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// List campaigns, newest first.
pub async fn list_slates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListSlatesParams>,
) -> impl IntoResponse {
    let mut filter = CampaignFilter::new();
    if let Some(platform) = params.platform {
        filter = filter.with_platform(platform);
    }
    if let Some(limit) = params.limit {
        filter = filter.with_limit(limit.clamp(1, 1000));
    }
    if let Some(offset) = params.offset {
        filter = filter.with_offset(offset.max(0));
    }

    match state.store().list_campaigns(&filter) {
        Ok(campaigns) => (StatusCode::OK, Json(ListSlatesResponse { campaigns })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SlateErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Stage worker status.
pub async fn get_worker_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.orchestrator().status().await)
}
