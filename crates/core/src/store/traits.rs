//! Slate storage trait and request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::pipeline::Stage;

use super::types::{
    AssetKind, Campaign, CampaignMetadata, ContentAngle, Difficulty, InsightReport, MediaAsset,
    PostStatus, ScheduledPost, SlateStats, StageRecord,
};

/// Error type for persistence operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A child entity referenced a parent that does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A value violates a data-model invariant.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn campaign_not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: "campaign",
            id: id.into(),
        }
    }
}

/// Request to create a new campaign.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub source_ref: String,
    pub platform: String,
    pub metadata: CampaignMetadata,
}

/// Enrichment output applied to a campaign by the enrich stage's executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentUpdate {
    pub title: String,
    #[serde(default)]
    pub contributors: Vec<String>,
    #[serde(default)]
    pub palette: Vec<String>,
}

/// Request to insert one content angle.
#[derive(Debug, Clone)]
pub struct NewContentAngle {
    pub campaign_id: String,
    pub hook: String,
    pub alt_hooks: Vec<String>,
    pub score: u8,
    pub difficulty: Difficulty,
    pub duration_hint_secs: Option<u16>,
    pub trend_ref: Option<String>,
}

/// Request to insert one scheduled post.
#[derive(Debug, Clone)]
pub struct NewScheduledPost {
    pub campaign_id: String,
    pub angle_id: Option<String>,
    pub day: u8,
    pub script: String,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub call_to_action: String,
}

/// Request to insert one media asset.
#[derive(Debug, Clone)]
pub struct NewMediaAsset {
    pub post_id: String,
    pub kind: AssetKind,
    pub variant: String,
    pub storage_ref: String,
    pub generation_params: Value,
    pub metadata: Value,
}

/// Request to insert one insight report.
#[derive(Debug, Clone)]
pub struct NewInsightReport {
    pub campaign_id: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub breakdowns: Value,
    pub recommendations: Vec<String>,
    pub summary: String,
}

/// Filter for querying campaigns.
#[derive(Debug, Clone)]
pub struct CampaignFilter {
    /// Filter by platform tag.
    pub platform: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl CampaignFilter {
    pub fn new() -> Self {
        Self {
            platform: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

impl Default for CampaignFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for slate storage backends.
///
/// Pure CRUD plus counting. The pipeline never deletes anything.
pub trait SlateStore: Send + Sync {
    // Campaigns

    /// Create a campaign with the placeholder title.
    fn create_campaign(&self, request: NewCampaign) -> Result<Campaign, StoreError>;

    /// Get a campaign by id.
    fn get_campaign(&self, id: &str) -> Result<Option<Campaign>, StoreError>;

    /// List campaigns matching the filter, newest first.
    fn list_campaigns(&self, filter: &CampaignFilter) -> Result<Vec<Campaign>, StoreError>;

    /// Apply enrichment output (title, contributors, palette).
    fn apply_enrichment(
        &self,
        id: &str,
        update: EnrichmentUpdate,
    ) -> Result<Campaign, StoreError>;

    /// Record the dispatch outcome for one stage.
    fn record_stage(
        &self,
        id: &str,
        stage: Stage,
        record: StageRecord,
    ) -> Result<Campaign, StoreError>;

    // Content angles

    fn insert_angle(&self, request: NewContentAngle) -> Result<ContentAngle, StoreError>;
    fn list_angles(&self, campaign_id: &str) -> Result<Vec<ContentAngle>, StoreError>;

    // Scheduled posts

    fn insert_post(&self, request: NewScheduledPost) -> Result<ScheduledPost, StoreError>;
    fn list_posts(&self, campaign_id: &str) -> Result<Vec<ScheduledPost>, StoreError>;
    fn update_post_status(
        &self,
        post_id: &str,
        status: PostStatus,
    ) -> Result<ScheduledPost, StoreError>;

    // Media assets

    fn insert_asset(&self, request: NewMediaAsset) -> Result<MediaAsset, StoreError>;
    fn list_assets(&self, post_id: &str) -> Result<Vec<MediaAsset>, StoreError>;

    // Insight reports

    fn insert_report(&self, request: NewInsightReport) -> Result<InsightReport, StoreError>;
    fn list_reports(&self, campaign_id: &str) -> Result<Vec<InsightReport>, StoreError>;

    // Counts

    /// Downstream entity counts for one campaign.
    fn stats(&self, campaign_id: &str) -> Result<SlateStats, StoreError>;
}
