//! Domain entity types for the slate store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::Stage;

/// Display title a campaign carries until enrichment replaces it.
pub const PLACEHOLDER_TITLE: &str = "Untitled";

/// Length of the posting horizon in days. Scheduled posts must fall on day
/// 1..=SLATE_DAYS.
pub const SLATE_DAYS: u8 = 7;

// ============================================================================
// Campaign
// ============================================================================

/// Root entity: one source reference being turned into a content slate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    pub id: String,
    /// The reference artifact this campaign was started from.
    pub source_ref: String,
    /// Target platform tag supplied by the caller (e.g. "tiktok").
    pub platform: String,
    /// Display title; [`PLACEHOLDER_TITLE`] until enrichment completes.
    pub title: String,
    /// Credited contributors, filled in by enrichment.
    #[serde(default)]
    pub contributors: Vec<String>,
    /// Visual palette derived from the release artwork (hex colors).
    #[serde(default)]
    pub palette: Vec<String>,
    /// Caller-supplied campaign metadata.
    #[serde(default)]
    pub metadata: CampaignMetadata,
    /// Authoritative per-stage dispatch record, keyed by stage.
    #[serde(default)]
    pub stage_states: BTreeMap<Stage, StageRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Task handle recorded for a stage, if it was dispatched.
    pub fn task_id_for(&self, stage: Stage) -> Option<&str> {
        self.stage_states
            .get(&stage)
            .and_then(|record| record.task_id.as_deref())
    }

    /// Whether the given stage has been successfully dispatched.
    pub fn is_dispatched(&self, stage: Stage) -> bool {
        matches!(
            self.stage_states.get(&stage),
            Some(StageRecord {
                status: StageDispatchStatus::Dispatched,
                ..
            })
        )
    }
}

/// Free-form campaign metadata accepted at pipeline start.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CampaignMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priority_regions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub themes: Vec<String>,
    /// Anything else the caller sent along.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Outcome of a stage dispatch, persisted on the campaign for operator
/// visibility and crash recovery. The derived progress view in
/// `pipeline::progress` is computed from entity counts instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageRecord {
    pub status: StageDispatchStatus,
    /// Handle returned by the task service, when submission succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Submission error, when it failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

impl StageRecord {
    pub fn dispatched(task_id: impl Into<String>) -> Self {
        Self {
            status: StageDispatchStatus::Dispatched,
            task_id: Some(task_id.into()),
            error: None,
            at: Utc::now(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: StageDispatchStatus::Failed,
            task_id: None,
            error: Some(error.into()),
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageDispatchStatus {
    Dispatched,
    Failed,
}

// ============================================================================
// Content angles
// ============================================================================

/// A generated content strategy: a hook plus alternates, scored for
/// suitability. Created in bulk by the mine-angles stage, immutable after.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentAngle {
    pub id: String,
    pub campaign_id: String,
    /// Primary hook text.
    pub hook: String,
    /// Alternative hooks, strongest first.
    #[serde(default)]
    pub alt_hooks: Vec<String>,
    /// Suitability score, 0-100.
    pub score: u8,
    pub difficulty: Difficulty,
    /// Suggested clip length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_hint_secs: Option<u16>,
    /// Trend this angle rides on, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Production difficulty of a content angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Hard => "hard",
        }
    }
}

// ============================================================================
// Scheduled posts
// ============================================================================

/// One planned content piece on the slate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledPost {
    pub id: String,
    pub campaign_id: String,
    /// Angle this post was derived from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle_id: Option<String>,
    /// Day on the slate, 1..=[`SLATE_DAYS`].
    pub day: u8,
    pub script: String,
    pub caption: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub call_to_action: String,
    pub status: PostStatus,
    /// Performance snapshot written back by outside collaborators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a scheduled post. The pipeline only ever moves posts from
/// `ready` to `drafted`; `published` and `archived` belong to collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Ready,
    Drafted,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Ready => "ready",
            PostStatus::Drafted => "drafted",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

// ============================================================================
// Media assets
// ============================================================================

/// A produced media artifact tied to a scheduled post. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaAsset {
    pub id: String,
    pub post_id: String,
    pub kind: AssetKind,
    /// Variant label (e.g. "thumb-a").
    pub variant: String,
    /// Where the rendered artifact lives.
    pub storage_ref: String,
    /// Parameters the artifact was generated with.
    #[serde(default)]
    pub generation_params: Value,
    #[serde(default)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Video,
    Thumbnail,
    Image,
    Audio,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Video => "video",
            AssetKind::Thumbnail => "thumbnail",
            AssetKind::Image => "image",
            AssetKind::Audio => "audio",
        }
    }
}

// ============================================================================
// Insight reports
// ============================================================================

/// Performance analysis over a reporting period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsightReport {
    pub id: String,
    pub campaign_id: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Per-dimension performance breakdowns.
    #[serde(default)]
    pub breakdowns: Value,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Counts
// ============================================================================

/// Downstream entity counts for one campaign, the raw material of the
/// progress deriver.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlateStats {
    pub angles: i64,
    pub posts: i64,
    pub videos: i64,
    pub thumbnails: i64,
}
