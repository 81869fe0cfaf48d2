//! Domain store for slate entities.
//!
//! Pure CRUD plus counting; business rules live in the pipeline and in the
//! task specifications sent to the external service. Data-model invariants
//! (referential integrity, score and day bounds) are enforced here at the
//! schema level.

mod sqlite_store;
mod traits;
mod types;

pub use sqlite_store::SqliteSlateStore;
pub use traits::{
    CampaignFilter, EnrichmentUpdate, NewCampaign, NewContentAngle, NewInsightReport,
    NewMediaAsset, NewScheduledPost, SlateStore, StoreError,
};
pub use types::{
    AssetKind, Campaign, CampaignMetadata, ContentAngle, Difficulty, InsightReport, MediaAsset,
    PostStatus, ScheduledPost, SlateStats, StageDispatchStatus, StageRecord, PLACEHOLDER_TITLE,
    SLATE_DAYS,
};
