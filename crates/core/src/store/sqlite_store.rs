//! SQLite-backed slate store implementation.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::pipeline::Stage;

use super::traits::{
    CampaignFilter, EnrichmentUpdate, NewCampaign, NewContentAngle, NewInsightReport,
    NewMediaAsset, NewScheduledPost, SlateStore, StoreError,
};
use super::types::{
    AssetKind, Campaign, CampaignMetadata, ContentAngle, Difficulty, InsightReport, MediaAsset,
    PostStatus, ScheduledPost, SlateStats, StageRecord, PLACEHOLDER_TITLE, SLATE_DAYS,
};

/// SQLite-backed slate store.
pub struct SqliteSlateStore {
    conn: Mutex<Connection>,
}

impl SqliteSlateStore {
    /// Create a new SQLite slate store, creating the database file and tables
    /// if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite slate store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS campaigns (
                id TEXT PRIMARY KEY,
                source_ref TEXT NOT NULL,
                platform TEXT NOT NULL,
                title TEXT NOT NULL,
                contributors TEXT NOT NULL,
                palette TEXT NOT NULL,
                metadata TEXT NOT NULL,
                stage_states TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_campaigns_platform ON campaigns(platform);
            CREATE INDEX IF NOT EXISTS idx_campaigns_created_at ON campaigns(created_at);

            CREATE TABLE IF NOT EXISTS content_angles (
                id TEXT PRIMARY KEY,
                campaign_id TEXT NOT NULL REFERENCES campaigns(id),
                hook TEXT NOT NULL,
                alt_hooks TEXT NOT NULL,
                score INTEGER NOT NULL CHECK(score BETWEEN 0 AND 100),
                difficulty TEXT NOT NULL,
                duration_hint_secs INTEGER,
                trend_ref TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_angles_campaign ON content_angles(campaign_id);

            CREATE TABLE IF NOT EXISTS scheduled_posts (
                id TEXT PRIMARY KEY,
                campaign_id TEXT NOT NULL REFERENCES campaigns(id),
                angle_id TEXT REFERENCES content_angles(id),
                day INTEGER NOT NULL CHECK(day BETWEEN 1 AND 7),
                script TEXT NOT NULL,
                caption TEXT NOT NULL,
                hashtags TEXT NOT NULL,
                call_to_action TEXT NOT NULL,
                status TEXT NOT NULL,
                performance TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_posts_campaign ON scheduled_posts(campaign_id);

            CREATE TABLE IF NOT EXISTS media_assets (
                id TEXT PRIMARY KEY,
                post_id TEXT NOT NULL REFERENCES scheduled_posts(id),
                kind TEXT NOT NULL CHECK(kind IN ('video','thumbnail','image','audio')),
                variant TEXT NOT NULL,
                storage_ref TEXT NOT NULL,
                generation_params TEXT NOT NULL,
                metadata TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_assets_post ON media_assets(post_id);

            CREATE TABLE IF NOT EXISTS insight_reports (
                id TEXT PRIMARY KEY,
                campaign_id TEXT NOT NULL REFERENCES campaigns(id),
                period_start TEXT NOT NULL,
                period_end TEXT NOT NULL,
                breakdowns TEXT NOT NULL,
                recommendations TEXT NOT NULL,
                summary TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_reports_campaign ON insight_reports(campaign_id);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn exists(conn: &Connection, table: &str, id: &str) -> Result<bool, StoreError> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ?", table);
        match conn.query_row(&sql, params![id], |_| Ok(())) {
            Ok(()) => Ok(true),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    fn parse_timestamp(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_campaign(row: &rusqlite::Row) -> rusqlite::Result<Campaign> {
        let id: String = row.get(0)?;
        let source_ref: String = row.get(1)?;
        let platform: String = row.get(2)?;
        let title: String = row.get(3)?;
        let contributors_json: String = row.get(4)?;
        let palette_json: String = row.get(5)?;
        let metadata_json: String = row.get(6)?;
        let stage_states_json: String = row.get(7)?;
        let created_at_str: String = row.get(8)?;
        let updated_at_str: String = row.get(9)?;

        let contributors: Vec<String> =
            serde_json::from_str(&contributors_json).unwrap_or_default();
        let palette: Vec<String> = serde_json::from_str(&palette_json).unwrap_or_default();
        let metadata: CampaignMetadata =
            serde_json::from_str(&metadata_json).unwrap_or_default();
        let stage_states: BTreeMap<Stage, StageRecord> =
            serde_json::from_str(&stage_states_json).unwrap_or_default();

        Ok(Campaign {
            id,
            source_ref,
            platform,
            title,
            contributors,
            palette,
            metadata,
            stage_states,
            created_at: Self::parse_timestamp(&created_at_str),
            updated_at: Self::parse_timestamp(&updated_at_str),
        })
    }

    fn row_to_angle(row: &rusqlite::Row) -> rusqlite::Result<ContentAngle> {
        let id: String = row.get(0)?;
        let campaign_id: String = row.get(1)?;
        let hook: String = row.get(2)?;
        let alt_hooks_json: String = row.get(3)?;
        let score: u8 = row.get(4)?;
        let difficulty_str: String = row.get(5)?;
        let duration_hint_secs: Option<u16> = row.get(6)?;
        let trend_ref: Option<String> = row.get(7)?;
        let created_at_str: String = row.get(8)?;

        let alt_hooks: Vec<String> = serde_json::from_str(&alt_hooks_json).unwrap_or_default();
        let difficulty = match difficulty_str.as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Moderate,
        };

        Ok(ContentAngle {
            id,
            campaign_id,
            hook,
            alt_hooks,
            score,
            difficulty,
            duration_hint_secs,
            trend_ref,
            created_at: Self::parse_timestamp(&created_at_str),
        })
    }

    fn row_to_post(row: &rusqlite::Row) -> rusqlite::Result<ScheduledPost> {
        let id: String = row.get(0)?;
        let campaign_id: String = row.get(1)?;
        let angle_id: Option<String> = row.get(2)?;
        let day: u8 = row.get(3)?;
        let script: String = row.get(4)?;
        let caption: String = row.get(5)?;
        let hashtags_json: String = row.get(6)?;
        let call_to_action: String = row.get(7)?;
        let status_str: String = row.get(8)?;
        let performance_json: Option<String> = row.get(9)?;
        let created_at_str: String = row.get(10)?;

        let hashtags: Vec<String> = serde_json::from_str(&hashtags_json).unwrap_or_default();
        let status = match status_str.as_str() {
            "drafted" => PostStatus::Drafted,
            "published" => PostStatus::Published,
            "archived" => PostStatus::Archived,
            _ => PostStatus::Ready,
        };
        let performance = performance_json.and_then(|json| serde_json::from_str(&json).ok());

        Ok(ScheduledPost {
            id,
            campaign_id,
            angle_id,
            day,
            script,
            caption,
            hashtags,
            call_to_action,
            status,
            performance,
            created_at: Self::parse_timestamp(&created_at_str),
        })
    }

    fn row_to_asset(row: &rusqlite::Row) -> rusqlite::Result<MediaAsset> {
        let id: String = row.get(0)?;
        let post_id: String = row.get(1)?;
        let kind_str: String = row.get(2)?;
        let variant: String = row.get(3)?;
        let storage_ref: String = row.get(4)?;
        let generation_params_json: String = row.get(5)?;
        let metadata_json: String = row.get(6)?;
        let created_at_str: String = row.get(7)?;

        let kind = match kind_str.as_str() {
            "video" => AssetKind::Video,
            "image" => AssetKind::Image,
            "audio" => AssetKind::Audio,
            _ => AssetKind::Thumbnail,
        };

        Ok(MediaAsset {
            id,
            post_id,
            kind,
            variant,
            storage_ref,
            generation_params: serde_json::from_str(&generation_params_json)
                .unwrap_or(serde_json::Value::Null),
            metadata: serde_json::from_str(&metadata_json).unwrap_or(serde_json::Value::Null),
            created_at: Self::parse_timestamp(&created_at_str),
        })
    }

    fn row_to_report(row: &rusqlite::Row) -> rusqlite::Result<InsightReport> {
        let id: String = row.get(0)?;
        let campaign_id: String = row.get(1)?;
        let period_start_str: String = row.get(2)?;
        let period_end_str: String = row.get(3)?;
        let breakdowns_json: String = row.get(4)?;
        let recommendations_json: String = row.get(5)?;
        let summary: String = row.get(6)?;
        let created_at_str: String = row.get(7)?;

        Ok(InsightReport {
            id,
            campaign_id,
            period_start: Self::parse_timestamp(&period_start_str),
            period_end: Self::parse_timestamp(&period_end_str),
            breakdowns: serde_json::from_str(&breakdowns_json)
                .unwrap_or(serde_json::Value::Null),
            recommendations: serde_json::from_str(&recommendations_json).unwrap_or_default(),
            summary,
            created_at: Self::parse_timestamp(&created_at_str),
        })
    }

    fn get_campaign_locked(
        conn: &Connection,
        id: &str,
    ) -> Result<Option<Campaign>, StoreError> {
        let result = conn.query_row(
            "SELECT id, source_ref, platform, title, contributors, palette, metadata, stage_states, created_at, updated_at FROM campaigns WHERE id = ?",
            params![id],
            Self::row_to_campaign,
        );

        match result {
            Ok(campaign) => Ok(Some(campaign)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    fn save_campaign_mutation(
        conn: &Connection,
        campaign: &Campaign,
    ) -> Result<(), StoreError> {
        let contributors_json = serde_json::to_string(&campaign.contributors)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let palette_json = serde_json::to_string(&campaign.palette)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let stage_states_json = serde_json::to_string(&campaign.stage_states)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        conn.execute(
            "UPDATE campaigns SET title = ?, contributors = ?, palette = ?, stage_states = ?, updated_at = ? WHERE id = ?",
            params![
                campaign.title,
                contributors_json,
                palette_json,
                stage_states_json,
                campaign.updated_at.to_rfc3339(),
                campaign.id,
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

impl SlateStore for SqliteSlateStore {
    fn create_campaign(&self, request: NewCampaign) -> Result<Campaign, StoreError> {
        let conn = self.conn.lock().unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let metadata_json = serde_json::to_string(&request.metadata)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO campaigns (id, source_ref, platform, title, contributors, palette, metadata, stage_states, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                request.source_ref,
                request.platform,
                PLACEHOLDER_TITLE,
                "[]",
                "[]",
                metadata_json,
                "{}",
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Campaign {
            id,
            source_ref: request.source_ref,
            platform: request.platform,
            title: PLACEHOLDER_TITLE.to_string(),
            contributors: vec![],
            palette: vec![],
            metadata: request.metadata,
            stage_states: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_campaign(&self, id: &str) -> Result<Option<Campaign>, StoreError> {
        let conn = self.conn.lock().unwrap();
        Self::get_campaign_locked(&conn, id)
    }

    fn list_campaigns(&self, filter: &CampaignFilter) -> Result<Vec<Campaign>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, mut sql_params): (String, Vec<Box<dyn rusqlite::ToSql>>) =
            match &filter.platform {
                Some(platform) => (
                    "WHERE platform = ?".to_string(),
                    vec![Box::new(platform.clone())],
                ),
                None => (String::new(), vec![]),
            };

        let sql = format!(
            "SELECT id, source_ref, platform, title, contributors, palette, metadata, stage_states, created_at, updated_at FROM campaigns {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            where_clause
        );

        sql_params.push(Box::new(filter.limit));
        sql_params.push(Box::new(filter.offset));
        let param_refs: Vec<&dyn rusqlite::ToSql> =
            sql_params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_campaign)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut campaigns = Vec::new();
        for row_result in rows {
            campaigns.push(row_result.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(campaigns)
    }

    fn apply_enrichment(
        &self,
        id: &str,
        update: EnrichmentUpdate,
    ) -> Result<Campaign, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut campaign = Self::get_campaign_locked(&conn, id)?
            .ok_or_else(|| StoreError::campaign_not_found(id))?;

        if update.title.trim().is_empty() {
            return Err(StoreError::InvalidValue(
                "enrichment title cannot be empty".to_string(),
            ));
        }

        campaign.title = update.title;
        campaign.contributors = update.contributors;
        campaign.palette = update.palette;
        campaign.updated_at = Utc::now();

        Self::save_campaign_mutation(&conn, &campaign)?;
        Ok(campaign)
    }

    fn record_stage(
        &self,
        id: &str,
        stage: Stage,
        record: StageRecord,
    ) -> Result<Campaign, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut campaign = Self::get_campaign_locked(&conn, id)?
            .ok_or_else(|| StoreError::campaign_not_found(id))?;

        campaign.stage_states.insert(stage, record);
        campaign.updated_at = Utc::now();

        Self::save_campaign_mutation(&conn, &campaign)?;
        Ok(campaign)
    }

    fn insert_angle(&self, request: NewContentAngle) -> Result<ContentAngle, StoreError> {
        if request.score > 100 {
            return Err(StoreError::InvalidValue(format!(
                "suitability score must be 0-100, got {}",
                request.score
            )));
        }

        let conn = self.conn.lock().unwrap();

        if !Self::exists(&conn, "campaigns", &request.campaign_id)? {
            return Err(StoreError::InvalidReference(format!(
                "campaign does not exist: {}",
                request.campaign_id
            )));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let alt_hooks_json = serde_json::to_string(&request.alt_hooks)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO content_angles (id, campaign_id, hook, alt_hooks, score, difficulty, duration_hint_secs, trend_ref, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                request.campaign_id,
                request.hook,
                alt_hooks_json,
                request.score,
                request.difficulty.as_str(),
                request.duration_hint_secs,
                request.trend_ref,
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(ContentAngle {
            id,
            campaign_id: request.campaign_id,
            hook: request.hook,
            alt_hooks: request.alt_hooks,
            score: request.score,
            difficulty: request.difficulty,
            duration_hint_secs: request.duration_hint_secs,
            trend_ref: request.trend_ref,
            created_at: now,
        })
    }

    fn list_angles(&self, campaign_id: &str) -> Result<Vec<ContentAngle>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT id, campaign_id, hook, alt_hooks, score, difficulty, duration_hint_secs, trend_ref, created_at FROM content_angles WHERE campaign_id = ? ORDER BY score DESC, created_at ASC")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![campaign_id], Self::row_to_angle)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut angles = Vec::new();
        for row_result in rows {
            angles.push(row_result.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(angles)
    }

    fn insert_post(&self, request: NewScheduledPost) -> Result<ScheduledPost, StoreError> {
        if request.day == 0 || request.day > SLATE_DAYS {
            return Err(StoreError::InvalidValue(format!(
                "day must be 1-{}, got {}",
                SLATE_DAYS, request.day
            )));
        }

        let conn = self.conn.lock().unwrap();

        if !Self::exists(&conn, "campaigns", &request.campaign_id)? {
            return Err(StoreError::InvalidReference(format!(
                "campaign does not exist: {}",
                request.campaign_id
            )));
        }
        if let Some(ref angle_id) = request.angle_id {
            if !Self::exists(&conn, "content_angles", angle_id)? {
                return Err(StoreError::InvalidReference(format!(
                    "content angle does not exist: {}",
                    angle_id
                )));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let hashtags_json = serde_json::to_string(&request.hashtags)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO scheduled_posts (id, campaign_id, angle_id, day, script, caption, hashtags, call_to_action, status, performance, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?)",
            params![
                id,
                request.campaign_id,
                request.angle_id,
                request.day,
                request.script,
                request.caption,
                hashtags_json,
                request.call_to_action,
                PostStatus::Ready.as_str(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(ScheduledPost {
            id,
            campaign_id: request.campaign_id,
            angle_id: request.angle_id,
            day: request.day,
            script: request.script,
            caption: request.caption,
            hashtags: request.hashtags,
            call_to_action: request.call_to_action,
            status: PostStatus::Ready,
            performance: None,
            created_at: now,
        })
    }

    fn list_posts(&self, campaign_id: &str) -> Result<Vec<ScheduledPost>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT id, campaign_id, angle_id, day, script, caption, hashtags, call_to_action, status, performance, created_at FROM scheduled_posts WHERE campaign_id = ? ORDER BY day ASC, created_at ASC")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![campaign_id], Self::row_to_post)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut posts = Vec::new();
        for row_result in rows {
            posts.push(row_result.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(posts)
    }

    fn update_post_status(
        &self,
        post_id: &str,
        status: PostStatus,
    ) -> Result<ScheduledPost, StoreError> {
        let conn = self.conn.lock().unwrap();

        let changed = conn
            .execute(
                "UPDATE scheduled_posts SET status = ? WHERE id = ?",
                params![status.as_str(), post_id],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "scheduled post",
                id: post_id.to_string(),
            });
        }

        conn.query_row(
            "SELECT id, campaign_id, angle_id, day, script, caption, hashtags, call_to_action, status, performance, created_at FROM scheduled_posts WHERE id = ?",
            params![post_id],
            Self::row_to_post,
        )
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn insert_asset(&self, request: NewMediaAsset) -> Result<MediaAsset, StoreError> {
        let conn = self.conn.lock().unwrap();

        if !Self::exists(&conn, "scheduled_posts", &request.post_id)? {
            return Err(StoreError::InvalidReference(format!(
                "scheduled post does not exist: {}",
                request.post_id
            )));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let generation_params_json = serde_json::to_string(&request.generation_params)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let metadata_json = serde_json::to_string(&request.metadata)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO media_assets (id, post_id, kind, variant, storage_ref, generation_params, metadata, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                request.post_id,
                request.kind.as_str(),
                request.variant,
                request.storage_ref,
                generation_params_json,
                metadata_json,
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(MediaAsset {
            id,
            post_id: request.post_id,
            kind: request.kind,
            variant: request.variant,
            storage_ref: request.storage_ref,
            generation_params: request.generation_params,
            metadata: request.metadata,
            created_at: now,
        })
    }

    fn list_assets(&self, post_id: &str) -> Result<Vec<MediaAsset>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT id, post_id, kind, variant, storage_ref, generation_params, metadata, created_at FROM media_assets WHERE post_id = ? ORDER BY created_at ASC")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![post_id], Self::row_to_asset)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut assets = Vec::new();
        for row_result in rows {
            assets.push(row_result.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(assets)
    }

    fn insert_report(&self, request: NewInsightReport) -> Result<InsightReport, StoreError> {
        let conn = self.conn.lock().unwrap();

        if !Self::exists(&conn, "campaigns", &request.campaign_id)? {
            return Err(StoreError::InvalidReference(format!(
                "campaign does not exist: {}",
                request.campaign_id
            )));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let breakdowns_json = serde_json::to_string(&request.breakdowns)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let recommendations_json = serde_json::to_string(&request.recommendations)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO insight_reports (id, campaign_id, period_start, period_end, breakdowns, recommendations, summary, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                request.campaign_id,
                request.period_start.to_rfc3339(),
                request.period_end.to_rfc3339(),
                breakdowns_json,
                recommendations_json,
                request.summary,
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(InsightReport {
            id,
            campaign_id: request.campaign_id,
            period_start: request.period_start,
            period_end: request.period_end,
            breakdowns: request.breakdowns,
            recommendations: request.recommendations,
            summary: request.summary,
            created_at: now,
        })
    }

    fn list_reports(&self, campaign_id: &str) -> Result<Vec<InsightReport>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT id, campaign_id, period_start, period_end, breakdowns, recommendations, summary, created_at FROM insight_reports WHERE campaign_id = ? ORDER BY created_at DESC")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![campaign_id], Self::row_to_report)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut reports = Vec::new();
        for row_result in rows {
            reports.push(row_result.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(reports)
    }

    fn stats(&self, campaign_id: &str) -> Result<SlateStats, StoreError> {
        let conn = self.conn.lock().unwrap();

        let count = |sql: &str, extra: Option<&str>| -> Result<i64, StoreError> {
            let result = match extra {
                Some(kind) => conn.query_row(sql, params![campaign_id, kind], |row| row.get(0)),
                None => conn.query_row(sql, params![campaign_id], |row| row.get(0)),
            };
            result.map_err(|e| StoreError::Database(e.to_string()))
        };

        let angles = count(
            "SELECT COUNT(*) FROM content_angles WHERE campaign_id = ?",
            None,
        )?;
        let posts = count(
            "SELECT COUNT(*) FROM scheduled_posts WHERE campaign_id = ?",
            None,
        )?;
        let asset_sql = "SELECT COUNT(*) FROM media_assets a JOIN scheduled_posts p ON a.post_id = p.id WHERE p.campaign_id = ? AND a.kind = ?";
        let videos = count(asset_sql, Some("video"))?;
        let thumbnails = count(asset_sql, Some("thumbnail"))?;

        Ok(SlateStats {
            angles,
            posts,
            videos,
            thumbnails,
        })
    }
}
