//! Durable stage scheduling.
//!
//! Each pending stage continuation is a row, unique per (campaign, stage),
//! claimed by the worker once its due time passes. The queue is the pipeline's
//! only memory of "what happens next": a process restart resumes exactly
//! where the previous one stopped.

use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

use super::stage::Stage;

/// Lifecycle of a stage job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for its due time.
    Pending,
    /// Stage was submitted to the task service.
    Dispatched,
    /// Submission failed; the chain halted here.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Dispatched => "dispatched",
            JobStatus::Failed => "failed",
        }
    }
}

/// One persisted stage continuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageJob {
    pub id: i64,
    pub campaign_id: String,
    pub stage: Stage,
    /// When the job becomes claimable.
    pub due_at: DateTime<Utc>,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Trait for stage queue backends.
pub trait StageQueue: Send + Sync {
    /// Enqueue a stage for a campaign. Idempotent: re-enqueueing an existing
    /// (campaign, stage) returns the existing job untouched.
    fn enqueue(
        &self,
        campaign_id: &str,
        stage: Stage,
        due_at: DateTime<Utc>,
    ) -> Result<StageJob, StoreError>;

    /// Pending jobs whose due time has passed, oldest first.
    fn due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<StageJob>, StoreError>;

    /// Push a pending job's due time back.
    fn defer(&self, job_id: i64, due_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Mark a job's stage as dispatched.
    fn mark_dispatched(&self, job_id: i64) -> Result<(), StoreError>;

    /// Mark a job failed. The worker never retries a failed job.
    fn mark_failed(&self, job_id: i64, error: &str) -> Result<(), StoreError>;

    /// All jobs for one campaign, in stage order.
    fn jobs_for(&self, campaign_id: &str) -> Result<Vec<StageJob>, StoreError>;

    /// Count jobs with the given status.
    fn count_by_status(&self, status: JobStatus) -> Result<i64, StoreError>;
}

/// SQLite-backed stage queue.
pub struct SqliteStageQueue {
    conn: Mutex<Connection>,
}

impl SqliteStageQueue {
    /// Create a new SQLite stage queue, creating the database file and table
    /// if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite stage queue (useful for testing).
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
            CREATE TABLE IF NOT EXISTS stage_jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                campaign_id TEXT NOT NULL,
                stage TEXT NOT NULL,
                due_at TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                error TEXT,
                created_at TEXT NOT NULL,
                UNIQUE(campaign_id, stage)
            );

            CREATE INDEX IF NOT EXISTS idx_stage_jobs_due ON stage_jobs(status, due_at);
            CREATE INDEX IF NOT EXISTS idx_stage_jobs_campaign ON stage_jobs(campaign_id);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<StageJob> {
        let id: i64 = row.get(0)?;
        let campaign_id: String = row.get(1)?;
        let stage_str: String = row.get(2)?;
        let due_at_str: String = row.get(3)?;
        let status_str: String = row.get(4)?;
        let error: Option<String> = row.get(5)?;
        let created_at_str: String = row.get(6)?;

        let stage = Stage::from_str(&stage_str).unwrap_or(Stage::Enrich);
        let status = match status_str.as_str() {
            "dispatched" => JobStatus::Dispatched,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending,
        };

        let parse_ts = |raw: &str| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now())
        };

        Ok(StageJob {
            id,
            campaign_id,
            stage,
            due_at: parse_ts(&due_at_str),
            status,
            error,
            created_at: parse_ts(&created_at_str),
        })
    }

    fn get_job(conn: &Connection, campaign_id: &str, stage: Stage) -> Result<StageJob, StoreError> {
        conn.query_row(
            "SELECT id, campaign_id, stage, due_at, status, error, created_at FROM stage_jobs WHERE campaign_id = ? AND stage = ?",
            params![campaign_id, stage.as_str()],
            Self::row_to_job,
        )
        .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl StageQueue for SqliteStageQueue {
    fn enqueue(
        &self,
        campaign_id: &str,
        stage: Stage,
        due_at: DateTime<Utc>,
    ) -> Result<StageJob, StoreError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT OR IGNORE INTO stage_jobs (campaign_id, stage, due_at, status, created_at) VALUES (?, ?, ?, 'pending', ?)",
            params![
                campaign_id,
                stage.as_str(),
                due_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Self::get_job(&conn, campaign_id, stage)
    }

    fn due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<StageJob>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT id, campaign_id, stage, due_at, status, error, created_at FROM stage_jobs WHERE status = 'pending' AND due_at <= ? ORDER BY due_at ASC LIMIT ?")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![now.to_rfc3339(), limit as i64], Self::row_to_job)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut jobs = Vec::new();
        for row_result in rows {
            jobs.push(row_result.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(jobs)
    }

    fn defer(&self, job_id: i64, due_at: DateTime<Utc>) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE stage_jobs SET due_at = ? WHERE id = ? AND status = 'pending'",
            params![due_at.to_rfc3339(), job_id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn mark_dispatched(&self, job_id: i64) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE stage_jobs SET status = 'dispatched', error = NULL WHERE id = ?",
            params![job_id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn mark_failed(&self, job_id: i64, error: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE stage_jobs SET status = 'failed', error = ? WHERE id = ?",
            params![error, job_id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn jobs_for(&self, campaign_id: &str) -> Result<Vec<StageJob>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT id, campaign_id, stage, due_at, status, error, created_at FROM stage_jobs WHERE campaign_id = ? ORDER BY id ASC")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![campaign_id], Self::row_to_job)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut jobs = Vec::new();
        for row_result in rows {
            jobs.push(row_result.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(jobs)
    }

    fn count_by_status(&self, status: JobStatus) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM stage_jobs WHERE status = ?",
            params![status.as_str()],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::Database(e.to_string()))
    }
}
