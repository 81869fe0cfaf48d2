use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{AuditError, AuditFilter, AuditRecord, AuditStore, PipelineEvent};

/// SQLite-backed audit store
pub struct SqliteAuditStore {
    conn: Mutex<Connection>,
}

impl SqliteAuditStore {
    /// Create a new SQLite audit store, creating the database file and tables
    /// if needed
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        let conn = Connection::open(path).map_err(|e| AuditError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite audit store (useful for testing)
    pub fn in_memory() -> Result<Self, AuditError> {
        let conn = Connection::open_in_memory().map_err(|e| AuditError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), AuditError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS audit_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_type TEXT NOT NULL,
                campaign_id TEXT,
                data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_audit_events_timestamp ON audit_events(timestamp);
            CREATE INDEX IF NOT EXISTS idx_audit_events_campaign_id ON audit_events(campaign_id);
            CREATE INDEX IF NOT EXISTS idx_audit_events_event_type ON audit_events(event_type);
            "#,
        )
        .map_err(|e| AuditError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_where_clause(filter: &AuditFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref campaign_id) = filter.campaign_id {
            conditions.push("campaign_id = ?");
            params.push(Box::new(campaign_id.clone()));
        }

        if let Some(ref event_type) = filter.event_type {
            conditions.push("event_type = ?");
            params.push(Box::new(event_type.clone()));
        }

        if let Some(ref from) = filter.from {
            conditions.push("timestamp >= ?");
            params.push(Box::new(from.to_rfc3339()));
        }

        if let Some(ref to) = filter.to {
            conditions.push("timestamp <= ?");
            params.push(Box::new(to.to_rfc3339()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<AuditRecord> {
        let id: i64 = row.get(0)?;
        let timestamp_str: String = row.get(1)?;
        let event_type: String = row.get(2)?;
        let campaign_id: Option<String> = row.get(3)?;
        let data_json: String = row.get(4)?;

        let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let data: PipelineEvent = serde_json::from_str(&data_json).unwrap_or(
            PipelineEvent::ServiceStopped {
                reason: "unparseable audit payload".to_string(),
            },
        );

        Ok(AuditRecord {
            id,
            timestamp,
            event_type,
            campaign_id,
            data,
        })
    }
}

impl AuditStore for SqliteAuditStore {
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError> {
        let conn = self.conn.lock().unwrap();

        let data_json = serde_json::to_string(&record.data)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO audit_events (timestamp, event_type, campaign_id, data) VALUES (?, ?, ?, ?)",
            params![
                record.timestamp.to_rfc3339(),
                record.event_type,
                record.campaign_id,
                data_json,
            ],
        )
        .map_err(|e| AuditError::Database(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT id, timestamp, event_type, campaign_id, data FROM audit_events {} ORDER BY id DESC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AuditError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_record)
            .map_err(|e| AuditError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row_result in rows {
            records.push(row_result.map_err(|e| AuditError::Database(e.to_string()))?);
        }
        Ok(records)
    }

    fn count(&self, filter: &AuditFilter) -> Result<i64, AuditError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM audit_events {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| AuditError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Stage;

    fn record(event: PipelineEvent) -> AuditRecord {
        AuditRecord {
            id: 0,
            timestamp: Utc::now(),
            event_type: event.event_type().to_string(),
            campaign_id: event.campaign_id().map(String::from),
            data: event,
        }
    }

    #[test]
    fn test_insert_and_query() {
        let store = SqliteAuditStore::in_memory().unwrap();

        let id = store
            .insert(&record(PipelineEvent::SlateStarted {
                campaign_id: "c-1".to_string(),
                source_ref: "ref://track/1".to_string(),
                platform: "tiktok".to_string(),
            }))
            .unwrap();
        assert!(id > 0);

        let records = store.query(&AuditFilter::new()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_type, "slate_started");
        assert_eq!(records[0].campaign_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn test_query_filters_by_campaign() {
        let store = SqliteAuditStore::in_memory().unwrap();

        for campaign_id in ["c-1", "c-1", "c-2"] {
            store
                .insert(&record(PipelineEvent::StageDispatched {
                    campaign_id: campaign_id.to_string(),
                    stage: Stage::Enrich,
                    task_id: "t".to_string(),
                    duration_ms: 5,
                }))
                .unwrap();
        }

        let records = store
            .query(&AuditFilter::new().with_campaign_id("c-1"))
            .unwrap();
        assert_eq!(records.len(), 2);

        let count = store
            .count(&AuditFilter::new().with_campaign_id("c-2"))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_query_filters_by_event_type() {
        let store = SqliteAuditStore::in_memory().unwrap();

        store
            .insert(&record(PipelineEvent::ServiceStarted {
                version: "0.1.0".to_string(),
                config_hash: "abc".to_string(),
            }))
            .unwrap();
        store
            .insert(&record(PipelineEvent::StageDispatchFailed {
                campaign_id: "c-1".to_string(),
                stage: Stage::PlanSchedule,
                error: "boom".to_string(),
            }))
            .unwrap();

        let records = store
            .query(&AuditFilter::new().with_event_type("stage_dispatch_failed"))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(matches!(
            records[0].data,
            PipelineEvent::StageDispatchFailed { .. }
        ));
    }

    #[test]
    fn test_query_newest_first() {
        let store = SqliteAuditStore::in_memory().unwrap();

        store
            .insert(&record(PipelineEvent::ServiceStarted {
                version: "0.1.0".to_string(),
                config_hash: "abc".to_string(),
            }))
            .unwrap();
        store
            .insert(&record(PipelineEvent::ServiceStopped {
                reason: "done".to_string(),
            }))
            .unwrap();

        let records = store.query(&AuditFilter::new()).unwrap();
        assert_eq!(records[0].event_type, "service_stopped");
        assert_eq!(records[1].event_type, "service_started");
    }
}
