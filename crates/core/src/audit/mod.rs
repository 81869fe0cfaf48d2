//! Operational audit trail for the slate pipeline.
//!
//! Components emit [`PipelineEvent`]s through a cheap [`AuditHandle`]; a
//! background [`AuditWriter`] persists them for later querying.

mod events;
mod handle;
mod sqlite;
mod store;
mod writer;

pub use events::PipelineEvent;
pub use handle::{AuditEventEnvelope, AuditHandle};
pub use sqlite::SqliteAuditStore;
pub use store::{AuditError, AuditFilter, AuditRecord, AuditStore};
pub use writer::{create_audit_system, AuditWriter};
