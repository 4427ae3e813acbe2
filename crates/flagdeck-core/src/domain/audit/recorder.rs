//! Audit recorder for database operations
//!
//! The trail is append-only: rows are never updated, and the only
//! removal path is retention pruning by age.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::event::{AuditEvent, AuditEventKind};
use crate::error::{Error, Result};

/// Append-only store for flag audit events
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    pool: SqlitePool,
}

impl AuditRecorder {
    /// Create a new recorder with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an event to the trail
    pub async fn append(&self, event: &AuditEvent) -> Result<()> {
        let data = match &event.data {
            Some(value) => Some(
                serde_json::to_string(value)
                    .map_err(|e| Error::Parse(format!("Failed to serialize event data: {}", e)))?,
            ),
            None => None,
        };

        sqlx::query(
            r#"
            INSERT INTO audit_events (id, flag_id, actor_id, kind, data, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id.to_string())
        .bind(event.flag_id.to_string())
        .bind(event.actor_id.to_string())
        .bind(event.kind.as_str())
        .bind(data)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(())
    }

    /// List events for a flag in the order they were recorded
    pub async fn list_for_flag(&self, flag_id: Uuid) -> Result<Vec<AuditEvent>> {
        let rows: Vec<AuditEventRow> = sqlx::query_as(
            r#"
            SELECT id, flag_id, actor_id, kind, data, created_at
            FROM audit_events
            WHERE flag_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(flag_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(|row| row.into_event()).collect()
    }

    /// Count events for a flag
    pub async fn count_for_flag(&self, flag_id: Uuid) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM audit_events WHERE flag_id = ?")
                .bind(flag_id.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(Error::DatabaseError)?;

        Ok(count)
    }

    /// Delete events older than the given number of days, returning how
    /// many were removed
    pub async fn delete_older_than(&self, days: i64) -> Result<u64> {
        let cutoff: DateTime<Utc> = Utc::now() - Duration::days(days);

        let result = sqlx::query("DELETE FROM audit_events WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(result.rows_affected())
    }
}

/// Database row for audit events
#[derive(sqlx::FromRow)]
struct AuditEventRow {
    id: String,
    flag_id: String,
    actor_id: String,
    kind: String,
    data: Option<String>,
    created_at: DateTime<Utc>,
}

impl AuditEventRow {
    fn into_event(self) -> Result<AuditEvent> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid event ID: {}", e)))?;
        let flag_id = Uuid::parse_str(&self.flag_id)
            .map_err(|e| Error::Parse(format!("Invalid flag ID: {}", e)))?;
        let actor_id = Uuid::parse_str(&self.actor_id)
            .map_err(|e| Error::Parse(format!("Invalid actor ID: {}", e)))?;
        let kind = AuditEventKind::from_str(&self.kind)
            .ok_or_else(|| Error::Parse(format!("Invalid event kind: {}", self.kind)))?;
        let data = match self.data {
            Some(raw) => Some(
                serde_json::from_str(&raw)
                    .map_err(|e| Error::Parse(format!("Invalid event data JSON: {}", e)))?,
            ),
            None => None,
        };

        Ok(AuditEvent {
            id,
            flag_id,
            actor_id,
            kind,
            data,
            created_at: self.created_at,
        })
    }
}
