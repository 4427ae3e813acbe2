//! Flag repository for database operations
//!
//! The aggregate persists as a single row — environments and revisions
//! as JSON columns — so every lifecycle or toggle operation is one
//! atomic row replace keyed by flag id. A `seq` write counter enforces
//! at-most-one-writer per flag: updates carry the seq observed at load
//! and fail with `Conflict` when another writer got there first.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::flag::{Environment, Flag, FlagType, Rule};
use super::revision::Revision;
use crate::error::{Error, Result};

/// Repository for flag database operations
#[derive(Debug, Clone)]
pub struct FlagRepository {
    pool: SqlitePool,
}

impl FlagRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a newly created flag
    pub async fn create(&self, flag: &Flag) -> Result<()> {
        let environments = serde_json::to_string(&flag.environments)
            .map_err(|e| Error::Parse(format!("Failed to serialize environments: {}", e)))?;
        let revisions = serde_json::to_string(&flag.revisions)
            .map_err(|e| Error::Parse(format!("Failed to serialize revisions: {}", e)))?;
        let rules = serde_json::to_string(&flag.rules)
            .map_err(|e| Error::Parse(format!("Failed to serialize rules: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO flags (
                id, org_id, created_by, name, flag_type, default_value, rules,
                version, seq, environments, revisions,
                created_at, updated_at, deleted_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(flag.id.to_string())
        .bind(flag.org_id.to_string())
        .bind(flag.created_by.to_string())
        .bind(&flag.name)
        .bind(flag.flag_type.as_str())
        .bind(&flag.default_value)
        .bind(&rules)
        .bind(flag.version)
        .bind(flag.seq)
        .bind(&environments)
        .bind(&revisions)
        .bind(flag.created_at)
        .bind(flag.updated_at)
        .bind(flag.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(())
    }

    /// Get a flag by id
    ///
    /// Soft-deleted flags are returned too; exclusion is the caller's
    /// policy, not the repository's.
    pub async fn get(&self, flag_id: Uuid) -> Result<Option<Flag>> {
        let row: Option<FlagRow> = sqlx::query_as(
            r#"
            SELECT id, org_id, created_by, name, flag_type, default_value, rules,
                   version, seq, environments, revisions,
                   created_at, updated_at, deleted_at
            FROM flags
            WHERE id = ?
            "#,
        )
        .bind(flag_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        match row {
            Some(row) => Ok(Some(row.into_flag()?)),
            None => Ok(None),
        }
    }

    /// Replace a flag row, guarded by the seq observed at load time
    ///
    /// Fails with `Conflict` when the stored seq moved since the
    /// aggregate was loaded, `FlagNotFound` when the row is gone. On
    /// success the in-memory seq is bumped to match the stored row.
    pub async fn update(&self, flag: &mut Flag) -> Result<()> {
        let environments = serde_json::to_string(&flag.environments)
            .map_err(|e| Error::Parse(format!("Failed to serialize environments: {}", e)))?;
        let revisions = serde_json::to_string(&flag.revisions)
            .map_err(|e| Error::Parse(format!("Failed to serialize revisions: {}", e)))?;
        let rules = serde_json::to_string(&flag.rules)
            .map_err(|e| Error::Parse(format!("Failed to serialize rules: {}", e)))?;

        let result = sqlx::query(
            r#"
            UPDATE flags SET
                name = ?,
                flag_type = ?,
                default_value = ?,
                rules = ?,
                version = ?,
                seq = seq + 1,
                environments = ?,
                revisions = ?,
                updated_at = ?,
                deleted_at = ?
            WHERE id = ? AND seq = ?
            "#,
        )
        .bind(&flag.name)
        .bind(flag.flag_type.as_str())
        .bind(&flag.default_value)
        .bind(&rules)
        .bind(flag.version)
        .bind(&environments)
        .bind(&revisions)
        .bind(flag.updated_at)
        .bind(flag.deleted_at)
        .bind(flag.id.to_string())
        .bind(flag.seq)
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        if result.rows_affected() == 0 {
            // Distinguish a stale aggregate from a vanished row.
            let exists: Option<(i64,)> = sqlx::query_as("SELECT seq FROM flags WHERE id = ?")
                .bind(flag.id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::DatabaseError)?;
            return match exists {
                Some(_) => Err(Error::Conflict(flag.name.clone())),
                None => Err(Error::FlagNotFound(flag.id.to_string())),
            };
        }

        flag.seq += 1;
        Ok(())
    }

    /// List alive flags for an organization, newest first
    pub async fn list_by_org(&self, org_id: Uuid, limit: Option<i32>) -> Result<Vec<FlagSummary>> {
        let limit = limit.unwrap_or(50);

        let rows: Vec<FlagSummaryRow> = sqlx::query_as(
            r#"
            SELECT id, name, flag_type, version, created_at, updated_at
            FROM flags
            WHERE org_id = ? AND deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(org_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(|row| row.into_summary()).collect()
    }

    /// Count alive flags for an organization
    pub async fn count_by_org(&self, org_id: Uuid) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM flags WHERE org_id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(org_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(count)
    }
}

/// Lightweight flag info for listing
#[derive(Debug, Clone)]
pub struct FlagSummary {
    /// Flag id
    pub id: Uuid,
    /// Flag name
    pub name: String,
    /// Value type
    pub flag_type: FlagType,
    /// Lifecycle version
    pub version: i64,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last modified
    pub updated_at: DateTime<Utc>,
}

// ========== Database Row Types ==========

/// Database row for a full flag aggregate
#[derive(sqlx::FromRow)]
struct FlagRow {
    id: String,
    org_id: String,
    created_by: String,
    name: String,
    flag_type: String,
    default_value: String,
    rules: String,
    version: i64,
    seq: i64,
    environments: String,
    revisions: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl FlagRow {
    fn into_flag(self) -> Result<Flag> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid flag ID: {}", e)))?;
        let org_id = Uuid::parse_str(&self.org_id)
            .map_err(|e| Error::Parse(format!("Invalid org ID: {}", e)))?;
        let created_by = Uuid::parse_str(&self.created_by)
            .map_err(|e| Error::Parse(format!("Invalid creator ID: {}", e)))?;
        let flag_type = FlagType::from_str(&self.flag_type)
            .ok_or_else(|| Error::Parse(format!("Invalid flag type: {}", self.flag_type)))?;
        let rules: Vec<Rule> = serde_json::from_str(&self.rules)
            .map_err(|e| Error::Parse(format!("Invalid rules JSON: {}", e)))?;
        let environments: Vec<Environment> = serde_json::from_str(&self.environments)
            .map_err(|e| Error::Parse(format!("Invalid environments JSON: {}", e)))?;
        let revisions: Vec<Revision> = serde_json::from_str(&self.revisions)
            .map_err(|e| Error::Parse(format!("Invalid revisions JSON: {}", e)))?;

        Ok(Flag {
            id,
            org_id,
            created_by,
            name: self.name,
            flag_type,
            default_value: self.default_value,
            rules,
            version: self.version,
            environments,
            revisions,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
            seq: self.seq,
        })
    }
}

/// Database row for flag summaries (lightweight)
#[derive(sqlx::FromRow)]
struct FlagSummaryRow {
    id: String,
    name: String,
    flag_type: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FlagSummaryRow {
    fn into_summary(self) -> Result<FlagSummary> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid flag ID: {}", e)))?;
        let flag_type = FlagType::from_str(&self.flag_type)
            .ok_or_else(|| Error::Parse(format!("Invalid flag type: {}", self.flag_type)))?;

        Ok(FlagSummary {
            id,
            name: self.name,
            flag_type,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
