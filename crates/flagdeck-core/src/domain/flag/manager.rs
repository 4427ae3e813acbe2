//! Flag manager for orchestrating flag lifecycle
//!
//! Provides high-level operations for managing flags: creation, draft
//! revisions, approval, rollback, environment toggles, and soft
//! deletion. Every mutation follows load, transform, persist, then
//! append the matching audit event.

use super::flag::{Flag, FlagType, Rule};
use super::repository::{FlagRepository, FlagSummary};
use super::revision::Revision;
use crate::domain::audit::{AuditEvent, AuditEventKind, AuditRecorder};
use crate::error::{Error, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

/// Manager for flag lifecycle operations
#[derive(Debug, Clone)]
pub struct FlagManager {
    repository: FlagRepository,
    recorder: AuditRecorder,
}

impl FlagManager {
    /// Create a new flag manager
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            repository: FlagRepository::new(pool.clone()),
            recorder: AuditRecorder::new(pool),
        }
    }

    /// Get the underlying repository
    pub fn repository(&self) -> &FlagRepository {
        &self.repository
    }

    /// Get the audit recorder
    pub fn recorder(&self) -> &AuditRecorder {
        &self.recorder
    }

    // ========== Flag Lifecycle ==========

    /// Create a new flag with the given environments
    #[allow(clippy::too_many_arguments)]
    pub async fn create_flag(
        &self,
        name: String,
        flag_type: FlagType,
        default_value: String,
        rules: Vec<Rule>,
        environments: Vec<String>,
        org_id: Uuid,
        created_by: Uuid,
    ) -> Result<Flag> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("Flag name cannot be empty".to_string()));
        }
        if environments.is_empty() {
            return Err(Error::InvalidInput(
                "Flag needs at least one environment".to_string(),
            ));
        }
        // Environment names are unique within a flag, case-sensitive.
        let mut seen = std::collections::HashSet::new();
        for environment in &environments {
            if !seen.insert(environment.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "Duplicate environment name '{}'",
                    environment
                )));
            }
        }

        let flag = Flag::new(
            name,
            flag_type,
            default_value,
            rules,
            environments,
            org_id,
            created_by,
        );
        self.repository.create(&flag).await?;
        self.recorder
            .append(&AuditEvent::new(
                flag.id,
                created_by,
                AuditEventKind::Created,
                None,
            ))
            .await?;

        info!(flag_id = %flag.id, name = %flag.name, "Created flag");
        Ok(flag)
    }

    /// Get a flag by ID, treating soft-deleted flags as gone
    pub async fn get(&self, flag_id: Uuid) -> Result<Flag> {
        let flag = self
            .repository
            .get(flag_id)
            .await?
            .ok_or_else(|| Error::FlagNotFound(flag_id.to_string()))?;
        if flag.is_deleted() {
            return Err(Error::FlagNotFound(flag_id.to_string()));
        }
        Ok(flag)
    }

    /// List flags for an organization
    pub async fn list_by_org(&self, org_id: Uuid, limit: Option<i32>) -> Result<Vec<FlagSummary>> {
        self.repository.list_by_org(org_id, limit).await
    }

    /// Soft-delete a flag
    ///
    /// The row and its audit trail survive; the flag just stops
    /// resolving through `get` and listings.
    pub async fn soft_delete(&self, flag_id: Uuid, actor_id: Uuid) -> Result<()> {
        let mut flag = self.get(flag_id).await?;
        flag.soft_delete();
        self.repository.update(&mut flag).await?;
        self.recorder
            .append(&AuditEvent::new(
                flag_id,
                actor_id,
                AuditEventKind::Deleted,
                None,
            ))
            .await?;

        info!(flag_id = %flag_id, "Soft-deleted flag");
        Ok(())
    }

    // ========== Revision Lifecycle ==========

    /// Add a draft revision to a flag's timeline
    pub async fn create_draft(
        &self,
        flag_id: Uuid,
        default_value: String,
        rules: Vec<Rule>,
        actor_id: Uuid,
    ) -> Result<Revision> {
        let mut flag = self.get(flag_id).await?;
        let revision = flag.create_draft(default_value, rules, actor_id);
        self.repository.update(&mut flag).await?;
        self.recorder
            .append(&AuditEvent::for_revision(
                flag_id,
                actor_id,
                AuditEventKind::RevisionCreated,
                revision.id,
            ))
            .await?;

        info!(flag_id = %flag_id, revision_id = %revision.id, "Created draft revision");
        Ok(revision)
    }

    /// Approve a draft revision, making it live
    pub async fn approve_revision(
        &self,
        flag_id: Uuid,
        revision_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Flag> {
        let mut flag = self.get(flag_id).await?;
        flag.approve(revision_id)?;
        self.repository.update(&mut flag).await?;
        self.recorder
            .append(&AuditEvent::for_revision(
                flag_id,
                actor_id,
                AuditEventKind::RevisionApproved,
                revision_id,
            ))
            .await?;

        info!(
            flag_id = %flag_id,
            revision_id = %revision_id,
            version = flag.version,
            "Approved revision"
        );
        Ok(flag)
    }

    /// Roll back the live revision one step
    ///
    /// Returns the restored revision, or `None` when the live revision
    /// had no predecessor and the flag is left with nothing live.
    pub async fn rollback(&self, flag_id: Uuid, actor_id: Uuid) -> Result<Option<Revision>> {
        let mut flag = self.get(flag_id).await?;
        let restored = flag.rollback()?;
        self.repository.update(&mut flag).await?;

        let data = restored
            .as_ref()
            .map(|r| serde_json::json!({ "restored_revision_id": r.id }));
        self.recorder
            .append(&AuditEvent::new(
                flag_id,
                actor_id,
                AuditEventKind::RolledBack,
                data,
            ))
            .await?;

        match &restored {
            Some(revision) => {
                info!(flag_id = %flag_id, restored = %revision.id, "Rolled back to previous revision")
            }
            None => info!(flag_id = %flag_id, "Rolled back; no revision is live"),
        }
        Ok(restored)
    }

    // ========== Environments ==========

    /// Toggle an environment on or off
    ///
    /// Unknown environment names are a no-op on the flag, logged and
    /// recorded like any other toggle attempt.
    pub async fn toggle_environment(
        &self,
        flag_id: Uuid,
        environment: &str,
        actor_id: Uuid,
    ) -> Result<Flag> {
        let mut flag = self.get(flag_id).await?;
        let matched = flag.toggle_environment(environment);
        if !matched {
            warn!(flag_id = %flag_id, environment = %environment, "Toggle matched no environment");
        }
        self.repository.update(&mut flag).await?;
        self.recorder
            .append(&AuditEvent::for_toggle(flag_id, actor_id, environment))
            .await?;

        info!(flag_id = %flag_id, environment = %environment, "Toggled environment");
        Ok(flag)
    }

    // ========== Audit ==========

    /// Fetch a flag's audit trail in recorded order
    ///
    /// Works for soft-deleted flags too; the trail outlives the flag.
    pub async fn audit_trail(&self, flag_id: Uuid) -> Result<Vec<AuditEvent>> {
        if self.repository.get(flag_id).await?.is_none() {
            return Err(Error::FlagNotFound(flag_id.to_string()));
        }
        self.recorder.list_for_flag(flag_id).await
    }
}
