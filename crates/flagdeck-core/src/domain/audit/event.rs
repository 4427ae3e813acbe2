//! Audit event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    /// Flag was created
    Created,
    /// A draft revision was added to the timeline
    RevisionCreated,
    /// A draft revision was promoted to live
    RevisionApproved,
    /// The live revision was rolled back
    RolledBack,
    /// An environment was toggled
    Toggled,
    /// Flag was soft-deleted
    Deleted,
}

impl AuditEventKind {
    /// Parse a kind from its stored string form
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "revision_created" => Some(Self::RevisionCreated),
            "revision_approved" => Some(Self::RevisionApproved),
            "rolled_back" => Some(Self::RolledBack),
            "toggled" => Some(Self::Toggled),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    /// String form used in storage and display
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::RevisionCreated => "revision_created",
            Self::RevisionApproved => "revision_approved",
            Self::RolledBack => "rolled_back",
            Self::Toggled => "toggled",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in a flag's audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event id
    pub id: Uuid,
    /// The flag this event belongs to
    pub flag_id: Uuid,
    /// Who performed the action
    pub actor_id: Uuid,
    /// What happened
    pub kind: AuditEventKind,
    /// Kind-specific payload (revision id, environment name, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// When it happened
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Create a new audit event
    pub fn new(
        flag_id: Uuid,
        actor_id: Uuid,
        kind: AuditEventKind,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            flag_id,
            actor_id,
            kind,
            data,
            created_at: Utc::now(),
        }
    }

    /// Event for a revision being drafted or approved
    pub fn for_revision(
        flag_id: Uuid,
        actor_id: Uuid,
        kind: AuditEventKind,
        revision_id: Uuid,
    ) -> Self {
        Self::new(
            flag_id,
            actor_id,
            kind,
            Some(serde_json::json!({ "revision_id": revision_id })),
        )
    }

    /// Event for an environment toggle
    pub fn for_toggle(flag_id: Uuid, actor_id: Uuid, environment: &str) -> Self {
        Self::new(
            flag_id,
            actor_id,
            AuditEventKind::Toggled,
            Some(serde_json::json!({ "environment": environment })),
        )
    }
}
