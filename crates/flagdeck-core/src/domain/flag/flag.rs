//! Flag aggregate and related types
//!
//! A flag belongs to one organization and carries its value type, a
//! flag-level default served before any revision is approved, the
//! append-only revision timeline, and the per-environment switches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::revision::{Revision, RevisionStatus};

/// Value type served by a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    Boolean,
    Json,
    String,
    Number,
}

impl FlagType {
    /// Create from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "boolean" => Some(Self::Boolean),
            "json" => Some(Self::Json),
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Json => "json",
            Self::String => "string",
            Self::Number => "number",
        }
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A targeting rule: condition plus served value. Opaque to the
/// lifecycle state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Matching condition, carried verbatim
    pub condition: serde_json::Value,
    /// Value served when the condition matches
    pub value: String,
}

/// A named deployment target with an independent enable switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Environment name, case-sensitive and unique within a flag
    pub name: String,
    /// Whether the flag is served in this environment
    pub is_enabled: bool,
}

impl Environment {
    /// Create a new environment, disabled until explicitly toggled on
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_enabled: false,
        }
    }
}

/// Feature flag aggregate: revision timeline, environments, and the
/// monotonic lifecycle version counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flag {
    /// Unique flag identifier
    pub id: Uuid,

    /// Owning organization
    pub org_id: Uuid,

    /// Who created the flag
    pub created_by: Uuid,

    /// Human-readable flag name
    pub name: String,

    /// Value type served by this flag
    pub flag_type: FlagType,

    /// Default value served before any revision is approved
    pub default_value: String,

    /// Flag-level targeting rules, used until a revision goes live
    pub rules: Vec<Rule>,

    /// Lifecycle version. Starts at 1, moves only on approve (+1) and
    /// rollback (-1), deliberately unclamped.
    pub version: i64,

    /// Deployment environments, fixed at creation time
    pub environments: Vec<Environment>,

    /// Revision timeline, append-only in creation order
    pub revisions: Vec<Revision>,

    /// When the flag was created
    pub created_at: DateTime<Utc>,

    /// When the flag was last modified
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker; absent means alive
    pub deleted_at: Option<DateTime<Utc>>,

    /// Storage write counter used for optimistic concurrency checks.
    /// Bumped by the repository on every save; not the lifecycle version.
    #[serde(default)]
    pub seq: i64,
}

impl Flag {
    /// Create a new flag with an empty revision timeline and the given
    /// starter environments
    pub fn new(
        name: String,
        flag_type: FlagType,
        default_value: String,
        rules: Vec<Rule>,
        environments: Vec<String>,
        org_id: Uuid,
        created_by: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            org_id,
            created_by,
            name,
            flag_type,
            default_value,
            rules,
            version: 1,
            environments: environments.into_iter().map(Environment::new).collect(),
            revisions: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            seq: 0,
        }
    }

    /// Update the last-modified timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Mark the flag as deleted without removing it
    pub fn soft_delete(&mut self) {
        self.deleted_at = Some(Utc::now());
        self.touch();
    }

    /// Check whether the flag has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Get the currently live revision, if any
    pub fn live_revision(&self) -> Option<&Revision> {
        self.revisions.iter().find(|r| r.status == RevisionStatus::Live)
    }

    /// Look up a revision by id
    pub fn revision(&self, revision_id: Uuid) -> Option<&Revision> {
        self.revisions.iter().find(|r| r.id == revision_id)
    }

    /// Look up an environment by name, case-sensitive
    pub fn environment(&self, name: &str) -> Option<&Environment> {
        self.environments.iter().find(|e| e.name == name)
    }
}
