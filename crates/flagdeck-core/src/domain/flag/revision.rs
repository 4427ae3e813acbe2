//! Revision entity and status
//!
//! A revision is an immutable-once-created configuration snapshot with a
//! mutable status. Approved revisions keep a single backlink to the
//! revision they displaced, which is what makes one-step rollback possible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::flag::Rule;

/// Status of a revision in the approval workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStatus {
    /// Not yet promoted to live
    Draft,
    /// The single currently-active revision
    Live,
    /// Previously live, displaced by a later approval
    Archived,
}

impl RevisionStatus {
    /// Create from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "live" => Some(Self::Live),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Live => "live",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for RevisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A versioned configuration snapshot attached to a flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revision {
    /// Unique revision identifier
    pub id: Uuid,

    /// Current workflow status
    pub status: RevisionStatus,

    /// Default value served when no rule matches
    pub default_value: String,

    /// Targeting rules, opaque to the lifecycle and carried verbatim
    pub rules: Vec<Rule>,

    /// Who drafted this revision
    pub created_by: Uuid,

    /// When the revision was drafted
    pub created_at: DateTime<Utc>,

    /// Backlink to the revision that was live immediately before this one
    /// became live. Set by approval, consumed (cleared) by rollback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_revision_id: Option<Uuid>,
}

impl Revision {
    /// Create a new draft revision with no backlink
    pub fn new(default_value: String, rules: Vec<Rule>, created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: RevisionStatus::Draft,
            default_value,
            rules,
            created_by,
            created_at: Utc::now(),
            last_revision_id: None,
        }
    }

    /// Check if this revision is the active one
    pub fn is_live(&self) -> bool {
        self.status == RevisionStatus::Live
    }

    /// Check if this revision is still a draft
    pub fn is_draft(&self) -> bool {
        self.status == RevisionStatus::Draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_str() {
        assert_eq!(RevisionStatus::from_str("draft"), Some(RevisionStatus::Draft));
        assert_eq!(RevisionStatus::from_str("LIVE"), Some(RevisionStatus::Live));
        assert_eq!(RevisionStatus::from_str("Archived"), Some(RevisionStatus::Archived));
        assert_eq!(RevisionStatus::from_str("invalid"), None);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [RevisionStatus::Draft, RevisionStatus::Live, RevisionStatus::Archived] {
            assert_eq!(RevisionStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_new_revision_is_draft_without_backlink() {
        let author = Uuid::new_v4();
        let revision = Revision::new("true".to_string(), vec![], author);

        assert!(revision.is_draft());
        assert!(!revision.is_live());
        assert_eq!(revision.created_by, author);
        assert_eq!(revision.last_revision_id, None);
    }
}
