//! Flagdeck Core Library
//!
//! This crate provides the core functionality for flagdeck, including:
//! - Flag aggregate and revision lifecycle (draft, approve, rollback)
//! - Per-environment enable/disable toggles
//! - Append-only audit trail for every mutation
//! - Storage (SQLite with versioned migrations)
//! - Configuration management

pub mod config;
pub mod domain;
pub mod error;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::audit::{AuditEvent, AuditEventKind, AuditRecorder};
    pub use crate::domain::flag::{
        Environment, Flag, FlagManager, FlagRepository, FlagType, Revision, RevisionStatus, Rule,
    };
    pub use crate::error::{Error, Result};
    pub use crate::storage::Database;
}
