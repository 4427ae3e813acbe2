//! Feature flag domain
//!
//! The `Flag` aggregate owns a timeline of configuration revisions and a
//! fixed set of deployment environments. Revision transitions (draft,
//! approve, rollback) live in `lifecycle`; persistence in `repository`;
//! high-level orchestration in `manager`.

pub mod flag;
pub mod lifecycle;
pub mod manager;
pub mod repository;
pub mod revision;

pub use flag::{Environment, Flag, FlagType, Rule};
pub use manager::FlagManager;
pub use repository::{FlagRepository, FlagSummary};
pub use revision::{Revision, RevisionStatus};
