//! Storage layer for flagdeck
//!
//! SQLite-backed persistence with connection pooling and versioned
//! schema migrations.

pub mod database;
pub mod migrations;

pub use database::{Database, DatabaseConfig};
pub use migrations::MigrationStatus;
