//! Domain layer
//!
//! Contains the core business logic and domain models.

pub mod audit;
pub mod flag;
