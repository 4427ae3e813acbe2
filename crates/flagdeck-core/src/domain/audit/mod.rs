//! Audit trail for flag lifecycle activity

pub mod event;
pub mod recorder;

pub use event::{AuditEvent, AuditEventKind};
pub use recorder::AuditRecorder;
