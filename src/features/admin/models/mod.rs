mod audit_log;

pub use audit_log::{AuditAction, AuditLog, AUDIT_LOG_COLUMNS};
