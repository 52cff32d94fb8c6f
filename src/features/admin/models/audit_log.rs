use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Column list matching [`AuditLog`]'s field order
pub const AUDIT_LOG_COLUMNS: &str =
    "id, actor_id, action, target_type, target_id, details, created_at";

/// Admin mutation recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "audit_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    UpdateUserRole,
    DeleteUser,
    UpdateProjectStatus,
    DeleteProject,
    DeleteFile,
}

impl AuditAction {
    /// Kind of row the action targets
    pub fn target_type(&self) -> &'static str {
        match self {
            AuditAction::UpdateUserRole | AuditAction::DeleteUser => "user",
            AuditAction::UpdateProjectStatus | AuditAction::DeleteProject => "project",
            AuditAction::DeleteFile => "file",
        }
    }
}

/// Append-only audit entry
#[derive(Debug, Clone, FromRow)]
pub struct AuditLog {
    pub id: Uuid,
    /// Null once the acting admin's account is deleted
    pub actor_id: Option<Uuid>,
    pub action: AuditAction,
    pub target_type: String,
    pub target_id: Uuid,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AuditAction::UpdateProjectStatus).unwrap(),
            "\"update_project_status\""
        );
        let action: AuditAction = serde_json::from_str("\"delete_file\"").unwrap();
        assert_eq!(action, AuditAction::DeleteFile);
    }

    #[test]
    fn test_target_types() {
        assert_eq!(AuditAction::DeleteUser.target_type(), "user");
        assert_eq!(AuditAction::UpdateProjectStatus.target_type(), "project");
        assert_eq!(AuditAction::DeleteFile.target_type(), "file");
    }
}
