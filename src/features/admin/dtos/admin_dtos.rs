use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::admin::models::{AuditAction, AuditLog};
use crate::features::files::dtos::UserFileResponseDto;
use crate::features::projects::dtos::{ProjectResponseDto, StatusCountDto};
use crate::features::projects::models::ProjectStatus;
use crate::features::users::models::UserRole;
use crate::shared::constants::DEFAULT_PAGE_SIZE;
use crate::shared::types::PaginationQuery;

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Turn a free-text search into an ILIKE pattern. Wildcards typed by the
/// caller are matched literally.
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    let trimmed = search.map(str::trim).filter(|s| !s.is_empty())?;
    let escaped = trimmed
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{}%", escaped))
}

// =============================================================================
// STATS
// =============================================================================

/// System-wide totals
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminStatsDto {
    pub total_users: i64,
    pub total_admins: i64,
    pub total_projects: i64,
    pub projects_by_status: Vec<StatusCountDto>,
    pub total_files: i64,
    pub total_attachments: i64,
    /// Bytes used by files and attachments together
    pub storage_bytes: i64,
}

// =============================================================================
// USER DTOs
// =============================================================================

/// Query params for listing users
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct UserQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
    /// Search in name or email
    pub search: Option<String>,
}

impl UserQueryParams {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Admin view of a user account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AdminUserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub project_count: i64,
    pub file_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for changing a user's role
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleDto {
    pub role: UserRole,
}

/// Result of a role change
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleUpdateDto {
    pub id: Uuid,
    pub role: UserRole,
    /// False when the user already had the role
    pub changed: bool,
}

// =============================================================================
// PROJECT DTOs
// =============================================================================

/// Query params for listing projects across all users
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AdminProjectQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
    /// Filter by status
    pub status: Option<ProjectStatus>,
    /// Search in project name or owner email
    pub search: Option<String>,
}

impl AdminProjectQueryParams {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Admin view of a project with its owner
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AdminProjectDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub owner_email: String,
    pub file_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for changing a project's status
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusDto {
    pub status: ProjectStatus,
}

/// Result of a status change
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusUpdateDto {
    pub project: ProjectResponseDto,
    /// False when the project already had the status
    pub changed: bool,
}

// =============================================================================
// FILE DTOs
// =============================================================================

/// Query params for listing every stored file
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AdminFileQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
    /// Filter by owner
    pub owner_id: Option<Uuid>,
}

impl AdminFileQueryParams {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Admin view of a file with its owner's email
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminFileDto {
    #[serde(flatten)]
    pub file: UserFileResponseDto,
    pub owner_email: String,
}

// =============================================================================
// AUDIT LOG DTOs
// =============================================================================

/// Query params for browsing the audit trail
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AuditLogQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
    /// Filter by action
    pub action: Option<AuditAction>,
}

impl AuditLogQueryParams {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Audit trail entry
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditLogDto {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: AuditAction,
    pub target_type: String,
    pub target_id: Uuid,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLog> for AuditLogDto {
    fn from(log: AuditLog) -> Self {
        Self {
            id: log.id,
            actor_id: log.actor_id,
            action: log.action,
            target_type: log.target_type,
            target_id: log.target_id,
            details: log.details,
            created_at: log.created_at,
        }
    }
}

/// Response DTO for admin deletions
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminDeleteDto {
    pub id: Uuid,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::MAX_PAGE_SIZE;

    #[test]
    fn test_search_pattern() {
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(
            search_pattern(Some(" สมชาย ")),
            Some("%สมชาย%".to_string())
        );
        assert_eq!(
            search_pattern(Some("50%_off")),
            Some("%50\\%\\_off%".to_string())
        );
    }

    #[test]
    fn test_pagination_clamps() {
        let params: UserQueryParams =
            serde_json::from_value(serde_json::json!({"page": 3, "page_size": 500})).unwrap();
        assert_eq!(params.pagination().limit(), MAX_PAGE_SIZE);
        assert_eq!(params.pagination().offset(), 2 * MAX_PAGE_SIZE);

        let defaults: AuditLogQueryParams = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults.pagination().offset(), 0);
        assert_eq!(defaults.pagination().limit(), DEFAULT_PAGE_SIZE);
        assert!(defaults.action.is_none());
    }

    #[test]
    fn test_status_update_rejects_unknown_status() {
        assert!(serde_json::from_str::<UpdateStatusDto>(r#"{"status":"อนุมัติ"}"#).is_err());
        let dto: UpdateStatusDto = serde_json::from_str(r#"{"status":"เสร็จสิ้น"}"#).unwrap();
        assert_eq!(dto.status, ProjectStatus::Completed);
    }
}
