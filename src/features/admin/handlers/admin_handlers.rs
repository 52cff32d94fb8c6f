use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::admin::dtos::*;
use crate::features::admin::services::AdminService;
use crate::features::auth::guards::RequireAdmin;
use crate::shared::types::{ApiResponse, Meta};

/// System-wide totals
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Totals", body = ApiResponse<AdminStatsDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_stats(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
) -> Result<Json<ApiResponse<AdminStatsDto>>> {
    let stats = service.stats().await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

// =============================================================================
// USERS
// =============================================================================

/// List user accounts (paginated, searchable)
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UserQueryParams),
    responses(
        (status = 200, description = "List of users", body = ApiResponse<Vec<AdminUserDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(params): Query<UserQueryParams>,
) -> Result<Json<ApiResponse<Vec<AdminUserDto>>>> {
    let (items, total) = service.list_users(&params).await?;

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::paged(total, &params.pagination())),
    )))
}

/// Change a user's role
#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleDto,
    responses(
        (status = 200, description = "Role updated (or already set)", body = ApiResponse<RoleUpdateDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required, or changing own role"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Would leave no admin")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_user_role(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateRoleDto>,
) -> Result<Json<ApiResponse<RoleUpdateDto>>> {
    let result = service.update_user_role(&user, id, dto.role).await?;
    let message = if result.changed {
        "เปลี่ยนสิทธิ์ผู้ใช้เรียบร้อยแล้ว"
    } else {
        "ผู้ใช้มีสิทธิ์นี้อยู่แล้ว"
    };
    Ok(Json(ApiResponse::success(
        Some(result),
        Some(message.to_string()),
        None,
    )))
}

/// Delete a user account with all of its projects and files
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = ApiResponse<AdminDeleteDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required, or deleting own account"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Would leave no admin")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_user(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AdminDeleteDto>>> {
    service.delete_user(&user, id).await?;
    Ok(Json(ApiResponse::success(
        Some(AdminDeleteDto { id, deleted: true }),
        Some("ลบผู้ใช้เรียบร้อยแล้ว".to_string()),
        None,
    )))
}

// =============================================================================
// PROJECTS
// =============================================================================

/// List projects across all users
#[utoipa::path(
    get,
    path = "/api/admin/projects",
    params(AdminProjectQueryParams),
    responses(
        (status = 200, description = "List of projects", body = ApiResponse<Vec<AdminProjectDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_projects(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(params): Query<AdminProjectQueryParams>,
) -> Result<Json<ApiResponse<Vec<AdminProjectDto>>>> {
    let (items, total) = service.list_projects(&params).await?;

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::paged(total, &params.pagination())),
    )))
}

/// Change a project's status
#[utoipa::path(
    patch,
    path = "/api/admin/projects/{id}/status",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = UpdateStatusDto,
    responses(
        (status = 200, description = "Status updated (or already set)", body = ApiResponse<StatusUpdateDto>),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "Project not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_project_status(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateStatusDto>,
) -> Result<Json<ApiResponse<StatusUpdateDto>>> {
    let result = service.update_project_status(&user, id, dto.status).await?;
    Ok(Json(ApiResponse::success(Some(result), None, None)))
}

/// Delete any project
#[utoipa::path(
    delete,
    path = "/api/admin/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project deleted", body = ApiResponse<AdminDeleteDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "Project not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_project(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AdminDeleteDto>>> {
    service.delete_project(&user, id).await?;
    Ok(Json(ApiResponse::success(
        Some(AdminDeleteDto { id, deleted: true }),
        Some("ลบโครงการเรียบร้อยแล้ว".to_string()),
        None,
    )))
}

// =============================================================================
// FILES
// =============================================================================

/// List every stored file
#[utoipa::path(
    get,
    path = "/api/admin/files",
    params(AdminFileQueryParams),
    responses(
        (status = 200, description = "List of files", body = ApiResponse<Vec<AdminFileDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(params): Query<AdminFileQueryParams>,
) -> Result<Json<ApiResponse<Vec<AdminFileDto>>>> {
    let (items, total) = service.list_files(&params).await?;

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::paged(total, &params.pagination())),
    )))
}

/// Delete any file
#[utoipa::path(
    delete,
    path = "/api/admin/files/{id}",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File deleted", body = ApiResponse<AdminDeleteDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "File not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AdminDeleteDto>>> {
    service.delete_file(&user, id).await?;
    Ok(Json(ApiResponse::success(
        Some(AdminDeleteDto { id, deleted: true }),
        Some("ลบไฟล์เรียบร้อยแล้ว".to_string()),
        None,
    )))
}

// =============================================================================
// AUDIT LOGS
// =============================================================================

/// Browse the audit trail, newest first
#[utoipa::path(
    get,
    path = "/api/admin/audit-logs",
    params(AuditLogQueryParams),
    responses(
        (status = 200, description = "Audit entries", body = ApiResponse<Vec<AuditLogDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_audit_logs(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(params): Query<AuditLogQueryParams>,
) -> Result<Json<ApiResponse<Vec<AuditLogDto>>>> {
    let (items, total) = service.list_audit_logs(&params).await?;

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::paged(total, &params.pagination())),
    )))
}
