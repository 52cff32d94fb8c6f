use serde_json::json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::admin::dtos::*;
use crate::features::admin::models::{AuditAction, AuditLog, AUDIT_LOG_COLUMNS};
use crate::features::admin::services::audit;
use crate::features::admin::services::role_rules::{
    ensure_admin_remains, ensure_not_self, plan_role_change, RoleChange,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::models::{UserFile, USER_FILE_COLUMNS};
use crate::features::files::services::storage_paths;
use crate::features::projects::dtos::status_counts;
use crate::features::projects::models::{Project, ProjectStatus, PROJECT_COLUMNS};
use crate::features::users::models::{User, UserRole, USER_COLUMNS};
use crate::modules::storage::LocalStorage;

const USER_NOT_FOUND: &str = "ไม่พบผู้ใช้";
const PROJECT_NOT_FOUND: &str = "ไม่พบโครงการ";
const FILE_NOT_FOUND: &str = "ไม่พบไฟล์";

#[derive(FromRow)]
struct Totals {
    total_users: i64,
    total_admins: i64,
    total_files: i64,
    total_attachments: i64,
    storage_bytes: i64,
}

#[derive(FromRow)]
struct FileWithOwner {
    #[sqlx(flatten)]
    file: UserFile,
    owner_email: String,
}

/// Advisory lock key serializing changes to the admin set
const ADMIN_SET_LOCK: i64 = 0x5341_5241_4241_4e00;

/// Held until the transaction ends, so concurrent demotions or deletions
/// count admins one at a time.
async fn lock_admin_set(tx: &mut Transaction<'_, Postgres>) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(ADMIN_SET_LOCK)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn count_admins(tx: &mut Transaction<'_, Postgres>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = $1")
        .bind(UserRole::Admin)
        .fetch_one(&mut **tx)
        .await?;
    Ok(count)
}

/// Service for the back-office. Every mutation writes its audit entry in
/// the same transaction as the change.
pub struct AdminService {
    pool: PgPool,
    storage: Arc<LocalStorage>,
}

impl AdminService {
    pub fn new(pool: PgPool, storage: Arc<LocalStorage>) -> Self {
        Self { pool, storage }
    }

    // =========================================================================
    // STATS
    // =========================================================================

    pub async fn stats(&self) -> Result<AdminStatsDto> {
        let totals = sqlx::query_as::<_, Totals>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM users WHERE role = $1) AS total_admins,
                (SELECT COUNT(*) FROM user_files) AS total_files,
                (SELECT COUNT(*) FROM attachment_files) AS total_attachments,
                (
                    (SELECT COALESCE(SUM(size_bytes), 0) FROM user_files)
                    + (SELECT COALESCE(SUM(size_bytes), 0) FROM attachment_files)
                )::BIGINT AS storage_bytes
            "#,
        )
        .bind(UserRole::Admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load admin totals: {:?}", e);
            AppError::Database(e)
        })?;

        let by_status = sqlx::query_as::<_, (ProjectStatus, i64)>(
            "SELECT status, COUNT(*) FROM projects GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(AdminStatsDto {
            total_users: totals.total_users,
            total_admins: totals.total_admins,
            total_projects: by_status.iter().map(|(_, count)| count).sum(),
            projects_by_status: status_counts(&by_status),
            total_files: totals.total_files,
            total_attachments: totals.total_attachments,
            storage_bytes: totals.storage_bytes,
        })
    }

    // =========================================================================
    // USERS
    // =========================================================================

    pub async fn list_users(&self, params: &UserQueryParams) -> Result<(Vec<AdminUserDto>, i64)> {
        let pagination = params.pagination();
        let pattern = search_pattern(params.search.as_deref());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count users: {:?}", e);
            AppError::Database(e)
        })?;

        let users = sqlx::query_as::<_, AdminUserDto>(
            r#"
            SELECT
                u.id, u.name, u.email, u.role,
                (SELECT COUNT(*) FROM projects p WHERE p.owner_id = u.id) AS project_count,
                (SELECT COUNT(*) FROM user_files f WHERE f.owner_id = u.id) AS file_count,
                u.created_at
            FROM users u
            WHERE ($1::text IS NULL OR u.name ILIKE $1 OR u.email ILIKE $1)
            ORDER BY u.created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(&pattern)
        .bind(pagination.offset())
        .bind(pagination.limit())
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total))
    }

    pub async fn update_user_role(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        role: UserRole,
    ) -> Result<RoleUpdateDto> {
        let mut tx = self.pool.begin().await?;
        lock_admin_set(&mut tx).await?;

        let sql = format!("SELECT {} FROM users WHERE id = $1 FOR UPDATE", USER_COLUMNS);
        let target = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

        let admin_count = count_admins(&mut tx).await?;

        match plan_role_change(actor.id, id, target.role, role, admin_count)? {
            RoleChange::Unchanged => {
                return Ok(RoleUpdateDto {
                    id,
                    role,
                    changed: false,
                })
            }
            RoleChange::Apply => {}
        }

        sqlx::query("UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2")
            .bind(role)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        audit::record(
            &mut *tx,
            actor.id,
            AuditAction::UpdateUserRole,
            id,
            json!({ "email": target.email, "from": target.role, "to": role }),
        )
        .await?;

        tx.commit().await?;

        info!(
            "User role changed: id={}, {} -> {}, by={}",
            id, target.role, role, actor.id
        );
        Ok(RoleUpdateDto {
            id,
            role,
            changed: true,
        })
    }

    /// Delete the account. Projects, files and attachments cascade; their
    /// bytes are removed after commit.
    pub async fn delete_user(&self, actor: &AuthenticatedUser, id: Uuid) -> Result<()> {
        ensure_not_self(actor.id, id)?;

        let mut tx = self.pool.begin().await?;
        lock_admin_set(&mut tx).await?;

        let sql = format!("SELECT {} FROM users WHERE id = $1 FOR UPDATE", USER_COLUMNS);
        let target = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

        if target.role.is_admin() {
            let admin_count = count_admins(&mut tx).await?;
            ensure_admin_remains(target.role, admin_count)?;
        }

        let paths = storage_paths::for_owner(&mut *tx, id).await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        audit::record(
            &mut *tx,
            actor.id,
            AuditAction::DeleteUser,
            id,
            json!({
                "email": target.email,
                "name": target.name,
                "role": target.role,
                "files_removed": paths.len(),
            }),
        )
        .await?;

        tx.commit().await?;

        self.storage.delete_all(&paths).await;
        info!(
            "User deleted: id={}, files removed={}, by={}",
            id,
            paths.len(),
            actor.id
        );
        Ok(())
    }

    // =========================================================================
    // PROJECTS
    // =========================================================================

    pub async fn list_projects(
        &self,
        params: &AdminProjectQueryParams,
    ) -> Result<(Vec<AdminProjectDto>, i64)> {
        let pagination = params.pagination();
        let pattern = search_pattern(params.search.as_deref());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM projects p
            JOIN users u ON u.id = p.owner_id
            WHERE ($1::project_status IS NULL OR p.status = $1)
              AND ($2::text IS NULL OR p.name ILIKE $2 OR u.email ILIKE $2)
            "#,
        )
        .bind(params.status)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count projects: {:?}", e);
            AppError::Database(e)
        })?;

        let projects = sqlx::query_as::<_, AdminProjectDto>(
            r#"
            SELECT
                p.id, p.name, p.description, p.status, p.owner_id,
                u.name AS owner_name,
                u.email AS owner_email,
                (SELECT COUNT(*) FROM user_files f WHERE f.project_id = p.id) AS file_count,
                p.created_at, p.updated_at
            FROM projects p
            JOIN users u ON u.id = p.owner_id
            WHERE ($1::project_status IS NULL OR p.status = $1)
              AND ($2::text IS NULL OR p.name ILIKE $2 OR u.email ILIKE $2)
            ORDER BY p.created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(params.status)
        .bind(&pattern)
        .bind(pagination.offset())
        .bind(pagination.limit())
        .fetch_all(&self.pool)
        .await?;

        Ok((projects, total))
    }

    /// Set a project's status. Writes nothing when the status is unchanged.
    pub async fn update_project_status(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        status: ProjectStatus,
    ) -> Result<StatusUpdateDto> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM projects WHERE id = $1 FOR UPDATE",
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(PROJECT_NOT_FOUND.to_string()))?;

        if project.status == status {
            return Ok(StatusUpdateDto {
                project: project.into(),
                changed: false,
            });
        }

        let sql = format!(
            "UPDATE projects SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            PROJECT_COLUMNS
        );
        let updated = sqlx::query_as::<_, Project>(&sql)
            .bind(status)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        audit::record(
            &mut *tx,
            actor.id,
            AuditAction::UpdateProjectStatus,
            id,
            json!({ "name": project.name, "from": project.status, "to": status }),
        )
        .await?;

        tx.commit().await?;

        info!(
            "Project status changed: id={}, {} -> {}, by={}",
            id, project.status, status, actor.id
        );
        Ok(StatusUpdateDto {
            project: updated.into(),
            changed: true,
        })
    }

    pub async fn delete_project(&self, actor: &AuthenticatedUser, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM projects WHERE id = $1 FOR UPDATE",
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(PROJECT_NOT_FOUND.to_string()))?;

        let paths = storage_paths::for_project(&mut *tx, id).await?;

        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        audit::record(
            &mut *tx,
            actor.id,
            AuditAction::DeleteProject,
            id,
            json!({
                "name": project.name,
                "owner_id": project.owner_id,
                "files_removed": paths.len(),
            }),
        )
        .await?;

        tx.commit().await?;

        self.storage.delete_all(&paths).await;
        info!("Project deleted by admin: id={}, by={}", id, actor.id);
        Ok(())
    }

    // =========================================================================
    // FILES
    // =========================================================================

    pub async fn list_files(
        &self,
        params: &AdminFileQueryParams,
    ) -> Result<(Vec<AdminFileDto>, i64)> {
        let pagination = params.pagination();

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM user_files WHERE ($1::uuid IS NULL OR owner_id = $1)",
        )
        .bind(params.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count files: {:?}", e);
            AppError::Database(e)
        })?;

        let sql = format!(
            r#"
            SELECT {},
                (SELECT u.email FROM users u WHERE u.id = user_files.owner_id) AS owner_email
            FROM user_files
            WHERE ($1::uuid IS NULL OR owner_id = $1)
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#,
            USER_FILE_COLUMNS
        );
        let rows = sqlx::query_as::<_, FileWithOwner>(&sql)
            .bind(params.owner_id)
            .bind(pagination.offset())
            .bind(pagination.limit())
            .fetch_all(&self.pool)
            .await?;

        let files = rows
            .into_iter()
            .map(|row| AdminFileDto {
                file: row.file.into(),
                owner_email: row.owner_email,
            })
            .collect();

        Ok((files, total))
    }

    pub async fn delete_file(&self, actor: &AuthenticatedUser, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM user_files WHERE id = $1 FOR UPDATE",
            USER_FILE_COLUMNS
        );
        let file = sqlx::query_as::<_, UserFile>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(FILE_NOT_FOUND.to_string()))?;

        let paths = storage_paths::for_file(&mut *tx, id).await?;

        sqlx::query("DELETE FROM user_files WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        audit::record(
            &mut *tx,
            actor.id,
            AuditAction::DeleteFile,
            id,
            json!({
                "original_name": file.original_name,
                "owner_id": file.owner_id,
                "size_bytes": file.size_bytes,
            }),
        )
        .await?;

        tx.commit().await?;

        self.storage.delete_all(&paths).await;
        info!("File deleted by admin: id={}, by={}", id, actor.id);
        Ok(())
    }

    // =========================================================================
    // AUDIT LOGS
    // =========================================================================

    pub async fn list_audit_logs(
        &self,
        params: &AuditLogQueryParams,
    ) -> Result<(Vec<AuditLogDto>, i64)> {
        let pagination = params.pagination();

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM audit_logs WHERE ($1::audit_action IS NULL OR action = $1)",
        )
        .bind(params.action)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count audit logs: {:?}", e);
            AppError::Database(e)
        })?;

        let sql = format!(
            r#"
            SELECT {} FROM audit_logs
            WHERE ($1::audit_action IS NULL OR action = $1)
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#,
            AUDIT_LOG_COLUMNS
        );
        let logs = sqlx::query_as::<_, AuditLog>(&sql)
            .bind(params.action)
            .bind(pagination.offset())
            .bind(pagination.limit())
            .fetch_all(&self.pool)
            .await?;

        Ok((logs.into_iter().map(Into::into).collect(), total))
    }
}
