use sqlx::PgPool;
use tracing::info;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::AuthUserDto;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::password::{hash_password, verify_password};
use crate::features::files::models::{UserFile, USER_FILE_COLUMNS};
use crate::features::projects::dtos::status_counts;
use crate::features::projects::models::ProjectStatus;
use crate::features::users::dtos::{ChangePasswordDto, DashboardDto, UpdateProfileDto};
use crate::features::users::models::{User, USER_COLUMNS};
use crate::shared::thai::clean_single_line;

const RECENT_FILES: i64 = 5;

/// Service for the signed-in user's own account
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find(&self, id: uuid::Uuid) -> Result<User> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::Unauthorized("ไม่พบบัญชีผู้ใช้".to_string()))
    }

    pub async fn update_profile(
        &self,
        user: &AuthenticatedUser,
        dto: UpdateProfileDto,
    ) -> Result<AuthUserDto> {
        let name = clean_single_line(&dto.name);
        if name.is_empty() {
            return Err(AppError::Validation("กรุณากรอกชื่อ".to_string()));
        }

        let sql = format!(
            "UPDATE users SET name = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        );
        let updated = sqlx::query_as::<_, User>(&sql)
            .bind(&name)
            .bind(user.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::Unauthorized("ไม่พบบัญชีผู้ใช้".to_string()))?;

        info!("Profile updated: id={}", user.id);
        Ok(updated.into())
    }

    /// Replace the password after checking the current one
    pub async fn change_password(
        &self,
        user: &AuthenticatedUser,
        dto: ChangePasswordDto,
    ) -> Result<()> {
        let account = self.find(user.id).await?;

        if !verify_password(&dto.current_password, Some(&account.password_hash)).await? {
            return Err(AppError::BadRequest(
                "รหัสผ่านปัจจุบันไม่ถูกต้อง".to_string(),
            ));
        }
        if dto.current_password == dto.new_password {
            return Err(AppError::Validation(
                "รหัสผ่านใหม่ต้องไม่ซ้ำกับรหัสผ่านเดิม".to_string(),
            ));
        }

        let new_hash = hash_password(&dto.new_password).await?;
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(&new_hash)
            .bind(user.id)
            .execute(&self.pool)
            .await?;

        info!("Password changed: id={}", user.id);
        Ok(())
    }

    pub async fn dashboard(&self, user: &AuthenticatedUser) -> Result<DashboardDto> {
        let rows = sqlx::query_as::<_, (ProjectStatus, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM projects
            WHERE owner_id = $1
            GROUP BY status
            "#,
        )
        .bind(user.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count projects for dashboard: {:?}", e);
            AppError::Database(e)
        })?;

        let file_count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_files WHERE owner_id = $1")
                .bind(user.id)
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            r#"
            SELECT {} FROM user_files
            WHERE owner_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
            USER_FILE_COLUMNS
        );
        let recent = sqlx::query_as::<_, UserFile>(&sql)
            .bind(user.id)
            .bind(RECENT_FILES)
            .fetch_all(&self.pool)
            .await?;

        Ok(DashboardDto {
            project_total: rows.iter().map(|(_, count)| count).sum(),
            projects_by_status: status_counts(&rows),
            file_count,
            recent_files: recent.into_iter().map(Into::into).collect(),
        })
    }
}
