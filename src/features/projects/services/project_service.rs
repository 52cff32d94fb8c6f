use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::models::{UserFile, USER_FILE_COLUMNS};
use crate::features::files::services::storage_paths;
use crate::features::projects::dtos::{
    CreateProjectDto, ProjectDetailDto, ProjectQueryParams, UpdateProjectDto,
};
use crate::features::projects::models::{Project, ProjectStatus, PROJECT_COLUMNS};
use crate::modules::storage::LocalStorage;
use crate::shared::thai::{clean_single_line, clean_thai_text};
use crate::shared::types::PaginationQuery;

pub(crate) const PROJECT_NOT_FOUND: &str = "ไม่พบโครงการ";
pub(crate) const PROJECT_FORBIDDEN: &str = "คุณไม่มีสิทธิ์เข้าถึงโครงการนี้";

/// Fail unless the project exists and the user owns it (admins pass)
pub async fn ensure_project_access(
    pool: &PgPool,
    user: &AuthenticatedUser,
    project_id: Uuid,
) -> Result<()> {
    let owner_id = sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM projects WHERE id = $1")
        .bind(project_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(PROJECT_NOT_FOUND.to_string()))?;

    if !user.can_access(owner_id) {
        return Err(AppError::Forbidden(PROJECT_FORBIDDEN.to_string()));
    }
    Ok(())
}

/// Empty descriptions are stored as NULL
fn clean_description(description: Option<&str>) -> Option<String> {
    description
        .map(clean_thai_text)
        .filter(|d| !d.is_empty())
}

/// Field values after a PATCH
#[derive(Debug, PartialEq)]
struct ProjectChanges {
    name: String,
    description: Option<String>,
    status: ProjectStatus,
}

/// Merge a PATCH into the current row. `None` when nothing would change.
fn apply_update(current: &Project, dto: UpdateProjectDto) -> Result<Option<ProjectChanges>> {
    let name = match dto.name.as_deref().map(clean_single_line) {
        Some(name) if name.is_empty() => {
            return Err(AppError::Validation("กรุณากรอกชื่อโครงการ".to_string()))
        }
        Some(name) => name,
        None => current.name.clone(),
    };
    let description = match dto.description.as_deref() {
        Some(d) => clean_description(Some(d)),
        None => current.description.clone(),
    };
    let status = dto.status.unwrap_or(current.status);

    if name == current.name && description == current.description && status == current.status {
        return Ok(None);
    }
    Ok(Some(ProjectChanges {
        name,
        description,
        status,
    }))
}

/// Service for project CRUD scoped to the signed-in user
pub struct ProjectService {
    pool: PgPool,
    storage: Arc<LocalStorage>,
}

impl ProjectService {
    pub fn new(pool: PgPool, storage: Arc<LocalStorage>) -> Self {
        Self { pool, storage }
    }

    async fn find(&self, id: Uuid) -> Result<Project> {
        let sql = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(PROJECT_NOT_FOUND.to_string()))
    }

    /// Load a project the user may act on
    pub async fn get_accessible(&self, user: &AuthenticatedUser, id: Uuid) -> Result<Project> {
        let project = self.find(id).await?;
        if !user.can_access(project.owner_id) {
            return Err(AppError::Forbidden(PROJECT_FORBIDDEN.to_string()));
        }
        Ok(project)
    }

    /// List the user's own projects, newest first
    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        params: &ProjectQueryParams,
    ) -> Result<(Vec<Project>, i64)> {
        let pagination = params.pagination();

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM projects
            WHERE owner_id = $1 AND ($2::project_status IS NULL OR status = $2)
            "#,
        )
        .bind(user.id)
        .bind(params.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count projects: {:?}", e);
            AppError::Database(e)
        })?;

        let sql = format!(
            r#"
            SELECT {} FROM projects
            WHERE owner_id = $1 AND ($2::project_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
            PROJECT_COLUMNS
        );
        let projects = sqlx::query_as::<_, Project>(&sql)
            .bind(user.id)
            .bind(params.status)
            .bind(pagination.offset())
            .bind(pagination.limit())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list projects: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((projects, total))
    }

    pub async fn create(&self, user: &AuthenticatedUser, dto: CreateProjectDto) -> Result<Project> {
        let name = clean_single_line(&dto.name);
        if name.is_empty() {
            return Err(AppError::Validation("กรุณากรอกชื่อโครงการ".to_string()));
        }

        let sql = format!(
            r#"
            INSERT INTO projects (name, description, status, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(&name)
            .bind(clean_description(dto.description.as_deref()))
            .bind(ProjectStatus::default())
            .bind(user.id)
            .fetch_one(&self.pool)
            .await?;

        info!("Project created: id={}, owner={}", project.id, user.id);
        Ok(project)
    }

    pub async fn get_detail(&self, user: &AuthenticatedUser, id: Uuid) -> Result<ProjectDetailDto> {
        let project = self.get_accessible(user, id).await?;

        let file_count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_files WHERE project_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(ProjectDetailDto {
            project: project.into(),
            file_count,
        })
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        dto: UpdateProjectDto,
    ) -> Result<Project> {
        let current = self.get_accessible(user, id).await?;

        let Some(changes) = apply_update(&current, dto)? else {
            return Ok(current);
        };

        let sql = format!(
            r#"
            UPDATE projects
            SET name = $2, description = $3, status = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(&changes.name)
            .bind(changes.description)
            .bind(changes.status)
            .fetch_one(&self.pool)
            .await?;

        info!("Project updated: id={}", project.id);
        Ok(project)
    }

    /// Delete the project; its files cascade in the database, then their bytes are removed
    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<()> {
        self.get_accessible(user, id).await?;

        let paths = storage_paths::for_project(&self.pool, id).await?;

        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.storage.delete_all(&paths).await;
        info!("Project deleted: id={}, files removed={}", id, paths.len());
        Ok(())
    }

    /// Files filed under a project, newest first
    pub async fn list_files(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<UserFile>, i64)> {
        self.get_accessible(user, id).await?;

        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_files WHERE project_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            r#"
            SELECT {} FROM user_files
            WHERE project_id = $1
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#,
            USER_FILE_COLUMNS
        );
        let files = sqlx::query_as::<_, UserFile>(&sql)
            .bind(id)
            .bind(pagination.offset())
            .bind(pagination.limit())
            .fetch_all(&self.pool)
            .await?;

        Ok((files, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn project() -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "โครงการพัฒนาแหล่งน้ำ".to_string(),
            description: Some("ขุดลอกคลอง".to_string()),
            status: ProjectStatus::Pending,
            owner_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn patch(
        name: Option<&str>,
        description: Option<&str>,
        status: Option<ProjectStatus>,
    ) -> UpdateProjectDto {
        UpdateProjectDto {
            name: name.map(str::to_string),
            description: description.map(str::to_string),
            status,
        }
    }

    #[test]
    fn test_update_with_current_values_is_noop() {
        let current = project();
        let dto = patch(
            Some(" โครงการพัฒนาแหล่งน้ำ "),
            Some("ขุดลอกคลอง"),
            Some(ProjectStatus::Pending),
        );
        assert_eq!(apply_update(&current, dto).unwrap(), None);
        assert_eq!(apply_update(&current, patch(None, None, None)).unwrap(), None);
    }

    #[test]
    fn test_update_status_only() {
        let current = project();
        let dto = patch(None, None, Some(ProjectStatus::InProgress));
        let changes = apply_update(&current, dto).unwrap().unwrap();

        assert_eq!(changes.status, ProjectStatus::InProgress);
        assert_eq!(changes.name, current.name);
        assert_eq!(changes.description, current.description);
    }

    #[test]
    fn test_update_rejects_blank_name() {
        let result = apply_update(&project(), patch(Some(" \u{200B} "), None, None));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_empty_description_clears_it() {
        let changes = apply_update(&project(), patch(None, Some(""), None))
            .unwrap()
            .unwrap();
        assert_eq!(changes.description, None);
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(clean_description(None), None);
        assert_eq!(clean_description(Some("  \u{200B} ")), None);
        assert_eq!(
            clean_description(Some("  งบประมาณ\u{00A0}ปี 2569 ")).as_deref(),
            Some("งบประมาณ ปี 2569")
        );
    }
}
