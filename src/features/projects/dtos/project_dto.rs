use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::projects::models::{Project, ProjectStatus};
use crate::shared::constants::DEFAULT_PAGE_SIZE;
use crate::shared::types::PaginationQuery;

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Request DTO for creating a project
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProjectDto {
    #[validate(length(min = 1, max = 200, message = "ชื่อโครงการต้องมีความยาว 1-200 ตัวอักษร"))]
    #[schema(example = "โครงการพัฒนาแหล่งน้ำชุมชน")]
    pub name: String,
    #[validate(length(max = 5000, message = "รายละเอียดโครงการยาวเกินไป"))]
    pub description: Option<String>,
}

/// Request DTO for updating a project. Omitted fields are left unchanged;
/// an empty description clears it.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProjectDto {
    #[validate(length(min = 1, max = 200, message = "ชื่อโครงการต้องมีความยาว 1-200 ตัวอักษร"))]
    pub name: Option<String>,
    #[validate(length(max = 5000, message = "รายละเอียดโครงการยาวเกินไป"))]
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
}

/// Query parameters for listing the caller's projects
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ProjectQueryParams {
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
}

impl ProjectQueryParams {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Response DTO for a project
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponseDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponseDto {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            status: p.status,
            owner_id: p.owner_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Project with the number of files filed under it
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectDetailDto {
    #[serde(flatten)]
    pub project: ProjectResponseDto,
    pub file_count: i64,
}

/// Number of projects in one status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusCountDto {
    pub status: ProjectStatus,
    pub count: i64,
}

/// One entry per status in display order, zero when the query had no row for it
pub fn status_counts(rows: &[(ProjectStatus, i64)]) -> Vec<StatusCountDto> {
    ProjectStatus::ALL
        .into_iter()
        .map(|status| StatusCountDto {
            status,
            count: rows
                .iter()
                .find(|(s, _)| *s == status)
                .map(|(_, c)| *c)
                .unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_validation() {
        let dto = CreateProjectDto {
            name: String::new(),
            description: None,
        };
        assert!(dto.validate().is_err());

        let dto = CreateProjectDto {
            name: "ก".repeat(201),
            description: None,
        };
        assert!(dto.validate().is_err());

        let dto = CreateProjectDto {
            name: "โครงการอบรมอาชีพ".to_string(),
            description: Some("ฝึกอบรมผู้สูงอายุ".to_string()),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_update_accepts_partial_body() {
        let dto: UpdateProjectDto =
            serde_json::from_str(r#"{"status":"เสร็จสิ้น"}"#).unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.status, Some(ProjectStatus::Completed));
        assert!(dto.name.is_none());
    }

    #[test]
    fn test_detail_flattens_project() {
        let now = Utc::now();
        let detail = ProjectDetailDto {
            project: ProjectResponseDto {
                id: Uuid::nil(),
                name: "โครงการ".to_string(),
                description: None,
                status: ProjectStatus::Pending,
                owner_id: Uuid::nil(),
                created_at: now,
                updated_at: now,
            },
            file_count: 3,
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "โครงการ");
        assert_eq!(json["file_count"], 3);
        assert_eq!(json["status"], "รอดำเนินการ");
    }

    #[test]
    fn test_status_counts_fill_missing_statuses() {
        let counts = status_counts(&[
            (ProjectStatus::Completed, 3),
            (ProjectStatus::Pending, 2),
        ]);

        assert_eq!(counts.len(), 4);
        assert_eq!(counts[0].status, ProjectStatus::Pending);
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].count, 0);
        assert_eq!(counts[2].count, 3);
        assert_eq!(counts[3].count, 0);
    }
}
