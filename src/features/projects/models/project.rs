use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Column list matching [`Project`]'s field order
pub const PROJECT_COLUMNS: &str = "id, name, description, status, owner_id, created_at, updated_at";

/// Project status matching the `project_status` database enum.
/// Stored and serialized with the Thai labels shown to users.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema,
)]
#[sqlx(type_name = "project_status")]
pub enum ProjectStatus {
    #[default]
    #[sqlx(rename = "รอดำเนินการ")]
    #[serde(rename = "รอดำเนินการ")]
    Pending,
    #[sqlx(rename = "กำลังดำเนินการ")]
    #[serde(rename = "กำลังดำเนินการ")]
    InProgress,
    #[sqlx(rename = "เสร็จสิ้น")]
    #[serde(rename = "เสร็จสิ้น")]
    Completed,
    #[sqlx(rename = "ยกเลิก")]
    #[serde(rename = "ยกเลิก")]
    Cancelled,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Pending,
        ProjectStatus::InProgress,
        ProjectStatus::Completed,
        ProjectStatus::Cancelled,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "รอดำเนินการ",
            ProjectStatus::InProgress => "กำลังดำเนินการ",
            ProjectStatus::Completed => "เสร็จสิ้น",
            ProjectStatus::Cancelled => "ยกเลิก",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Database model for projects
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_uses_thai_labels() {
        assert_eq!(
            serde_json::to_string(&ProjectStatus::InProgress).unwrap(),
            "\"กำลังดำเนินการ\""
        );
        let status: ProjectStatus = serde_json::from_str("\"ยกเลิก\"").unwrap();
        assert_eq!(status, ProjectStatus::Cancelled);
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(serde_json::from_str::<ProjectStatus>("\"pending\"").is_err());
        assert!(serde_json::from_str::<ProjectStatus>("\"อนุมัติ\"").is_err());
    }

    #[test]
    fn test_default_is_pending() {
        assert_eq!(ProjectStatus::default(), ProjectStatus::Pending);
        assert_eq!(ProjectStatus::default().to_string(), "รอดำเนินการ");
    }
}
