use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::files::dtos::UserFileResponseDto;
use crate::features::projects::dtos::StatusCountDto;

/// Request DTO for updating the caller's display name
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 100, message = "กรุณากรอกชื่อ (ไม่เกิน 100 ตัวอักษร)"))]
    #[schema(example = "สมชาย ใจดี")]
    pub name: String,
}

/// Request DTO for changing the caller's password
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1, message = "กรุณากรอกรหัสผ่านปัจจุบัน"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "รหัสผ่านต้องมีอย่างน้อย 8 ตัวอักษร"))]
    pub new_password: String,
}

/// Overview of the caller's work
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardDto {
    pub project_total: i64,
    /// One entry per project status, in display order
    pub projects_by_status: Vec<StatusCountDto>,
    pub file_count: i64,
    /// Five most recently created files
    pub recent_files: Vec<UserFileResponseDto>,
}
