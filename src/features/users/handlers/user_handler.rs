use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::AuthUserDto;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::dtos::{ChangePasswordDto, DashboardDto, UpdateProfileDto};
use crate::features::users::services::UserService;
use crate::shared::types::ApiResponse;
use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

#[utoipa::path(
    patch,
    path = "/api/users/me",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<AuthUserDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_profile(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<UpdateProfileDto>,
) -> Result<Json<ApiResponse<AuthUserDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let profile = service.update_profile(&user, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(profile),
        Some("บันทึกข้อมูลเรียบร้อยแล้ว".to_string()),
        None,
    )))
}

#[utoipa::path(
    post,
    path = "/api/users/me/password",
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Current password is wrong or new password is invalid"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn change_password(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<ChangePasswordDto>,
) -> Result<Json<ApiResponse<()>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    service.change_password(&user, dto).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("เปลี่ยนรหัสผ่านเรียบร้อยแล้ว".to_string()),
        None,
    )))
}

/// Project and file summary for the caller
#[utoipa::path(
    get,
    path = "/api/users/me/dashboard",
    responses(
        (status = 200, description = "Dashboard data", body = ApiResponse<DashboardDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_dashboard(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<DashboardDto>>> {
    let dashboard = service.dashboard(&user).await?;
    Ok(Json(ApiResponse::success(Some(dashboard), None, None)))
}
