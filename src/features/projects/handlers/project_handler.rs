use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::UserFileResponseDto;
use crate::features::projects::dtos::{
    CreateProjectDto, ProjectDetailDto, ProjectQueryParams, ProjectResponseDto, UpdateProjectDto,
};
use crate::features::projects::services::ProjectService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// List the caller's projects
#[utoipa::path(
    get,
    path = "/api/projects",
    params(ProjectQueryParams),
    responses(
        (status = 200, description = "List of projects", body = ApiResponse<Vec<ProjectResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "projects"
)]
pub async fn list_projects(
    user: AuthenticatedUser,
    State(service): State<Arc<ProjectService>>,
    Query(params): Query<ProjectQueryParams>,
) -> Result<Json<ApiResponse<Vec<ProjectResponseDto>>>> {
    let (projects, total) = service.list(&user, &params).await?;
    let dtos: Vec<ProjectResponseDto> = projects.into_iter().map(|p| p.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta::paged(total, &params.pagination())),
    )))
}

/// Create a project
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectDto,
    responses(
        (status = 201, description = "Project created", body = ApiResponse<ProjectResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "projects"
)]
pub async fn create_project(
    user: AuthenticatedUser,
    State(service): State<Arc<ProjectService>>,
    AppJson(dto): AppJson<CreateProjectDto>,
) -> Result<(StatusCode, Json<ApiResponse<ProjectResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let project = service.create(&user, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(project.into()), None, None)),
    ))
}

/// Get a project with its file count
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project found", body = ApiResponse<ProjectDetailDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "projects"
)]
pub async fn get_project(
    user: AuthenticatedUser,
    State(service): State<Arc<ProjectService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProjectDetailDto>>> {
    let detail = service.get_detail(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(detail), None, None)))
}

/// Update name, description or status
#[utoipa::path(
    patch,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = UpdateProjectDto,
    responses(
        (status = 200, description = "Project updated", body = ApiResponse<ProjectResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "projects"
)]
pub async fn update_project(
    user: AuthenticatedUser,
    State(service): State<Arc<ProjectService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateProjectDto>,
) -> Result<Json<ApiResponse<ProjectResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let project = service.update(&user, id, dto).await?;
    Ok(Json(ApiResponse::success(Some(project.into()), None, None)))
}

/// Delete a project and every file filed under it
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "projects"
)]
pub async fn delete_project(
    user: AuthenticatedUser,
    State(service): State<Arc<ProjectService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("ลบโครงการเรียบร้อยแล้ว".to_string()),
        None,
    )))
}

/// List files filed under a project
#[utoipa::path(
    get,
    path = "/api/projects/{id}/files",
    params(
        ("id" = Uuid, Path, description = "Project ID"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Files of the project", body = ApiResponse<Vec<UserFileResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "projects"
)]
pub async fn list_project_files(
    user: AuthenticatedUser,
    State(service): State<Arc<ProjectService>>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<UserFileResponseDto>>>> {
    let (files, total) = service.list_files(&user, id, &pagination).await?;
    let dtos: Vec<UserFileResponseDto> = files.into_iter().map(|f| f.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta::paged(total, &pagination)),
    )))
}
