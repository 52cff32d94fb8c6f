use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{
    AssignProjectDto, AttachmentResponseDto, DeleteFileResponseDto, FileQueryParams,
    SignedDownloadQuery, UploadAttachmentDto, UploadFileDto, UserFileResponseDto,
};
use crate::features::files::services::{FileService, StoredFile};
use crate::modules::storage::SignedUrl;
use crate::shared::types::{ApiResponse, Meta};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Attachment,
    Inline,
}

/// `Content-Disposition` with an ASCII fallback and the RFC 5987 UTF-8 name
pub fn content_disposition(disposition: Disposition, file_name: &str) -> String {
    let kind = match disposition {
        Disposition::Attachment => "attachment",
        Disposition::Inline => "inline",
    };
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        kind,
        fallback,
        urlencoding::encode(file_name)
    )
}

fn file_response(file: StoredFile, disposition: Disposition) -> Response {
    let content_type = HeaderValue::from_str(&file.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(disposition, &file.name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, HeaderValue::from_static("private, no-store")),
        ],
        file.bytes,
    )
        .into_response()
}

/// A file part read from a multipart body
struct UploadedPart {
    file_name: String,
    data: Vec<u8>,
    project_id: Option<Uuid>,
}

async fn read_multipart(mut multipart: Multipart) -> Result<UploadedPart> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut project_id: Option<Uuid> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("อ่านข้อมูลที่อัปโหลดไม่สำเร็จ: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("อ่านข้อมูลไฟล์ไม่สำเร็จ: {}", e))
                })?;
                file = Some((name, data.to_vec()));
            }
            "project_id" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("อ่านรหัสโครงการไม่สำเร็จ: {}", e))
                })?;
                let text = text.trim();
                if !text.is_empty() {
                    project_id = Some(Uuid::parse_str(text).map_err(|_| {
                        AppError::BadRequest("รหัสโครงการไม่ถูกต้อง".to_string())
                    })?);
                }
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let (file_name, data) =
        file.ok_or_else(|| AppError::BadRequest("กรุณาเลือกไฟล์".to_string()))?;

    Ok(UploadedPart {
        file_name,
        data,
        project_id,
    })
}

/// Upload a file
///
/// Accepts multipart/form-data with `file` and an optional `project_id`.
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "File upload form with optional project",
    ),
    responses(
        (status = 201, description = "File uploaded", body = ApiResponse<UserFileResponseDto>),
        (status = 400, description = "Invalid file"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Project belongs to someone else"),
        (status = 413, description = "File too large")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UserFileResponseDto>>)> {
    let part = read_multipart(multipart).await?;
    let file = service
        .upload(&user, &part.file_name, part.data, part.project_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(file.into()), None, None)),
    ))
}

/// List files
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    params(FileQueryParams),
    responses(
        (status = 200, description = "List of files", body = ApiResponse<Vec<UserFileResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_files(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Query(params): Query<FileQueryParams>,
) -> Result<Json<ApiResponse<Vec<UserFileResponseDto>>>> {
    let (files, total) = service.list(&user, &params).await?;
    let dtos: Vec<UserFileResponseDto> = files.into_iter().map(|f| f.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta::paged(total, &params.pagination())),
    )))
}

/// Get file metadata
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File found", body = ApiResponse<UserFileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserFileResponseDto>>> {
    let file = service.get_accessible(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(file.into()), None, None)))
}

/// Delete a file with its attachments
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File deleted", body = ApiResponse<DeleteFileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteFileResponseDto>>> {
    service.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        Some(DeleteFileResponseDto { deleted: true }),
        Some("ลบไฟล์เรียบร้อยแล้ว".to_string()),
        None,
    )))
}

/// Move a file into or out of a project
#[utoipa::path(
    patch,
    path = "/api/files/{id}/project",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    request_body = AssignProjectDto,
    responses(
        (status = 200, description = "File updated", body = ApiResponse<UserFileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner of the file or project"),
        (status = 404, description = "File or project not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_project(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<AssignProjectDto>,
) -> Result<Json<ApiResponse<UserFileResponseDto>>> {
    let file = service.assign_project(&user, id, dto.project_id).await?;
    Ok(Json(ApiResponse::success(Some(file.into()), None, None)))
}

/// Download a file as an attachment
#[utoipa::path(
    get,
    path = "/api/files/{id}/download",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File bytes", content_type = "application/octet-stream"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let file = service.open(&user, id, true).await?;
    Ok(file_response(file, Disposition::Attachment))
}

/// Show a file inline in the browser
#[utoipa::path(
    get,
    path = "/api/files/{id}/preview",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File bytes", content_type = "application/octet-stream"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn preview_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let file = service.open(&user, id, false).await?;
    Ok(file_response(file, Disposition::Inline))
}

/// Create a temporary link that works without a session
#[utoipa::path(
    post,
    path = "/api/files/{id}/signed-url",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "Signed URL", body = ApiResponse<SignedUrl>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_signed_url(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SignedUrl>>> {
    let signed = service.issue_signed_url(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(signed), None, None)))
}

/// Download through a signed link (public)
#[utoipa::path(
    get,
    path = "/api/files/signed/{id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID"),
        SignedDownloadQuery
    ),
    responses(
        (status = 200, description = "File bytes", content_type = "application/octet-stream"),
        (status = 403, description = "Invalid or expired signature"),
        (status = 404, description = "File not found")
    )
)]
pub async fn signed_download(
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
    Query(query): Query<SignedDownloadQuery>,
) -> Result<Response> {
    let file = service
        .open_signed(id, query.expires, &query.signature)
        .await?;
    Ok(file_response(file, Disposition::Inline))
}

/// Attach a supporting file
#[utoipa::path(
    post,
    path = "/api/files/{id}/attachments",
    tag = "files",
    params(("id" = Uuid, Path, description = "Parent file ID")),
    request_body(
        content = UploadAttachmentDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Attachment stored", body = ApiResponse<AttachmentResponseDto>),
        (status = 400, description = "Invalid file"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_attachment(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<AttachmentResponseDto>>)> {
    let part = read_multipart(multipart).await?;
    let attachment = service
        .add_attachment(&user, id, &part.file_name, part.data)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(attachment.into()), None, None)),
    ))
}

/// List attachments of a file
#[utoipa::path(
    get,
    path = "/api/files/{id}/attachments",
    tag = "files",
    params(("id" = Uuid, Path, description = "Parent file ID")),
    responses(
        (status = 200, description = "Attachments", body = ApiResponse<Vec<AttachmentResponseDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_attachments(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<AttachmentResponseDto>>>> {
    let attachments = service.list_attachments(&user, id).await?;
    let total = attachments.len() as i64;
    let dtos: Vec<AttachmentResponseDto> = attachments.into_iter().map(|a| a.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta::total(total)),
    )))
}

/// Download an attachment
#[utoipa::path(
    get,
    path = "/api/files/{id}/attachments/{attachment_id}/download",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "Parent file ID"),
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "Attachment bytes", content_type = "application/octet-stream"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Attachment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_attachment(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path((id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<Response> {
    let file = service.open_attachment(&user, id, attachment_id).await?;
    Ok(file_response(file, Disposition::Attachment))
}

/// Delete an attachment
#[utoipa::path(
    delete,
    path = "/api/files/{id}/attachments/{attachment_id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "Parent file ID"),
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "Attachment deleted", body = ApiResponse<DeleteFileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Attachment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_attachment(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path((id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<DeleteFileResponseDto>>> {
    service.delete_attachment(&user, id, attachment_id).await?;
    Ok(Json(ApiResponse::success(
        Some(DeleteFileResponseDto { deleted: true }),
        Some("ลบไฟล์แนบเรียบร้อยแล้ว".to_string()),
        None,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_encodes_thai_name() {
        let value = content_disposition(Disposition::Attachment, "สัญญา 01.docx");
        assert!(value.starts_with("attachment; filename=\""));
        assert!(value.contains("filename*=UTF-8''%E0%B8%AA"));
        assert!(value.ends_with("%2001.docx"));
        assert!(HeaderValue::from_str(&value).is_ok());
    }

    #[test]
    fn test_content_disposition_fallback_is_ascii() {
        let value = content_disposition(Disposition::Inline, "a\"b\\c.pdf");
        assert!(value.starts_with("inline; filename=\"a_b_c.pdf\""));
    }

    #[test]
    fn test_file_response_headers() {
        let response = file_response(
            StoredFile {
                name: "report.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                bytes: b"%PDF".to_vec(),
            },
            Disposition::Inline,
        );

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("inline;"));
    }
}
