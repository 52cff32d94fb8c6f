use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::files::models::{AttachmentFile, DownloadStatus, UserFile};
use crate::shared::constants::{ALLOWED_UPLOAD_EXTENSIONS, DEFAULT_PAGE_SIZE};
use crate::shared::types::PaginationQuery;

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Upload file request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload (pdf, docx, doc, xlsx, xls, png, jpg, jpeg)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Optional project to file the upload under
    pub project_id: Option<Uuid>,
}

/// Attachment upload form for OpenAPI documentation
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadAttachmentDto {
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Response DTO for a stored file. The storage path is never exposed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserFileResponseDto {
    pub id: Uuid,
    pub original_name: String,
    pub extension: String,
    pub document_kind: Option<String>,
    pub size_bytes: i64,
    pub download_status: DownloadStatus,
    pub downloaded_at: Option<DateTime<Utc>>,
    pub owner_id: Uuid,
    pub project_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserFile> for UserFileResponseDto {
    fn from(f: UserFile) -> Self {
        Self {
            id: f.id,
            original_name: f.original_name,
            extension: f.extension,
            document_kind: f.document_kind,
            size_bytes: f.size_bytes,
            download_status: f.download_status,
            downloaded_at: f.downloaded_at,
            owner_id: f.owner_id,
            project_id: f.project_id,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttachmentResponseDto {
    pub id: Uuid,
    pub file_name: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub user_file_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<AttachmentFile> for AttachmentResponseDto {
    fn from(a: AttachmentFile) -> Self {
        Self {
            id: a.id,
            file_name: a.file_name,
            size_bytes: a.size_bytes,
            mime_type: a.mime_type,
            user_file_id: a.user_file_id,
            created_at: a.created_at,
        }
    }
}

/// Query parameters for listing files
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct FileQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
    /// Only files filed under this project
    pub project_id: Option<Uuid>,
    /// Admins only: include every user's files
    #[serde(default)]
    pub all: bool,
}

impl FileQueryParams {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Move a file into a project, or out of any project with `null`
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignProjectDto {
    pub project_id: Option<Uuid>,
}

/// Query string of a signed download link
#[derive(Debug, Deserialize, IntoParams)]
pub struct SignedDownloadQuery {
    /// Unix timestamp after which the link is rejected
    pub expires: i64,
    /// Hex HMAC-SHA256 signature
    pub signature: String,
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteFileResponseDto {
    pub deleted: bool,
}

pub fn is_extension_allowed(extension: &str) -> bool {
    ALLOWED_UPLOAD_EXTENSIONS.contains(&extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extensions() {
        for ext in ["pdf", "docx", "doc", "xlsx", "xls", "png", "jpg", "jpeg"] {
            assert!(is_extension_allowed(ext), "{} should be allowed", ext);
        }
        assert!(!is_extension_allowed("exe"));
        assert!(!is_extension_allowed("PDF"));
    }

    #[test]
    fn test_response_hides_storage_path() {
        let now = Utc::now();
        let file = UserFile {
            id: Uuid::new_v4(),
            original_name: "บันทึกข้อความ.docx".to_string(),
            storage_path: "documents/u/secret.docx".to_string(),
            extension: "docx".to_string(),
            document_kind: Some("approval".to_string()),
            size_bytes: 2048,
            download_status: DownloadStatus::Pending,
            downloaded_at: None,
            owner_id: Uuid::new_v4(),
            project_id: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(UserFileResponseDto::from(file)).unwrap();
        assert!(json.get("storage_path").is_none());
        assert_eq!(json["download_status"], "pending");
        assert_eq!(json["document_kind"], "approval");
    }

    #[test]
    fn test_query_defaults() {
        let params: FileQueryParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, DEFAULT_PAGE_SIZE);
        assert!(!params.all);
        assert!(params.project_id.is_none());
    }
}
