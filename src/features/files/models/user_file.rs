use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Column list matching [`UserFile`]'s field order
pub const USER_FILE_COLUMNS: &str = "id, original_name, storage_path, extension, document_kind, \
     size_bytes, download_status, downloaded_at, owner_id, project_id, created_at, updated_at";

/// Whether the owner has downloaded the file at least once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "download_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    #[default]
    Pending,
    Downloaded,
}

/// A generated document or an upload, stored under the storage root
#[derive(Debug, Clone, FromRow)]
pub struct UserFile {
    pub id: Uuid,
    pub original_name: String,
    /// Key relative to the storage root
    pub storage_path: String,
    pub extension: String,
    /// Set for generated documents (`approval`, `contract`, ...)
    pub document_kind: Option<String>,
    pub size_bytes: i64,
    pub download_status: DownloadStatus,
    pub downloaded_at: Option<DateTime<Utc>>,
    pub owner_id: Uuid,
    pub project_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a file row after its bytes are stored
#[derive(Debug)]
pub struct NewUserFile {
    pub original_name: String,
    pub storage_path: String,
    pub extension: String,
    pub document_kind: Option<String>,
    pub size_bytes: i64,
    pub owner_id: Uuid,
    pub project_id: Option<Uuid>,
}
