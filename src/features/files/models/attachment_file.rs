use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const ATTACHMENT_COLUMNS: &str =
    "id, file_name, storage_path, size_bytes, mime_type, user_file_id, created_at";

/// Supporting file attached to a user file
#[derive(Debug, Clone, FromRow)]
pub struct AttachmentFile {
    pub id: Uuid,
    pub file_name: String,
    pub storage_path: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub user_file_id: Uuid,
    pub created_at: DateTime<Utc>,
}
