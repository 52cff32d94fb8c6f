use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{is_extension_allowed, FileQueryParams};
use crate::features::files::models::{
    AttachmentFile, NewUserFile, UserFile, ATTACHMENT_COLUMNS, USER_FILE_COLUMNS,
};
use crate::features::files::services::storage_paths;
use crate::features::projects::services::ensure_project_access;
use crate::modules::storage::{unique_file_name, LocalStorage, SignedUrl, UrlSigner};
use crate::shared::constants::{
    ALLOWED_UPLOAD_EXTENSIONS, ATTACHMENTS_DIR, MAX_UPLOAD_SIZE, UPLOADS_DIR,
};
use crate::shared::thai::clean_single_line;
use crate::shared::validation::{file_extension, file_stem};

const FILE_NOT_FOUND: &str = "ไม่พบไฟล์";
const FILE_FORBIDDEN: &str = "คุณไม่มีสิทธิ์เข้าถึงไฟล์นี้";
const ATTACHMENT_NOT_FOUND: &str = "ไม่พบไฟล์แนบ";

/// Bytes read back from storage, ready to be sent
#[derive(Debug)]
pub struct StoredFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn guess_mime(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .to_string()
}

/// Check an upload's name and size; returns the cleaned name and its extension
fn validate_upload(original_name: &str, size: usize) -> Result<(String, String)> {
    let name = clean_single_line(original_name);
    if name.is_empty() {
        return Err(AppError::BadRequest("กรุณาระบุชื่อไฟล์".to_string()));
    }

    if size == 0 {
        return Err(AppError::BadRequest("ไฟล์ว่างเปล่า".to_string()));
    }
    if size > MAX_UPLOAD_SIZE {
        return Err(AppError::BadRequest(format!(
            "ไฟล์มีขนาดใหญ่เกินไป (สูงสุด {} MB)",
            MAX_UPLOAD_SIZE / 1024 / 1024
        )));
    }

    let extension = file_extension(&name)
        .filter(|ext| is_extension_allowed(ext))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "ไม่รองรับไฟล์ประเภทนี้ (รองรับ: {})",
                ALLOWED_UPLOAD_EXTENSIONS.join(", ")
            ))
        })?;

    Ok((name, extension))
}

/// Service for stored files, their attachments and signed links
pub struct FileService {
    pool: PgPool,
    storage: Arc<LocalStorage>,
    signer: Arc<UrlSigner>,
}

impl FileService {
    pub fn new(pool: PgPool, storage: Arc<LocalStorage>, signer: Arc<UrlSigner>) -> Self {
        Self {
            pool,
            storage,
            signer,
        }
    }

    async fn find(&self, id: Uuid) -> Result<UserFile> {
        let sql = format!("SELECT {} FROM user_files WHERE id = $1", USER_FILE_COLUMNS);
        sqlx::query_as::<_, UserFile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(FILE_NOT_FOUND.to_string()))
    }

    /// Load a file the user may act on: the owner or an admin
    pub async fn get_accessible(&self, user: &AuthenticatedUser, id: Uuid) -> Result<UserFile> {
        let file = self.find(id).await?;
        if !user.can_access(file.owner_id) {
            debug!("User {} denied access to file {}", user.id, id);
            return Err(AppError::Forbidden(FILE_FORBIDDEN.to_string()));
        }
        Ok(file)
    }

    /// Insert the row for bytes already written to storage
    pub async fn insert_record(&self, new: NewUserFile) -> Result<UserFile> {
        let sql = format!(
            r#"
            INSERT INTO user_files
                (original_name, storage_path, extension, document_kind, size_bytes, owner_id, project_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_FILE_COLUMNS
        );
        let file = sqlx::query_as::<_, UserFile>(&sql)
            .bind(&new.original_name)
            .bind(&new.storage_path)
            .bind(&new.extension)
            .bind(&new.document_kind)
            .bind(new.size_bytes)
            .bind(new.owner_id)
            .bind(new.project_id)
            .fetch_one(&self.pool)
            .await?;

        info!(
            "File recorded: id={}, owner={}, size={}",
            file.id, file.owner_id, file.size_bytes
        );
        Ok(file)
    }

    /// Store an upload and record it
    pub async fn upload(
        &self,
        user: &AuthenticatedUser,
        original_name: &str,
        data: Vec<u8>,
        project_id: Option<Uuid>,
    ) -> Result<UserFile> {
        let (name, extension) = validate_upload(original_name, data.len())?;

        if let Some(project_id) = project_id {
            ensure_project_access(&self.pool, user, project_id).await?;
        }

        let key = self.storage.generate_key(
            UPLOADS_DIR,
            user.id,
            &unique_file_name(file_stem(&name), &extension),
        );
        self.storage.upload(&key, &data).await?;

        let record = NewUserFile {
            original_name: name,
            storage_path: key.clone(),
            extension,
            document_kind: None,
            size_bytes: data.len() as i64,
            owner_id: user.id,
            project_id,
        };

        match self.insert_record(record).await {
            Ok(file) => Ok(file),
            Err(e) => {
                self.storage.delete_all([&key]).await;
                Err(e)
            }
        }
    }

    /// The user's files, or every file for an admin passing `all=true`
    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        params: &FileQueryParams,
    ) -> Result<(Vec<UserFile>, i64)> {
        let pagination = params.pagination();
        let owner_filter = if params.all && user.is_admin() {
            None
        } else {
            Some(user.id)
        };

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM user_files
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND ($2::uuid IS NULL OR project_id = $2)
            "#,
        )
        .bind(owner_filter)
        .bind(params.project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count files: {:?}", e);
            AppError::Database(e)
        })?;

        let sql = format!(
            r#"
            SELECT {} FROM user_files
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND ($2::uuid IS NULL OR project_id = $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
            USER_FILE_COLUMNS
        );
        let files = sqlx::query_as::<_, UserFile>(&sql)
            .bind(owner_filter)
            .bind(params.project_id)
            .bind(pagination.offset())
            .bind(pagination.limit())
            .fetch_all(&self.pool)
            .await?;

        Ok((files, total))
    }

    /// Delete the row (attachments cascade) and then the bytes
    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<()> {
        self.get_accessible(user, id).await?;

        let paths = storage_paths::for_file(&self.pool, id).await?;
        sqlx::query("DELETE FROM user_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.storage.delete_all(&paths).await;
        info!("File deleted: id={}, by={}", id, user.id);
        Ok(())
    }

    pub async fn assign_project(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<UserFile> {
        self.get_accessible(user, id).await?;
        if let Some(project_id) = project_id {
            ensure_project_access(&self.pool, user, project_id).await?;
        }

        let sql = format!(
            r#"
            UPDATE user_files SET project_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_FILE_COLUMNS
        );
        let file = sqlx::query_as::<_, UserFile>(&sql)
            .bind(id)
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;

        info!("File {} moved to project {:?}", id, project_id);
        Ok(file)
    }

    async fn read(&self, file: &UserFile) -> Result<StoredFile> {
        let bytes = self.storage.download(&file.storage_path).await?;
        Ok(StoredFile {
            name: file.original_name.clone(),
            mime_type: guess_mime(&file.original_name),
            bytes,
        })
    }

    /// Read the bytes; a download also marks the file as downloaded
    pub async fn open(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        mark_downloaded: bool,
    ) -> Result<StoredFile> {
        let file = self.get_accessible(user, id).await?;
        let stored = self.read(&file).await?;

        if mark_downloaded {
            sqlx::query(
                r#"
                UPDATE user_files
                SET download_status = 'downloaded', downloaded_at = NOW(), updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .execute(&self.pool)
            .await?;
            debug!("File {} marked downloaded", id);
        }

        Ok(stored)
    }

    pub async fn issue_signed_url(&self, user: &AuthenticatedUser, id: Uuid) -> Result<SignedUrl> {
        let file = self.get_accessible(user, id).await?;
        let signed = self.signer.issue(file.id, Utc::now())?;
        info!(
            "Signed URL issued: file={}, by={}, expires_at={}",
            file.id, user.id, signed.expires_at
        );
        Ok(signed)
    }

    /// Serve a file through a signed link. The signature is checked before any lookup.
    pub async fn open_signed(&self, id: Uuid, expires: i64, signature: &str) -> Result<StoredFile> {
        self.signer.verify(id, expires, signature, Utc::now())?;
        let file = self.find(id).await?;
        self.read(&file).await
    }

    // =========================================================================
    // ATTACHMENTS
    // =========================================================================

    pub async fn add_attachment(
        &self,
        user: &AuthenticatedUser,
        file_id: Uuid,
        original_name: &str,
        data: Vec<u8>,
    ) -> Result<AttachmentFile> {
        let parent = self.get_accessible(user, file_id).await?;
        let (name, extension) = validate_upload(original_name, data.len())?;

        let key = self.storage.generate_key(
            ATTACHMENTS_DIR,
            parent.owner_id,
            &unique_file_name(file_stem(&name), &extension),
        );
        self.storage.upload(&key, &data).await?;

        let sql = format!(
            r#"
            INSERT INTO attachment_files (file_name, storage_path, size_bytes, mime_type, user_file_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ATTACHMENT_COLUMNS
        );
        let result = sqlx::query_as::<_, AttachmentFile>(&sql)
            .bind(&name)
            .bind(&key)
            .bind(data.len() as i64)
            .bind(guess_mime(&name))
            .bind(file_id)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(attachment) => {
                info!("Attachment added: id={}, file={}", attachment.id, file_id);
                Ok(attachment)
            }
            Err(e) => {
                error!("Failed to record attachment, removing '{}'", key);
                self.storage.delete_all([&key]).await;
                Err(e.into())
            }
        }
    }

    pub async fn list_attachments(
        &self,
        user: &AuthenticatedUser,
        file_id: Uuid,
    ) -> Result<Vec<AttachmentFile>> {
        self.get_accessible(user, file_id).await?;

        let sql = format!(
            "SELECT {} FROM attachment_files WHERE user_file_id = $1 ORDER BY created_at",
            ATTACHMENT_COLUMNS
        );
        let attachments = sqlx::query_as::<_, AttachmentFile>(&sql)
            .bind(file_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(attachments)
    }

    async fn find_attachment(&self, file_id: Uuid, attachment_id: Uuid) -> Result<AttachmentFile> {
        let sql = format!(
            "SELECT {} FROM attachment_files WHERE id = $1 AND user_file_id = $2",
            ATTACHMENT_COLUMNS
        );
        sqlx::query_as::<_, AttachmentFile>(&sql)
            .bind(attachment_id)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(ATTACHMENT_NOT_FOUND.to_string()))
    }

    pub async fn open_attachment(
        &self,
        user: &AuthenticatedUser,
        file_id: Uuid,
        attachment_id: Uuid,
    ) -> Result<StoredFile> {
        self.get_accessible(user, file_id).await?;
        let attachment = self.find_attachment(file_id, attachment_id).await?;
        let bytes = self.storage.download(&attachment.storage_path).await?;

        Ok(StoredFile {
            name: attachment.file_name,
            mime_type: attachment.mime_type,
            bytes,
        })
    }

    pub async fn delete_attachment(
        &self,
        user: &AuthenticatedUser,
        file_id: Uuid,
        attachment_id: Uuid,
    ) -> Result<()> {
        self.get_accessible(user, file_id).await?;
        let attachment = self.find_attachment(file_id, attachment_id).await?;

        sqlx::query("DELETE FROM attachment_files WHERE id = $1")
            .bind(attachment.id)
            .execute(&self.pool)
            .await?;

        self.storage.delete(&attachment.storage_path).await?;
        info!("Attachment deleted: id={}, file={}", attachment.id, file_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upload_accepts_allowed_types() {
        let (name, ext) = validate_upload("ใบเสนอราคา.PDF", 1024).unwrap();
        assert_eq!(name, "ใบเสนอราคา.PDF");
        assert_eq!(ext, "pdf");
    }

    #[test]
    fn test_validate_upload_rejects_bad_input() {
        assert!(matches!(
            validate_upload("script.exe", 10),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_upload("noextension", 10),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_upload("empty.pdf", 0),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_upload("big.pdf", MAX_UPLOAD_SIZE + 1),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_upload("\u{200B} ", 10),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("a.pdf"), "application/pdf");
        assert_eq!(
            guess_mime("สัญญา.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(guess_mime("photo.PNG"), "image/png");
        assert_eq!(guess_mime("unknown.zzz"), "application/octet-stream");
    }
}
