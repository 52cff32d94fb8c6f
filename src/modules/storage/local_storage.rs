//! Local disk storage for generated documents, uploads and attachments.
//!
//! Files are addressed by a relative key such as `documents/<user>/<name>.docx`.
//! Keys are stored in the database and always resolved against the storage root.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::AppError;
use crate::shared::validation::sanitize_file_stem;

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the storage root if it doesn't exist
    pub async fn ensure_root(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.root).await?;
        info!("Local storage ready at {}", self.root.display());
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build a key under `<dir>/<owner>/<file_name>`
    pub fn generate_key(&self, dir: &str, owner_id: Uuid, file_name: &str) -> String {
        format!("{}/{}/{}", dir, owner_id, file_name)
    }

    /// Map a key to a path under the root. Absolute keys and `..` are rejected.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        if !is_plain {
            warn!("Rejected storage key: {:?}", key);
            return Err(AppError::BadRequest("เส้นทางไฟล์ไม่ถูกต้อง".to_string()));
        }

        Ok(self.root.join(relative))
    }

    /// Write bytes to the key, creating parent directories as needed
    pub async fn upload(&self, key: &str, data: &[u8]) -> Result<String, AppError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;

        debug!("Stored {} bytes at '{}'", data.len(), key);
        Ok(key.to_string())
    }

    pub async fn download(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Stored file missing on disk: '{}'", key);
                Err(AppError::NotFound("ไม่พบไฟล์ในระบบจัดเก็บ".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the file. A file that is already gone is not an error.
    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted '{}'", key);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Delete skipped, '{}' already gone", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete many keys, logging failures instead of stopping
    pub async fn delete_all<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            if let Err(e) = self.delete(key.as_ref()).await {
                warn!("Failed to delete '{}': {}", key.as_ref(), e);
            }
        }
    }

    pub async fn exists(&self, key: &str) -> Result<bool, AppError> {
        let path = self.resolve(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

/// `<sanitized stem>_<uuid>.<ext>`
pub fn unique_file_name(stem: &str, extension: &str) -> String {
    format!(
        "{}_{}.{}",
        sanitize_file_stem(stem),
        Uuid::new_v4().simple(),
        extension.trim_start_matches('.').to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (TempDir, LocalStorage) {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        (dir, storage)
    }

    #[tokio::test]
    async fn test_upload_then_download() {
        let (_dir, storage) = storage();
        let key = storage.generate_key("uploads", Uuid::new_v4(), "ใบเสนอราคา.pdf");

        storage.upload(&key, b"%PDF-1.7").await.unwrap();

        assert!(storage.exists(&key).await.unwrap());
        assert_eq!(storage.download(&key).await.unwrap(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, storage) = storage();
        storage.upload("uploads/a/file.txt", b"x").await.unwrap();

        storage.delete("uploads/a/file.txt").await.unwrap();
        storage.delete("uploads/a/file.txt").await.unwrap();
        assert!(!storage.exists("uploads/a/file.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let (_dir, storage) = storage();
        let result = storage.download("uploads/nobody/missing.pdf").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let (_dir, storage) = storage();
        assert!(storage.resolve("../secret").is_err());
        assert!(storage.resolve("uploads/../../secret").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("./uploads/file").is_err());
        assert!(storage.resolve("").is_err());
        assert!(storage.resolve("uploads/u/file.pdf").is_ok());
    }

    #[tokio::test]
    async fn test_long_thai_name_fits_on_disk() {
        let (_dir, storage) = storage();
        let name = unique_file_name(&"ขออนุมัติ".repeat(10), "docx");
        assert!(name.len() <= 255);

        let key = storage.generate_key("uploads", Uuid::new_v4(), &name);
        storage.upload(&key, b"PK").await.unwrap();
        assert_eq!(storage.download(&key).await.unwrap(), b"PK");
    }

    #[test]
    fn test_unique_file_name() {
        let a = unique_file_name("บันทึก ข้อความ", ".DOCX");
        let b = unique_file_name("บันทึก ข้อความ", "docx");

        assert!(a.starts_with("บันทึก_ข้อความ_"));
        assert!(a.ends_with(".docx"));
        assert_ne!(a, b);
    }
}
