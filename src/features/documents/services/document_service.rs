use chrono::{FixedOffset, NaiveDate, Utc};
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::documents::dtos::GenerateDocumentDto;
use crate::features::documents::models::DocumentKind;
use crate::features::documents::services::DocxRenderer;
use crate::features::files::models::{NewUserFile, UserFile};
use crate::features::files::services::FileService;
use crate::features::projects::services::ensure_project_access;
use crate::modules::storage::LocalStorage;
use crate::shared::constants::DOCUMENTS_DIR;
use crate::shared::thai::{clean_single_line, clean_thai_text};

const DOCX_EXTENSION: &str = "docx";

/// Thailand has no DST, so a fixed +07:00 offset gives the local calendar date
const BANGKOK_OFFSET_SECS: i32 = 7 * 3600;

fn today_in_thailand() -> NaiveDate {
    let now = Utc::now();
    match FixedOffset::east_opt(BANGKOK_OFFSET_SECS) {
        Some(offset) => now.with_timezone(&offset).date_naive(),
        None => now.date_naive(),
    }
}

/// Turn submitted JSON values into cleaned text. Nulls and blanks are dropped.
pub fn normalize_fields(raw: &BTreeMap<String, serde_json::Value>) -> BTreeMap<String, String> {
    raw.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => clean_thai_text(s),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            (!text.is_empty()).then(|| (key.clone(), text))
        })
        .collect()
}

/// Required fields that are absent or blank, in declaration order
pub fn missing_fields(kind: DocumentKind, fields: &BTreeMap<String, String>) -> Vec<&'static str> {
    kind.required_fields()
        .iter()
        .copied()
        .filter(|name| fields.get(*name).is_none_or(|v| v.trim().is_empty()))
        .collect()
}

/// Display name for the generated file
fn display_name(kind: DocumentKind, requested: Option<&str>, today: NaiveDate) -> String {
    let base = requested
        .map(clean_single_line)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("{}_{}", kind.title(), today.format("%Y%m%d")));

    if base.to_lowercase().ends_with(".docx") {
        base
    } else {
        format!("{}.{}", base, DOCX_EXTENSION)
    }
}

/// `<kind>_<YYYYMMDD>_<uuid>.docx`
fn storage_file_name(kind: DocumentKind, today: NaiveDate) -> String {
    format!(
        "{}_{}_{}.{}",
        kind.slug(),
        today.format("%Y%m%d"),
        Uuid::new_v4(),
        DOCX_EXTENSION
    )
}

/// Service that fills document templates and files the result
pub struct DocumentService {
    pool: PgPool,
    storage: Arc<LocalStorage>,
    file_service: Arc<FileService>,
    renderer: Arc<DocxRenderer>,
    template_dir: PathBuf,
}

impl DocumentService {
    pub fn new(
        pool: PgPool,
        storage: Arc<LocalStorage>,
        file_service: Arc<FileService>,
        template_dir: PathBuf,
    ) -> Self {
        Self {
            pool,
            storage,
            file_service,
            renderer: Arc::new(DocxRenderer::new()),
            template_dir,
        }
    }

    async fn load_template(&self, kind: DocumentKind) -> Result<Vec<u8>> {
        let path = self.template_dir.join(kind.template_file());
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::TemplateNotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Generate a document of `kind` for the user
    pub async fn generate(
        &self,
        user: &AuthenticatedUser,
        kind_slug: &str,
        dto: GenerateDocumentDto,
    ) -> Result<UserFile> {
        let kind = DocumentKind::from_slug(kind_slug)
            .ok_or_else(|| AppError::NotFound(format!("ไม่พบประเภทเอกสาร '{}'", kind_slug)))?;

        let fields = normalize_fields(&dto.fields);
        let missing = missing_fields(kind, &fields);
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "กรุณากรอกข้อมูลให้ครบถ้วน: {}",
                missing.join(", ")
            )));
        }

        if let Some(project_id) = dto.project_id {
            ensure_project_access(&self.pool, user, project_id).await?;
        }

        let template = self.load_template(kind).await?;
        let today = today_in_thailand();

        let renderer = Arc::clone(&self.renderer);
        let document =
            tokio::task::spawn_blocking(move || renderer.render(&template, &fields, today))
                .await
                .map_err(|e| AppError::Internal(format!("Document render task failed: {}", e)))??;

        let key = self
            .storage
            .generate_key(DOCUMENTS_DIR, user.id, &storage_file_name(kind, today));
        self.storage.upload(&key, &document).await?;

        // Bytes and row are not written atomically. A failed insert leaves the file behind.
        let record = NewUserFile {
            original_name: display_name(kind, dto.file_name.as_deref(), today),
            storage_path: key.clone(),
            extension: DOCX_EXTENSION.to_string(),
            document_kind: Some(kind.slug().to_string()),
            size_bytes: document.len() as i64,
            owner_id: user.id,
            project_id: dto.project_id,
        };
        let file = self.file_service.insert_record(record).await.map_err(|e| {
            error!("Generated document orphaned at '{}': {}", key, e);
            e
        })?;

        info!(
            "Document generated: kind={}, file={}, owner={}",
            kind, file.id, user.id
        );
        Ok(file)
    }
}
