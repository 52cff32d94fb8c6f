use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::documents::models::DocumentKind;

/// Request DTO for generating a document
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateDocumentDto {
    /// Project to file the document under
    pub project_id: Option<Uuid>,
    /// Display name for the generated file; `.docx` is appended when missing
    #[schema(example = "บันทึกขออนุมัติโครงการ")]
    pub file_name: Option<String>,
    /// Template fields. Strings, numbers and booleans are accepted.
    #[schema(value_type = Object, example = json!({
        "project_name": "โครงการพัฒนาแหล่งน้ำ",
        "department": "กองช่าง",
        "subject": "ขออนุมัติดำเนินโครงการ",
        "to": "นายกเทศมนตรี",
        "date": "2026-10-18",
        "amount": "150000"
    }))]
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// A document kind with the fields it needs
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentKindDto {
    pub kind: DocumentKind,
    pub title: String,
    pub required_fields: Vec<String>,
}

impl From<DocumentKind> for DocumentKindDto {
    fn from(kind: DocumentKind) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            required_fields: kind
                .required_fields()
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_accept_mixed_values() {
        let dto: GenerateDocumentDto = serde_json::from_str(
            r#"{"fields":{"project_name":"โครงการ","amount":150000,"urgent":true}}"#,
        )
        .unwrap();
        assert_eq!(dto.fields.len(), 3);
        assert!(dto.project_id.is_none());
    }

    #[test]
    fn test_kind_dto() {
        let dto = DocumentKindDto::from(DocumentKind::Summary);
        assert_eq!(dto.title, "รายงานสรุปผลโครงการ");
        assert_eq!(dto.required_fields.len(), 5);
    }
}
