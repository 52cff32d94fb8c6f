use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::documents::dtos::{DocumentKindDto, GenerateDocumentDto};
use crate::features::documents::models::DocumentKind;
use crate::features::documents::services::DocumentService;
use crate::features::files::dtos::UserFileResponseDto;
use crate::shared::types::{ApiResponse, Meta};

/// List the document kinds that can be generated
#[utoipa::path(
    get,
    path = "/api/documents/kinds",
    responses(
        (status = 200, description = "Available document kinds", body = ApiResponse<Vec<DocumentKindDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "documents"
)]
pub async fn list_kinds() -> Json<ApiResponse<Vec<DocumentKindDto>>> {
    let kinds: Vec<DocumentKindDto> = DocumentKind::ALL.into_iter().map(Into::into).collect();
    let total = kinds.len() as i64;
    Json(ApiResponse::success(Some(kinds), None, Some(Meta::total(total))))
}

/// Generate a DOCX document from its template
///
/// The result is stored as one of the caller's files.
#[utoipa::path(
    post,
    path = "/api/documents/{kind}",
    params(("kind" = DocumentKind, Path, description = "Document kind slug")),
    request_body = GenerateDocumentDto,
    responses(
        (status = 201, description = "Document generated", body = ApiResponse<UserFileResponseDto>),
        (status = 400, description = "Required fields missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Project belongs to someone else"),
        (status = 404, description = "Unknown document kind or project"),
        (status = 500, description = "Template missing or broken")
    ),
    security(("bearer_auth" = [])),
    tag = "documents"
)]
pub async fn generate_document(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    Path(kind): Path<String>,
    AppJson(dto): AppJson<GenerateDocumentDto>,
) -> Result<(StatusCode, Json<ApiResponse<UserFileResponseDto>>)> {
    let file = service.generate(&user, &kind, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(file.into()),
            Some("สร้างเอกสารเรียบร้อยแล้ว".to_string()),
            None,
        )),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_kinds_returns_every_kind() {
        let Json(response) = list_kinds().await;
        let kinds = response.data.unwrap();

        assert_eq!(kinds.len(), DocumentKind::ALL.len());
        assert_eq!(response.meta.unwrap().total, 5);
        let approval = kinds
            .iter()
            .find(|k| k.kind == DocumentKind::Approval)
            .unwrap();
        assert!(approval.required_fields.contains(&"amount".to_string()));
    }
}
