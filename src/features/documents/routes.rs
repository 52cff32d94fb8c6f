use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::documents::handlers;
use crate::features::documents::services::DocumentService;

/// Routes that require the auth middleware, applied by the caller
pub fn routes(service: Arc<DocumentService>) -> Router {
    Router::new()
        .route("/api/documents/kinds", get(handlers::list_kinds))
        .route("/api/documents/{kind}", post(handlers::generate_document))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::documents::models::DocumentKind;
    use crate::features::files::services::FileService;
    use crate::modules::storage::{LocalStorage, UrlSigner};
    use crate::shared::test_helpers::{lazy_pool, with_member_auth};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Router over an empty template directory. Nothing here reaches Postgres.
    fn server() -> (TempDir, TestServer) {
        let dir = TempDir::new().unwrap();
        let pool = lazy_pool();
        let storage = Arc::new(LocalStorage::new(dir.path().join("storage")));
        let signer = Arc::new(UrlSigner::new(
            "document-test-secret",
            Duration::from_secs(600),
            "http://localhost:3000",
        ));
        let file_service = Arc::new(FileService::new(pool.clone(), storage.clone(), signer));
        let service = DocumentService::new(
            pool,
            storage,
            file_service,
            dir.path().join("templates"),
        );

        let server = TestServer::new(with_member_auth(routes(Arc::new(service)))).unwrap();
        (dir, server)
    }

    fn message(body: &Value) -> &str {
        body["message"].as_str().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_unknown_kind_is_not_found() {
        let (_dir, server) = server();

        let response = server
            .post("/api/documents/invoice")
            .json(&json!({ "fields": {} }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_required_fields_are_listed() {
        let (_dir, server) = server();

        let response = server
            .post("/api/documents/approval")
            .json(&json!({
                "fields": {
                    "project_name": "โครงการพัฒนาแหล่งน้ำ",
                    "subject": "ขออนุมัติดำเนินโครงการ",
                    "amount": "   "
                }
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(
            message(&body),
            "กรุณากรอกข้อมูลให้ครบถ้วน: department, to, date, amount"
        );
    }

    #[tokio::test]
    async fn test_every_kind_requires_its_fields() {
        let (_dir, server) = server();

        for kind in DocumentKind::ALL {
            let response = server
                .post(&format!("/api/documents/{}", kind.slug()))
                .json(&json!({ "fields": {} }))
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = response.json();
            let expected = format!(
                "กรุณากรอกข้อมูลให้ครบถ้วน: {}",
                kind.required_fields().join(", ")
            );
            assert_eq!(message(&body), expected, "kind {}", kind.slug());
        }
    }

    #[tokio::test]
    async fn test_missing_template_is_server_error() {
        let (_dir, server) = server();

        let response = server
            .post("/api/documents/approval")
            .json(&json!({
                "fields": {
                    "project_name": "โครงการพัฒนาแหล่งน้ำ",
                    "department": "กองช่าง",
                    "subject": "ขออนุมัติดำเนินโครงการ",
                    "to": "นายกเทศมนตรี",
                    "date": "2026-10-18",
                    "amount": 150000
                }
            }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(message(&body), "ไม่พบไฟล์แม่แบบเอกสาร");
    }
}
