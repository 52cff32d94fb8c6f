use std::sync::Arc;

use axum::{
    routing::{delete, get, patch},
    Router,
};

use crate::features::admin::handlers;
use crate::features::admin::services::AdminService;

/// Create admin routes, nested under `/api/admin` by the caller.
/// Every handler requires the admin role.
pub fn routes(admin_service: Arc<AdminService>) -> Router {
    Router::new()
        .route("/stats", get(handlers::get_stats))
        .route("/users", get(handlers::list_users))
        .route("/users/{id}", delete(handlers::delete_user))
        .route("/users/{id}/role", patch(handlers::update_user_role))
        .route("/projects", get(handlers::list_projects))
        .route("/projects/{id}", delete(handlers::delete_project))
        .route("/projects/{id}/status", patch(handlers::update_project_status))
        .route("/files", get(handlers::list_files))
        .route("/files/{id}", delete(handlers::delete_file))
        .route("/audit-logs", get(handlers::list_audit_logs))
        .with_state(admin_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::LocalStorage;
    use crate::shared::test_helpers::{lazy_pool, with_member_auth};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    const SOME_ID: &str = "0192a000-0000-7000-8000-0000000000ff";

    fn app() -> Router {
        let service = AdminService::new(
            lazy_pool(),
            Arc::new(LocalStorage::new(std::env::temp_dir())),
        );
        Router::new().nest("/api/admin", routes(Arc::new(service)))
    }

    async fn assert_every_route(server: &TestServer, expected: StatusCode) {
        let user = format!("/api/admin/users/{}", SOME_ID);
        let role = format!("/api/admin/users/{}/role", SOME_ID);
        let project = format!("/api/admin/projects/{}", SOME_ID);
        let status = format!("/api/admin/projects/{}/status", SOME_ID);
        let file = format!("/api/admin/files/{}", SOME_ID);

        server.get("/api/admin/stats").await.assert_status(expected);
        server.get("/api/admin/users").await.assert_status(expected);
        server.delete(&user).await.assert_status(expected);
        server
            .patch(&role)
            .json(&json!({"role": "admin"}))
            .await
            .assert_status(expected);
        server.get("/api/admin/projects").await.assert_status(expected);
        server.delete(&project).await.assert_status(expected);
        server
            .patch(&status)
            .json(&json!({"status": "เสร็จสิ้น"}))
            .await
            .assert_status(expected);
        server.get("/api/admin/files").await.assert_status(expected);
        server.delete(&file).await.assert_status(expected);
        server.get("/api/admin/audit-logs").await.assert_status(expected);
    }

    #[tokio::test]
    async fn test_members_are_forbidden_everywhere() {
        let server = TestServer::new(with_member_auth(app())).unwrap();
        assert_every_route(&server, StatusCode::FORBIDDEN).await;
    }

    #[tokio::test]
    async fn test_anonymous_is_unauthorized_everywhere() {
        let server = TestServer::new(app()).unwrap();
        assert_every_route(&server, StatusCode::UNAUTHORIZED).await;
    }
}
