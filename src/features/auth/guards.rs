//! Role-based authorization guards.
//!
//! Two roles exist: `admin` and `member`. Admins can do everything members can,
//! plus the back-office endpoints under `/api/admin`.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Guard for admin-only handlers.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(user): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("กรุณาเข้าสู่ระบบ".to_string()))?;

        if !user.is_admin() {
            return Err(AppError::Forbidden(
                "เฉพาะผู้ดูแลระบบเท่านั้น".to_string(),
            ));
        }

        Ok(RequireAdmin(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{
        create_admin_user, create_member_user, with_admin_auth, with_member_auth,
    };
    use axum::{http::StatusCode, routing::get, Router};
    use axum_test::TestServer;

    async fn admin_only(RequireAdmin(user): RequireAdmin) -> String {
        user.email
    }

    fn app() -> Router {
        Router::new().route("/admin-only", get(admin_only))
    }

    #[tokio::test]
    async fn test_admin_passes() {
        let server = TestServer::new(with_admin_auth(app())).unwrap();
        let response = server.get("/admin-only").await;
        response.assert_status_ok();
        response.assert_text(create_admin_user().email);
    }

    #[tokio::test]
    async fn test_member_is_forbidden() {
        let server = TestServer::new(with_member_auth(app())).unwrap();
        let response = server.get("/admin-only").await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert!(!create_member_user().is_admin());
    }

    #[tokio::test]
    async fn test_anonymous_is_unauthorized() {
        let server = TestServer::new(app()).unwrap();
        server
            .get("/admin-only")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
