use crate::core::error::AppError;
use crate::features::auth::TokenService;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::now_v7().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let decoded = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Basic "))
                .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
                .and_then(|bytes| String::from_utf8(bytes).ok());

            if decoded.as_deref() == Some(credentials.as_str()) {
                return Ok(next.run(req).await);
            }

            Err((
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")],
                "Unauthorized",
            )
                .into_response())
        })
    }
}

/// Session token from `Authorization: Bearer`, falling back to the session cookie
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(bearer) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        let token = bearer.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub async fn auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_session_token(req.headers(), tokens.cookie_name())
        .ok_or_else(|| AppError::Unauthorized("กรุณาเข้าสู่ระบบ".to_string()))?;

    let user = tokens.validate(&token)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AuthConfig;
    use crate::features::auth::model::AuthenticatedUser;
    use crate::features::users::models::{User, UserRole};
    use axum::{middleware::from_fn_with_state, routing::get, Router};
    use axum_test::TestServer;
    use chrono::Utc;
    use std::time::Duration;

    fn token_service() -> Arc<TokenService> {
        Arc::new(TokenService::new(&AuthConfig {
            jwt_secret: "middleware-test-secret-0123456789".to_string(),
            token_ttl: Duration::from_secs(600),
            cookie_name: "session_token".to_string(),
            cookie_secure: false,
            login_max_attempts: 5,
            login_window: Duration::from_secs(60),
        }))
    }

    fn token_for(tokens: &TokenService, role: UserRole) -> String {
        let user = User {
            id: Uuid::new_v4(),
            name: "ผู้ทดสอบ".to_string(),
            email: "tester@example.com".to_string(),
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        tokens.issue(&user).unwrap().token
    }

    async fn whoami(user: AuthenticatedUser) -> String {
        user.role.to_string()
    }

    fn app(tokens: Arc<TokenService>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(tokens, auth_middleware))
    }

    #[test]
    fn test_extract_bearer_before_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer from-header".parse().unwrap());
        headers.insert(header::COOKIE, "session_token=from-cookie".parse().unwrap());
        assert_eq!(
            extract_session_token(&headers, "session_token").as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn test_extract_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; session_token=abc.def; lang=th".parse().unwrap(),
        );
        assert_eq!(
            extract_session_token(&headers, "session_token").as_deref(),
            Some("abc.def")
        );
        assert_eq!(extract_session_token(&headers, "other"), None);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let server = TestServer::new(app(token_service())).unwrap();
        server
            .get("/whoami")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bearer_token_authenticates() {
        let tokens = token_service();
        let token = token_for(&tokens, UserRole::Admin);
        let server = TestServer::new(app(tokens)).unwrap();

        let response = server
            .get("/whoami")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        response.assert_text("admin");
    }

    #[tokio::test]
    async fn test_cookie_token_authenticates() {
        let tokens = token_service();
        let token = token_for(&tokens, UserRole::Member);
        let server = TestServer::new(app(tokens)).unwrap();

        let response = server
            .get("/whoami")
            .add_header(
                header::COOKIE,
                HeaderValue::from_str(&format!("session_token={}", token)).unwrap(),
            )
            .await;
        response.assert_status_ok();
        response.assert_text("member");
    }

    #[tokio::test]
    async fn test_tampered_token_is_unauthorized() {
        let tokens = token_service();
        let token = format!("{}x", token_for(&tokens, UserRole::Member));
        let server = TestServer::new(app(tokens)).unwrap();

        server
            .get("/whoami")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
