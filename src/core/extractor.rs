use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;

/// JSON extractor whose rejections use the standard error envelope
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppJsonRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppJsonRejection(rejection)),
        }
    }
}

pub struct AppJsonRejection(JsonRejection);

impl IntoResponse for AppJsonRejection {
    fn into_response(self) -> Response {
        let message = match self.0 {
            JsonRejection::JsonDataError(err) => format!("ข้อมูล JSON ไม่ถูกต้อง: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("รูปแบบ JSON ไม่ถูกต้อง: {}", err),
            JsonRejection::MissingJsonContentType(_) => {
                "ต้องระบุ Content-Type: application/json".to_string()
            }
            _ => "ไม่สามารถอ่านข้อมูลที่ส่งมาได้".to_string(),
        };

        AppError::BadRequest(message).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("กรุณาเข้าสู่ระบบ".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Router};
    use axum_test::TestServer;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Payload {
        name: String,
    }

    async fn echo(AppJson(payload): AppJson<Payload>) -> String {
        payload.name
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let server = TestServer::new(Router::new().route("/echo", post(echo))).unwrap();

        let response = server
            .post("/echo")
            .json(&serde_json::json!({ "other": 1 }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);

        let ok = server
            .post("/echo")
            .json(&serde_json::json!({ "name": "โครงการ" }))
            .await;
        ok.assert_status_ok();
        ok.assert_text("โครงการ");
    }
}
