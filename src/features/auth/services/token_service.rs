use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::{AuthenticatedUser, SessionClaims};
use crate::features::users::models::User;

/// Issues and validates HS256 session tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
    cookie_name: String,
    cookie_secure: bool,
}

/// A freshly issued session token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_secs: config.token_ttl.as_secs() as i64,
            cookie_name: config.cookie_name.clone(),
            cookie_secure: config.cookie_secure,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Create a session token carrying the user's id and role
    pub fn issue(&self, user: &User) -> Result<IssuedToken> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            iat: now,
            exp: now + self.ttl_secs,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_in: self.ttl_secs,
        })
    }

    pub fn validate(&self, token: &str) -> Result<AuthenticatedUser> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 30;

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("Rejected session token: {}", e);
            AppError::Auth("เซสชันไม่ถูกต้องหรือหมดอายุ".to_string())
        })?;

        Ok(data.claims.into())
    }

    /// `Set-Cookie` value for a new session
    pub fn session_cookie(&self, token: &IssuedToken) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name, token.token, token.expires_in
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that clears the session
    pub fn clear_cookie(&self) -> String {
        let mut cookie = format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            self.cookie_name
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::models::UserRole;
    use std::time::Duration;
    use uuid::Uuid;

    fn config(ttl: u64) -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-of-sufficient-length".to_string(),
            token_ttl: Duration::from_secs(ttl),
            cookie_name: "session_token".to_string(),
            cookie_secure: true,
            login_max_attempts: 5,
            login_window: Duration::from_secs(60),
        }
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "สมหญิง ใจดี".to_string(),
            email: "somying@example.com".to_string(),
            password_hash: String::new(),
            role: UserRole::Admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issued_token_validates_with_claims() {
        let service = TokenService::new(&config(3600));
        let user = user();
        let issued = service.issue(&user).unwrap();
        assert_eq!(issued.expires_in, 3600);

        let decoded = service.validate(&issued.token).unwrap();
        assert_eq!(decoded.id, user.id);
        assert_eq!(decoded.role, UserRole::Admin);
        assert_eq!(decoded.name, user.name);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let service = TokenService::new(&config(3600));
        let mut other_config = config(3600);
        other_config.jwt_secret = "another-secret-of-sufficient-len".to_string();
        let other = TokenService::new(&other_config);

        let issued = other.issue(&user()).unwrap();
        assert!(matches!(
            service.validate(&issued.token),
            Err(AppError::Auth(_))
        ));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let service = TokenService::new(&config(3600));
        assert!(service.validate("not.a.token").is_err());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let service = TokenService::new(&config(60));
        let cookie = service.session_cookie(&IssuedToken {
            token: "abc".to_string(),
            expires_in: 60,
        });
        assert!(cookie.starts_with("session_token=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=60"));
        assert!(cookie.ends_with("; Secure"));
        assert!(service.clear_cookie().contains("Max-Age=0"));
    }
}
