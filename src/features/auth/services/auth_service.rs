use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{
    AuthResponseDto, AuthUserDto, LoginRequestDto, RegisterRequestDto,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::password::{hash_password, verify_password};
use crate::features::auth::services::{IssuedToken, LoginLimiter, TokenService};
use crate::features::users::models::{User, UserRole, USER_COLUMNS};
use crate::shared::thai::clean_single_line;

/// Same message for unknown email and wrong password
pub const INVALID_CREDENTIALS: &str = "อีเมลหรือรหัสผ่านไม่ถูกต้อง";

/// Service for credential registration and login
pub struct AuthService {
    pool: PgPool,
    token_service: Arc<TokenService>,
    limiter: LoginLimiter,
}

impl AuthService {
    pub fn new(pool: PgPool, token_service: Arc<TokenService>, limiter: LoginLimiter) -> Self {
        Self {
            pool,
            token_service,
            limiter,
        }
    }

    pub fn token_service(&self) -> &TokenService {
        &self.token_service
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to look up user by email: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Register a new member account
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<(AuthResponseDto, IssuedToken)> {
        let email = Self::normalize_email(&dto.email);
        let name = clean_single_line(&dto.name);
        if name.is_empty() {
            return Err(AppError::Validation("กรุณากรอกชื่อ".to_string()));
        }

        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("อีเมลนี้ถูกใช้งานแล้ว".to_string()));
        }

        let password_hash = hash_password(&dto.password).await?;

        let sql = format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&name)
            .bind(&email)
            .bind(&password_hash)
            .bind(UserRole::Member)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::Conflict("อีเมลนี้ถูกใช้งานแล้ว".to_string())
                }
                other => {
                    tracing::error!("Failed to insert user: {:?}", other);
                    AppError::Database(other)
                }
            })?;

        info!("User registered: id={}", user.id);

        let issued = self.token_service.issue(&user)?;
        Ok((Self::auth_response(&issued, user), issued))
    }

    /// Verify credentials and issue a session token
    pub async fn login(&self, dto: LoginRequestDto) -> Result<(AuthResponseDto, IssuedToken)> {
        let email = Self::normalize_email(&dto.email);
        self.limiter.check(&email)?;

        let user = self.find_by_email(&email).await?;
        let verified =
            verify_password(&dto.password, user.as_ref().map(|u| u.password_hash.as_str())).await?;

        let user = match user {
            Some(user) if verified => user,
            _ => {
                self.limiter.record_failure(&email);
                warn!("Failed login attempt for {}", email);
                return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
            }
        };

        self.limiter.reset(&email);
        info!("User logged in: id={}", user.id);

        let issued = self.token_service.issue(&user)?;
        Ok((Self::auth_response(&issued, user), issued))
    }

    /// Fetch the current user's account row
    pub async fn get_current_user(&self, user: &AuthenticatedUser) -> Result<AuthUserDto> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::Unauthorized("ไม่พบบัญชีผู้ใช้".to_string()))?;

        Ok(row.into())
    }

    fn auth_response(issued: &IssuedToken, user: User) -> AuthResponseDto {
        AuthResponseDto {
            access_token: issued.token.clone(),
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            user: user.into(),
        }
    }
}
