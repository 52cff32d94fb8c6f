use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::users::models::{User, UserRole};

/// Request DTO for user registration
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequestDto {
    #[validate(length(min = 1, max = 100, message = "กรุณากรอกชื่อ (ไม่เกิน 100 ตัวอักษร)"))]
    pub name: String,

    #[validate(email(message = "รูปแบบอีเมลไม่ถูกต้อง"))]
    pub email: String,

    #[validate(length(min = 8, message = "รหัสผ่านต้องมีอย่างน้อย 8 ตัวอักษร"))]
    pub password: String,
}

/// Request DTO for user login
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequestDto {
    #[validate(email(message = "รูปแบบอีเมลไม่ถูกต้อง"))]
    pub email: String,

    #[validate(length(min = 1, message = "กรุณากรอกรหัสผ่าน"))]
    pub password: String,
}

/// Response DTO for authentication (register/login)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponseDto {
    /// Session JWT (also set as an HttpOnly cookie)
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Token expiry time in seconds
    pub expires_in: i64,
    pub user: AuthUserDto,
}

/// User info included in auth responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthUserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for AuthUserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;

    #[test]
    fn test_register_validation() {
        let valid = RegisterRequestDto {
            name: Name().fake(),
            email: SafeEmail().fake(),
            password: "long-enough".to_string(),
        };
        assert!(valid.validate().is_ok());

        let short_password = RegisterRequestDto {
            password: "short".to_string(),
            ..valid
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_login_rejects_bad_email() {
        let dto = LoginRequestDto {
            email: "not-an-email".to_string(),
            password: "x".to_string(),
        };
        assert!(dto.validate().is_err());
    }
}
