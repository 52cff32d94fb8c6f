use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;

use crate::core::error::{AppError, Result};

lazy_static! {
    /// Verified against when the email is unknown, so both failure paths cost the same
    static ref DUMMY_HASH: String =
        hash("not-a-real-password", DEFAULT_COST).unwrap_or_default();
}

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a password with bcrypt on the blocking pool
pub async fn hash_password(password: &str) -> Result<String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "รหัสผ่านต้องมีอย่างน้อย {} ตัวอักษร",
            MIN_PASSWORD_LENGTH
        )));
    }

    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored hash; `None` burns the same work on a dummy hash
pub async fn verify_password(password: &str, stored_hash: Option<&str>) -> Result<bool> {
    let password = password.to_string();
    let known = stored_hash.is_some();
    let stored = stored_hash
        .map(str::to_string)
        .unwrap_or_else(|| DUMMY_HASH.clone());

    let matched = tokio::task::spawn_blocking(move || verify(password, &stored))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
        .unwrap_or(false);

    Ok(known && matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hashed = hash_password("correct horse").await.unwrap();
        assert!(verify_password("correct horse", Some(&hashed)).await.unwrap());
        assert!(!verify_password("wrong horse", Some(&hashed)).await.unwrap());
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let result = hash_password("short").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_user_never_matches() {
        assert!(!verify_password("not-a-real-password", None).await.unwrap());
    }
}
