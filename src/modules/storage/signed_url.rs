//! Time-limited download links.
//!
//! The signature is `hex(HMAC-SHA256(secret, "<file_id>:<expires>"))` where
//! `expires` is a unix timestamp in seconds.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const INVALID_LINK: &str = "ลิงก์ดาวน์โหลดไม่ถูกต้องหรือหมดอายุแล้ว";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

pub struct UrlSigner {
    secret: Vec<u8>,
    ttl: Duration,
    base_url: String,
}

impl UrlSigner {
    pub fn new(secret: &str, ttl: Duration, base_url: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn mac(&self, file_id: Uuid, expires: i64) -> Result<HmacSha256, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
        mac.update(format!("{}:{}", file_id, expires).as_bytes());
        Ok(mac)
    }

    pub fn sign(&self, file_id: Uuid, expires: i64) -> Result<String, AppError> {
        Ok(hex::encode(self.mac(file_id, expires)?.finalize().into_bytes()))
    }

    /// Build a link for the public signed download route
    pub fn issue(&self, file_id: Uuid, now: DateTime<Utc>) -> Result<SignedUrl, AppError> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| AppError::Internal(format!("Invalid signed URL TTL: {}", e)))?;
        let expires_at = now + ttl;
        let expires = expires_at.timestamp();
        let signature = self.sign(file_id, expires)?;

        Ok(SignedUrl {
            url: format!(
                "{}/api/files/signed/{}?expires={}&signature={}",
                self.base_url, file_id, expires, signature
            ),
            expires_at,
        })
    }

    /// Check an incoming link. Comparison is constant time.
    pub fn verify(
        &self,
        file_id: Uuid,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if now.timestamp() > expires {
            return Err(AppError::Forbidden(INVALID_LINK.to_string()));
        }

        let provided =
            hex::decode(signature).map_err(|_| AppError::Forbidden(INVALID_LINK.to_string()))?;

        self.mac(file_id, expires)?
            .verify_slice(&provided)
            .map_err(|_| AppError::Forbidden(INVALID_LINK.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> UrlSigner {
        UrlSigner::new(
            "signed-url-test-secret",
            Duration::from_secs(600),
            "https://docs.example.go.th/",
        )
    }

    #[test]
    fn test_issue_builds_verifiable_url() {
        let signer = signer();
        let id = Uuid::new_v4();
        let now = Utc::now();

        let signed = signer.issue(id, now).unwrap();
        let expires = signed.expires_at.timestamp();
        let signature = signer.sign(id, expires).unwrap();

        assert_eq!(
            signed.url,
            format!(
                "https://docs.example.go.th/api/files/signed/{}?expires={}&signature={}",
                id, expires, signature
            )
        );
        assert_eq!(expires - now.timestamp(), 600);
        assert!(signer.verify(id, expires, &signature, now).is_ok());
    }

    #[test]
    fn test_expired_link_rejected() {
        let signer = signer();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let expires = now.timestamp() - 1;
        let signature = signer.sign(id, expires).unwrap();

        let result = signer.verify(id, expires, &signature, now);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_tampered_link_rejected() {
        let signer = signer();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let expires = now.timestamp() + 60;
        let signature = signer.sign(id, expires).unwrap();

        assert!(signer.verify(Uuid::new_v4(), expires, &signature, now).is_err());
        assert!(signer.verify(id, expires + 1, &signature, now).is_err());
        assert!(signer.verify(id, expires, "not-hex", now).is_err());
        assert!(signer.verify(id, expires, &"0".repeat(64), now).is_err());
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let other = UrlSigner::new("another-secret", Duration::from_secs(600), "http://x");
        let id = Uuid::new_v4();
        assert_ne!(signer().sign(id, 1).unwrap(), other.sign(id, 1).unwrap());
    }
}
