use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};

/// Fixed-window counter of failed logins, keyed by lower-cased email.
pub struct LoginLimiter {
    max_attempts: u32,
    window: Duration,
    failures: Mutex<HashMap<String, Window>>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

impl LoginLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.login_max_attempts, config.login_window)
    }

    fn key(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Reject when the key has used up its attempts in the current window
    pub fn check(&self, email: &str) -> Result<()> {
        self.check_at(email, Instant::now())
    }

    fn check_at(&self, email: &str, now: Instant) -> Result<()> {
        let mut failures = self
            .failures
            .lock()
            .map_err(|_| AppError::Internal("Login limiter lock poisoned".to_string()))?;

        let key = Self::key(email);
        if let Some(window) = failures.get(&key).copied() {
            if now.duration_since(window.started) >= self.window {
                failures.remove(&key);
            } else if window.count >= self.max_attempts {
                let retry_in = self.window - now.duration_since(window.started);
                tracing::warn!("Login throttled for {} ({}s left)", key, retry_in.as_secs());
                return Err(AppError::RateLimitExceeded(format!(
                    "เข้าสู่ระบบผิดพลาดหลายครั้งเกินไป กรุณาลองใหม่ในอีก {} นาที",
                    retry_in.as_secs().div_ceil(60)
                )));
            }
        }

        Ok(())
    }

    pub fn record_failure(&self, email: &str) {
        self.record_failure_at(email, Instant::now())
    }

    fn record_failure_at(&self, email: &str, now: Instant) {
        if let Ok(mut failures) = self.failures.lock() {
            let window = failures.entry(Self::key(email)).or_insert(Window {
                started: now,
                count: 0,
            });
            if now.duration_since(window.started) >= self.window {
                *window = Window {
                    started: now,
                    count: 0,
                };
            }
            window.count += 1;

            // Drop stale windows so the map does not grow without bound
            let ttl = self.window;
            failures.retain(|_, w| now.duration_since(w.started) < ttl);
        }
    }

    pub fn reset(&self, email: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(&Self::key(email));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_after_max_failures() {
        let limiter = LoginLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at("user@example.com", now).is_ok());
            limiter.record_failure_at("user@example.com", now);
        }

        let result = limiter.check_at("USER@example.com ", now);
        assert!(matches!(result, Err(AppError::RateLimitExceeded(_))));
    }

    #[test]
    fn test_window_expiry_allows_again() {
        let limiter = LoginLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        limiter.record_failure_at("a@example.com", start);
        assert!(limiter.check_at("a@example.com", start).is_err());

        let later = start + Duration::from_secs(61);
        assert!(limiter.check_at("a@example.com", later).is_ok());
    }

    #[test]
    fn test_reset_clears_counter() {
        let limiter = LoginLimiter::new(1, Duration::from_secs(60));
        limiter.record_failure("b@example.com");
        assert!(limiter.check("b@example.com").is_err());

        limiter.reset("b@example.com");
        assert!(limiter.check("b@example.com").is_ok());
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = LoginLimiter::new(1, Duration::from_secs(60));
        limiter.record_failure("c@example.com");
        assert!(limiter.check("d@example.com").is_ok());
    }
}
