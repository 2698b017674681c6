//! Rate limiter for login attempts
//!
//! Failed attempts are tracked per login identifier (email or user name,
//! case-insensitive) inside a sliding window.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::AuthConfig;

pub struct LoginRateLimiter {
    attempts: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
    max_attempts: usize,
    window: Duration,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
            max_attempts,
            window,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.max_login_attempts,
            Duration::seconds(config.login_window_seconds),
        )
    }

    /// Whether the identifier has used up its attempts in the current window
    pub async fn is_limited(&self, identifier: &str) -> bool {
        let mut attempts = self.attempts.write().await;
        let cutoff = Utc::now() - self.window;

        let Some(times) = attempts.get_mut(&identifier.to_lowercase()) else {
            return false;
        };
        times.retain(|time| *time > cutoff);
        times.len() >= self.max_attempts
    }

    pub async fn record_failure(&self, identifier: &str) {
        let mut attempts = self.attempts.write().await;
        attempts
            .entry(identifier.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Forget failures after a successful login
    pub async fn clear(&self, identifier: &str) {
        self.attempts.write().await.remove(&identifier.to_lowercase());
    }

    /// Drop identifiers whose attempts have all aged out
    pub async fn cleanup(&self) {
        let cutoff = Utc::now() - self.window;
        let mut attempts = self.attempts.write().await;
        attempts.retain(|_, times| {
            times.retain(|time| *time > cutoff);
            !times.is_empty()
        });
    }

    pub async fn tracked(&self) -> usize {
        self.attempts.read().await.len()
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}
