//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Bearer session; `id` is the opaque token handed to the client
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Open a session for `user_id` valid for `ttl_hours`
    pub fn new(user_id: String, ttl_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            id: generate_token(),
            user_id,
            expires_at: now + Duration::hours(ttl_hours),
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// 64 hex chars from two v4 UUIDs
fn generate_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_live() {
        let session = Session::new("u1".into(), 24);
        assert!(!session.is_expired());
        assert_eq!(session.id.len(), 64);
    }

    #[test]
    fn test_negative_ttl_is_expired() {
        let session = Session::new("u1".into(), -1);
        assert!(session.is_expired());
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = Session::new("u1".into(), 1);
        let b = Session::new("u1".into(), 1);
        assert_ne!(a.id, b.id);
    }
}
