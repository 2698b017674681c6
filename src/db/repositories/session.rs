//! Session repository
//!
//! Bearer sessions issued at login. Tokens are opaque; expiry is checked by
//! the caller and swept periodically with `delete_expired`.

use crate::db::DynDatabasePool;
use crate::models::Session;
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID (token)
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete all sessions for a user
    async fn delete_by_user(&self, user_id: &str) -> Result<u64>;

    /// Delete expired sessions, returning how many went
    async fn delete_expired(&self) -> Result<u64>;
}

pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        with_pool!(self.pool, |p| {
            sqlx::query("INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)")
                .bind(&session.id)
                .bind(&session.user_id)
                .bind(session.expires_at)
                .bind(session.created_at)
                .execute(p)
                .await
                .context("Failed to create session")?;
        });
        Ok(session.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        let session = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Session>(
                "SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(p)
            .await
            .context("Failed to get session")?
        });
        Ok(session)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(id)
                .execute(p)
                .await
                .context("Failed to delete session")?;
        });
        Ok(())
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<u64> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM sessions WHERE user_id = ?")
                .bind(user_id)
                .execute(p)
                .await
                .context("Failed to delete user sessions")?
                .rows_affected()
        });
        Ok(affected)
    }

    async fn delete_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
                .bind(now)
                .execute(p)
                .await
                .context("Failed to delete expired sessions")?
                .rows_affected()
        });
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, migrated_pool};

    #[tokio::test]
    async fn test_create_and_get_session() {
        let pool = migrated_pool().await;
        insert_user(&pool, "u1").await;
        let repo = SqlxSessionRepository::new(pool);

        let session = Session::new("u1".into(), 24);
        repo.create(&session).await.unwrap();

        let found = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(found.user_id, "u1");
        assert!(!found.is_expired());
    }

    #[tokio::test]
    async fn test_delete_expired_keeps_live_sessions() {
        let pool = migrated_pool().await;
        insert_user(&pool, "u1").await;
        let repo = SqlxSessionRepository::new(pool);

        let live = Session::new("u1".into(), 24);
        let stale = Session::new("u1".into(), -2);
        repo.create(&live).await.unwrap();
        repo.create(&stale).await.unwrap();

        assert_eq!(repo.delete_expired().await.unwrap(), 1);
        assert!(repo.get_by_id(&live.id).await.unwrap().is_some());
        assert!(repo.get_by_id(&stale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_by_user() {
        let pool = migrated_pool().await;
        insert_user(&pool, "u1").await;
        insert_user(&pool, "u2").await;
        let repo = SqlxSessionRepository::new(pool);

        repo.create(&Session::new("u1".into(), 1)).await.unwrap();
        repo.create(&Session::new("u1".into(), 1)).await.unwrap();
        let other = Session::new("u2".into(), 1);
        repo.create(&other).await.unwrap();

        assert_eq!(repo.delete_by_user("u1").await.unwrap(), 2);
        assert!(repo.get_by_id(&other.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_single() {
        let pool = migrated_pool().await;
        insert_user(&pool, "u1").await;
        let repo = SqlxSessionRepository::new(pool);

        let session = Session::new("u1".into(), 1);
        repo.create(&session).await.unwrap();
        repo.delete(&session.id).await.unwrap();
        assert!(repo.get_by_id(&session.id).await.unwrap().is_none());
    }
}
