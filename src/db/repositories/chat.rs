//! Chat message repository

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::{ChatMessage, ConversationSummary};
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn create(&self, from_user_id: &str, to_user_id: &str, message: &str) -> Result<ChatMessage>;

    /// Both directions between two users, oldest first
    async fn conversation(&self, user_id: &str, contact_id: &str) -> Result<Vec<ChatMessage>>;

    /// Mark everything `from_user_id` sent to `to_user_id` as read
    async fn mark_read(&self, from_user_id: &str, to_user_id: &str) -> Result<u64>;

    /// Last message and unread count per contact of `user_id`
    async fn summaries(&self, user_id: &str) -> Result<HashMap<String, ConversationSummary>>;
}

const SELECT: &str = "SELECT id, from_user_id, to_user_id, message, created_date, is_read FROM chat_messages";

pub struct SqlxChatRepository {
    pool: DynDatabasePool,
}

impl SqlxChatRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ChatRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ChatRepository for SqlxChatRepository {
    async fn create(&self, from_user_id: &str, to_user_id: &str, message: &str) -> Result<ChatMessage> {
        let created_date = Utc::now();
        let sql = "INSERT INTO chat_messages (from_user_id, to_user_id, message, created_date, is_read) \
                   VALUES (?, ?, ?, ?, ?)";
        let id = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(from_user_id)
                .bind(to_user_id)
                .bind(message)
                .bind(created_date)
                .bind(false)
                .execute(p)
                .await
                .context("Failed to save chat message")?
                .last_id()
        });
        Ok(ChatMessage {
            id,
            from_user_id: from_user_id.to_string(),
            to_user_id: to_user_id.to_string(),
            message: message.to_string(),
            created_date,
            is_read: false,
        })
    }

    async fn conversation(&self, user_id: &str, contact_id: &str) -> Result<Vec<ChatMessage>> {
        let sql = format!(
            "{} WHERE (from_user_id = ? AND to_user_id = ?) OR (from_user_id = ? AND to_user_id = ?) \
             ORDER BY created_date, id",
            SELECT
        );
        let messages = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, ChatMessage>(&sql)
                .bind(user_id)
                .bind(contact_id)
                .bind(contact_id)
                .bind(user_id)
                .fetch_all(p)
                .await
                .context("Failed to load conversation")?
        });
        Ok(messages)
    }

    async fn mark_read(&self, from_user_id: &str, to_user_id: &str) -> Result<u64> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query(
                "UPDATE chat_messages SET is_read = 1 WHERE from_user_id = ? AND to_user_id = ? AND is_read = 0",
            )
            .bind(from_user_id)
            .bind(to_user_id)
            .execute(p)
            .await
            .context("Failed to mark messages read")?
            .rows_affected()
        });
        Ok(affected)
    }

    async fn summaries(&self, user_id: &str) -> Result<HashMap<String, ConversationSummary>> {
        let sql = format!(
            "{} WHERE from_user_id = ? OR to_user_id = ? ORDER BY created_date, id",
            SELECT
        );
        let messages = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, ChatMessage>(&sql)
                .bind(user_id)
                .bind(user_id)
                .fetch_all(p)
                .await
                .context("Failed to load chat history")?
        });
        Ok(summarize(user_id, messages))
    }
}

/// Fold a chronologically ordered history into per-contact summaries
fn summarize(user_id: &str, messages: Vec<ChatMessage>) -> HashMap<String, ConversationSummary> {
    let mut summaries: HashMap<String, ConversationSummary> = HashMap::new();
    for msg in messages {
        let incoming = msg.to_user_id == user_id;
        let contact = if incoming { msg.from_user_id } else { msg.to_user_id };
        let entry = summaries.entry(contact).or_default();
        if incoming && !msg.is_read {
            entry.unread_count += 1;
        }
        entry.last_message = Some(msg.message);
        entry.last_message_date = Some(msg.created_date);
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, migrated_pool};

    async fn setup() -> SqlxChatRepository {
        let pool = migrated_pool().await;
        for id in ["alice", "bob", "carol"] {
            insert_user(&pool, id).await;
        }
        SqlxChatRepository::new(pool)
    }

    #[tokio::test]
    async fn test_conversation_is_two_way_and_ordered() {
        let repo = setup().await;
        repo.create("alice", "bob", "hi").await.unwrap();
        repo.create("bob", "alice", "hello").await.unwrap();
        repo.create("alice", "carol", "other thread").await.unwrap();

        let convo = repo.conversation("alice", "bob").await.unwrap();
        let texts: Vec<&str> = convo.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, vec!["hi", "hello"]);
        assert_eq!(repo.conversation("bob", "alice").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mark_read_only_touches_incoming() {
        let repo = setup().await;
        repo.create("bob", "alice", "1").await.unwrap();
        repo.create("bob", "alice", "2").await.unwrap();
        repo.create("alice", "bob", "3").await.unwrap();

        assert_eq!(repo.mark_read("bob", "alice").await.unwrap(), 2);
        let convo = repo.conversation("alice", "bob").await.unwrap();
        assert!(convo.iter().filter(|m| m.to_user_id == "alice").all(|m| m.is_read));
        assert!(convo.iter().filter(|m| m.to_user_id == "bob").all(|m| !m.is_read));
    }

    #[tokio::test]
    async fn test_summaries() {
        let repo = setup().await;
        repo.create("bob", "alice", "ping").await.unwrap();
        repo.create("bob", "alice", "ping again").await.unwrap();
        repo.create("alice", "carol", "hey carol").await.unwrap();

        let summaries = repo.summaries("alice").await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries["bob"].unread_count, 2);
        assert_eq!(summaries["bob"].last_message.as_deref(), Some("ping again"));
        assert_eq!(summaries["carol"].unread_count, 0);
        assert_eq!(summaries["carol"].last_message.as_deref(), Some("hey carol"));
    }
}
