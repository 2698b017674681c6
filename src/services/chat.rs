//! Chat service
//!
//! Persists direct messages and pushes them through the `ChatHub` to every
//! live connection of sender and recipient.

use crate::db::repositories::{ChatRepository, UserRepository};
use crate::models::{ChatContact, ChatMessage, SendMessageInput};
use crate::services::hub::{ChatHub, HubEvent};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Sender deleted or deactivated since the connection was opened
    #[error("{0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct ChatService {
    chat_repo: Arc<dyn ChatRepository>,
    user_repo: Arc<dyn UserRepository>,
    hub: Arc<ChatHub>,
}

impl ChatService {
    pub fn new(
        chat_repo: Arc<dyn ChatRepository>,
        user_repo: Arc<dyn UserRepository>,
        hub: Arc<ChatHub>,
    ) -> Self {
        Self {
            chat_repo,
            user_repo,
            hub,
        }
    }

    #[cfg(test)]
    pub fn hub(&self) -> &Arc<ChatHub> {
        &self.hub
    }

    /// Messages between the two users, oldest first. Everything the contact
    /// sent to `user_id` is marked read on the way.
    pub async fn conversation(&self, user_id: &str, contact_id: &str) -> Result<Vec<ChatMessage>, ChatError> {
        self.chat_repo.mark_read(contact_id, user_id).await?;
        Ok(self.chat_repo.conversation(user_id, contact_id).await?)
    }

    /// Every other active user with presence and conversation summary.
    ///
    /// Most recent conversation first; users never talked to come last,
    /// ordered by name.
    pub async fn contacts(&self, user_id: &str) -> Result<Vec<ChatContact>, ChatError> {
        let summaries = self.chat_repo.summaries(user_id).await?;
        let online = self.hub.online_users().await;

        let mut contacts: Vec<ChatContact> = self
            .user_repo
            .list()
            .await?
            .into_iter()
            .filter(|u| u.is_active && u.id != user_id)
            .map(|u| {
                let summary = summaries.get(&u.id).cloned().unwrap_or_default();
                ChatContact {
                    is_online: online.contains(&u.id),
                    id: u.id,
                    user_name: u.user_name,
                    first_name: u.first_name,
                    last_name: u.last_name,
                    email: u.email,
                    profile_picture_url: u.profile_picture_url,
                    last_message: summary.last_message,
                    last_message_date: summary.last_message_date,
                    unread_count: summary.unread_count,
                }
            })
            .collect();

        contacts.sort_by(compare_contacts);
        Ok(contacts)
    }

    /// Save a message and push it to both parties
    pub async fn send(&self, from_user_id: &str, input: SendMessageInput) -> Result<ChatMessage, ChatError> {
        let text = input.message.trim();
        if text.is_empty() {
            return Err(ChatError::Validation("Message cannot be empty".to_string()));
        }
        let to_user_id = input.to_user_id.trim();
        if to_user_id == from_user_id {
            return Err(ChatError::Validation("You cannot send a message to yourself".to_string()));
        }
        match self.user_repo.get_by_id(from_user_id).await? {
            Some(user) if user.is_active => {}
            _ => return Err(ChatError::Unauthorized("User Not Active.".to_string())),
        }
        match self.user_repo.get_by_id(to_user_id).await? {
            Some(user) if user.is_active => {}
            _ => return Err(ChatError::NotFound("Recipient not found".to_string())),
        }

        let message = self.chat_repo.create(from_user_id, to_user_id, text).await?;
        let event = HubEvent::ReceiveChatMessage(message.clone());
        let delivered = self.hub.send_to_user(to_user_id, &event).await;
        self.hub.send_to_user(from_user_id, &event).await;

        tracing::info!(
            message_id = message.id,
            from_user_id = %from_user_id,
            to_user_id = %to_user_id,
            delivered,
            "Chat message sent"
        );
        Ok(message)
    }

    /// Forward a raw payload to a user's live connections without storing it
    pub async fn forward_raw(&self, user_id: &str, payload: serde_json::Value) -> Result<usize, ChatError> {
        let delivered = self
            .hub
            .send_to_user(user_id, &HubEvent::ReceiveMessage(payload))
            .await;
        if delivered == 0 {
            return Err(ChatError::NotFound("User not connected".to_string()));
        }
        Ok(delivered)
    }
}

fn compare_contacts(a: &ChatContact, b: &ChatContact) -> Ordering {
    match (a.last_message_date, b.last_message_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => (&a.first_name, &a.last_name, &a.user_name).cmp(&(&b.first_name, &b.last_name, &b.user_name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, migrated_pool};
    use crate::db::repositories::{SqlxChatRepository, SqlxUserRepository};

    async fn setup() -> ChatService {
        let pool = migrated_pool().await;
        for id in ["alice", "bob", "carol", "dave"] {
            insert_user(&pool, id).await;
        }
        ChatService::new(
            SqlxChatRepository::boxed(pool.clone()),
            SqlxUserRepository::boxed(pool),
            Arc::new(ChatHub::new(16)),
        )
    }

    fn msg(to: &str, text: &str) -> SendMessageInput {
        SendMessageInput {
            to_user_id: to.to_string(),
            message: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_validation() {
        let chat = setup().await;
        assert!(matches!(chat.send("alice", msg("bob", "  ")).await, Err(ChatError::Validation(_))));
        assert!(matches!(chat.send("alice", msg("alice", "me")).await, Err(ChatError::Validation(_))));
        assert!(matches!(chat.send("alice", msg("ghost", "hi")).await, Err(ChatError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_inactive_or_deleted_sender_cannot_send() {
        let pool = migrated_pool().await;
        for id in ["alice", "bob", "carol"] {
            insert_user(&pool, id).await;
        }
        let users = SqlxUserRepository::boxed(pool.clone());
        let chat = ChatService::new(
            SqlxChatRepository::boxed(pool),
            users.clone(),
            Arc::new(ChatHub::new(16)),
        );

        users.set_active("alice", false).await.unwrap();
        assert!(matches!(chat.send("alice", msg("bob", "hi")).await, Err(ChatError::Unauthorized(_))));

        users.soft_delete("carol").await.unwrap();
        assert!(matches!(chat.send("carol", msg("bob", "hi")).await, Err(ChatError::Unauthorized(_))));

        assert!(chat.conversation("bob", "alice").await.unwrap().is_empty());
        assert!(chat.send("bob", msg("alice", "still there?")).await.is_err());
    }

    #[tokio::test]
    async fn test_send_pushes_to_both_parties() {
        let chat = setup().await;
        let (_, mut alice_rx) = chat.hub().register("alice").await;
        let (_, mut bob_rx) = chat.hub().register("bob").await;
        while alice_rx.try_recv().is_ok() {}
        while bob_rx.try_recv().is_ok() {}

        let saved = chat.send("alice", msg("bob", " hello bob ")).await.unwrap();
        assert_eq!(saved.message, "hello bob");

        for rx in [&mut alice_rx, &mut bob_rx] {
            let frame: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
            assert_eq!(frame["type"], "ReceiveChatMessage");
            assert_eq!(frame["payload"]["message"], "hello bob");
        }
    }

    #[tokio::test]
    async fn test_conversation_marks_read() {
        let chat = setup().await;
        chat.send("bob", msg("alice", "one")).await.unwrap();
        chat.send("alice", msg("bob", "two")).await.unwrap();

        let convo = chat.conversation("alice", "bob").await.unwrap();
        assert_eq!(convo.len(), 2);
        assert!(convo[0].is_read);
        assert!(!convo[1].is_read);
    }

    #[tokio::test]
    async fn test_contacts_ordering_and_presence() {
        let chat = setup().await;
        chat.send("carol", msg("alice", "first")).await.unwrap();
        chat.send("bob", msg("alice", "second")).await.unwrap();
        let (_, _rx) = chat.hub().register("dave").await;

        let contacts = chat.contacts("alice").await.unwrap();
        let ids: Vec<&str> = contacts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["bob", "carol", "dave"]);
        assert_eq!(contacts[0].unread_count, 1);
        assert_eq!(contacts[0].last_message.as_deref(), Some("second"));
        assert!(contacts[2].is_online);
        assert!(!contacts[0].is_online);
    }

    #[tokio::test]
    async fn test_forward_raw() {
        let chat = setup().await;
        assert!(matches!(
            chat.forward_raw("bob", serde_json::json!("ping")).await,
            Err(ChatError::NotFound(_))
        ));

        let (_, mut rx) = chat.hub().register("bob").await;
        while rx.try_recv().is_ok() {}
        assert_eq!(chat.forward_raw("bob", serde_json::json!("ping")).await.unwrap(), 1);
        let frame: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame, serde_json::json!({"type": "ReceiveMessage", "payload": "ping"}));
    }
}
