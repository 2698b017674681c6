//! Chat models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    pub from_user_id: String,
    pub to_user_id: String,
    pub message: String,
    pub created_date: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageInput {
    #[serde(default)]
    pub to_user_id: String,
    #[serde(default)]
    pub message: String,
}

/// Per-contact summary used by the chat sidebar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContact {
    pub id: String,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_picture_url: Option<String>,
    pub is_online: bool,
    pub last_message: Option<String>,
    pub last_message_date: Option<DateTime<Utc>>,
    pub unread_count: i64,
}

/// Last message and unread count between the current user and one contact
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversationSummary {
    pub last_message: Option<String>,
    pub last_message_date: Option<DateTime<Utc>>,
    pub unread_count: i64,
}
