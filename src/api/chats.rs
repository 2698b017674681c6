//! Chat API endpoints
//!
//! - GET /api/Chats/users - Contacts with presence and unread counts
//! - GET /api/Chats/{contactId} - Conversation history
//! - POST /api/Chats - Send a message
//! - POST /api/Chats/SaveTest?userId= - Push a raw payload to a live user

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Action, PermissionGroup, SendMessageInput};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTestQuery {
    pub user_id: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(send_message))
        .route("/users", get(list_contacts))
        .route("/SaveTest", post(save_test))
        .route("/{contact_id}", get(conversation))
}

async fn list_contacts(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Chat, Action::View)?;
    Ok(Json(state.chat.contacts(auth.id()).await?))
}

async fn conversation(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(contact_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Chat, Action::View)?;
    Ok(Json(state.chat.conversation(auth.id(), &contact_id).await?))
}

async fn send_message(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<SendMessageInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Chat, Action::Send)?;
    Ok(Json(state.chat.send(auth.id(), input).await?))
}

async fn save_test(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<SaveTestQuery>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Chat, Action::Send)?;
    state.chat.forward_raw(&query.user_id, payload).await?;
    Ok(Json("Message sent"))
}
