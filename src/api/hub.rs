//! Chat WebSocket endpoint (`GET /signalRHub`)
//!
//! One task per socket: it drains the connection's hub channel into the
//! socket, handles client frames and pings idle clients.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::time::{interval_at, Instant};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Action, PermissionGroup};
use crate::services::{ClientFrame, HubEvent};

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<AppState> {
    Router::new().route("/signalRHub", get(connect))
}

async fn connect(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(PermissionGroup::Chat, Action::View)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, auth)))
}

async fn handle_socket(socket: WebSocket, state: AppState, auth: AuthenticatedUser) {
    let user_id = auth.id().to_string();
    let (connection_id, mut outbound) = state.hub.register(&user_id).await;
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut ping = interval_at(Instant::now() + PING_INTERVAL, PING_INTERVAL);

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_frame(&state, &auth, text.as_str()).await {
                            if ws_tx.send(Message::Text(reply.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_tx.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(user_id = %user_id, error = %e, "Chat socket error");
                        break;
                    }
                }
            }
            frame = outbound.recv() => {
                // the hub dropped this connection (sessions revoked)
                let Some(frame) = frame else {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                };
                if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            _ = ping.tick() => {
                let Ok(frame) = serde_json::to_string(&HubEvent::Ping) else { continue };
                if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    state.hub.unregister(&user_id, connection_id).await;
}

/// Handle one client frame, returning a frame to answer on this socket only
async fn handle_frame(state: &AppState, auth: &AuthenticatedUser, text: &str) -> Option<String> {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(user_id = %auth.id(), error = %e, "Unreadable chat frame");
            return None;
        }
    };

    match frame {
        ClientFrame::Ping => serde_json::to_string(&HubEvent::Ping).ok(),
        ClientFrame::SendChatMessage(input) => {
            if auth.require(PermissionGroup::Chat, Action::Send).is_err() {
                tracing::warn!(user_id = %auth.id(), "Chat send denied");
                return None;
            }
            // delivery to both parties happens through the hub
            if let Err(e) = state.chat.send(auth.id(), input).await {
                tracing::warn!(user_id = %auth.id(), error = %e, "Chat message rejected");
            }
            None
        }
    }
}
