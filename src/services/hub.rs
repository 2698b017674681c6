//! Live chat connection registry
//!
//! Maps a user id to every open WebSocket of that user. Each connection owns
//! a bounded channel of pre-serialised JSON frames; the socket task drains
//! it. A full channel drops the frame for that connection only.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, RwLock};

use crate::config::ChatConfig;
use crate::models::{ChatMessage, SendMessageInput};

pub type ConnectionId = u64;

/// Server to client frame, serialised as `{"type": ..., "payload": ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum HubEvent {
    /// Raw message forwarded by `SaveTest`
    ReceiveMessage(serde_json::Value),
    ReceiveChatMessage(ChatMessage),
    ConnectUser(String),
    DisconnectUser(String),
    Ping,
}

/// Client to server frame
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientFrame {
    SendChatMessage(SendMessageInput),
    Ping,
}

struct Connection {
    id: ConnectionId,
    sender: mpsc::Sender<String>,
}

pub struct ChatHub {
    connections: RwLock<HashMap<String, Vec<Connection>>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl ChatHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.channel_capacity)
    }

    /// Add a connection for `user_id` and announce it with `ConnectUser`
    pub async fn register(&self, user_id: &str) -> (ConnectionId, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let mut connections = self.connections.write().await;
            connections
                .entry(user_id.to_string())
                .or_default()
                .push(Connection { id, sender });
        }

        let open_connections = self.connection_count().await;
        tracing::info!(
            user_id = %user_id,
            connection_id = id,
            open_connections = open_connections,
            "Chat connection opened"
        );
        self.broadcast(&HubEvent::ConnectUser(user_id.to_string())).await;
        (id, receiver)
    }

    /// Remove a connection. When it was the user's last one, every client
    /// gets `DisconnectUser` and this returns `true`.
    pub async fn unregister(&self, user_id: &str, connection_id: ConnectionId) -> bool {
        let went_offline = {
            let mut connections = self.connections.write().await;
            match connections.get_mut(user_id) {
                Some(list) => {
                    list.retain(|c| c.id != connection_id);
                    if list.is_empty() {
                        connections.remove(user_id);
                        true
                    } else {
                        false
                    }
                }
                None => false,
            }
        };

        tracing::info!(user_id = %user_id, connection_id, went_offline, "Chat connection closed");
        if went_offline {
            self.broadcast(&HubEvent::DisconnectUser(user_id.to_string())).await;
        }
        went_offline
    }

    /// Drop every connection of a user whose sessions were revoked.
    ///
    /// Closing the channels ends the socket tasks; clients get
    /// `DisconnectUser` when anything was open.
    pub async fn disconnect_user(&self, user_id: &str) -> usize {
        let dropped = self
            .connections
            .write()
            .await
            .remove(user_id)
            .map(|list| list.len())
            .unwrap_or(0);

        if dropped > 0 {
            tracing::info!(user_id = %user_id, dropped, "Chat connections closed by server");
            self.broadcast(&HubEvent::DisconnectUser(user_id.to_string())).await;
        }
        dropped
    }

    pub async fn is_online(&self, user_id: &str) -> bool {
        self.connections.read().await.contains_key(user_id)
    }

    pub async fn online_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.connections.read().await.keys().cloned().collect();
        users.sort();
        users
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.values().map(Vec::len).sum()
    }

    /// Push an event to every connection of one user, returning how many
    /// connections accepted it
    pub async fn send_to_user(&self, user_id: &str, event: &HubEvent) -> usize {
        let Some(frame) = encode(event) else {
            return 0;
        };
        let connections = self.connections.read().await;
        connections
            .get(user_id)
            .map(|list| deliver(user_id, list, &frame))
            .unwrap_or(0)
    }

    /// Push an event to every open connection
    pub async fn broadcast(&self, event: &HubEvent) -> usize {
        let Some(frame) = encode(event) else {
            return 0;
        };
        let connections = self.connections.read().await;
        connections
            .iter()
            .map(|(user_id, list)| deliver(user_id, list, &frame))
            .sum()
    }
}

fn encode(event: &HubEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode hub event");
            None
        }
    }
}

fn deliver(user_id: &str, list: &[Connection], frame: &str) -> usize {
    let mut delivered = 0;
    for conn in list {
        match conn.sender.try_send(frame.to_string()) {
            Ok(()) => delivered += 1,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(user_id = %user_id, connection_id = conn.id, "Chat channel full; frame dropped");
            }
            // the socket task is gone and will unregister itself
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn parse(frame: String) -> Value {
        serde_json::from_str(&frame).unwrap()
    }

    #[test]
    fn test_event_wire_format() {
        assert_eq!(
            serde_json::to_value(HubEvent::ConnectUser("u1".into())).unwrap(),
            json!({"type": "ConnectUser", "payload": "u1"})
        );
        assert_eq!(serde_json::to_value(HubEvent::Ping).unwrap(), json!({"type": "Ping"}));

        let frame: ClientFrame = serde_json::from_value(json!({
            "type": "SendChatMessage",
            "payload": {"toUserId": "u2", "message": "hi"}
        }))
        .unwrap();
        assert!(matches!(frame, ClientFrame::SendChatMessage(ref m) if m.to_user_id == "u2"));
        assert!(matches!(
            serde_json::from_value::<ClientFrame>(json!({"type": "Ping"})).unwrap(),
            ClientFrame::Ping
        ));
    }

    #[tokio::test]
    async fn test_register_announces_and_tracks() {
        let hub = ChatHub::new(8);
        let (_, mut alice_rx) = hub.register("alice").await;
        assert_eq!(parse(alice_rx.recv().await.unwrap())["type"], "ConnectUser");

        let (_, _bob_rx) = hub.register("bob").await;
        assert_eq!(
            parse(alice_rx.recv().await.unwrap()),
            json!({"type": "ConnectUser", "payload": "bob"})
        );

        assert!(hub.is_online("alice").await);
        assert_eq!(hub.online_users().await, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[tokio::test]
    async fn test_send_reaches_every_connection_of_user() {
        let hub = ChatHub::new(8);
        let (_, mut first) = hub.register("alice").await;
        let (_, mut second) = hub.register("alice").await;
        let (_, mut bob) = hub.register("bob").await;
        assert_eq!(hub.connection_count().await, 3);

        // drain the connect announcements
        while first.try_recv().is_ok() {}
        while second.try_recv().is_ok() {}
        while bob.try_recv().is_ok() {}

        let event = HubEvent::ReceiveMessage(json!("hello"));
        assert_eq!(hub.send_to_user("alice", &event).await, 2);
        assert_eq!(parse(first.recv().await.unwrap())["payload"], "hello");
        assert_eq!(parse(second.recv().await.unwrap())["payload"], "hello");
        assert!(bob.try_recv().is_err());

        assert_eq!(hub.send_to_user("nobody", &event).await, 0);
        assert_eq!(hub.broadcast(&HubEvent::Ping).await, 3);
    }

    #[tokio::test]
    async fn test_unregister_last_connection_goes_offline() {
        let hub = ChatHub::new(8);
        let (a1, _rx1) = hub.register("alice").await;
        let (a2, _rx2) = hub.register("alice").await;
        let (_, mut bob) = hub.register("bob").await;
        while bob.try_recv().is_ok() {}

        assert!(!hub.unregister("alice", a1).await);
        assert!(hub.is_online("alice").await);
        assert!(bob.try_recv().is_err());

        assert!(hub.unregister("alice", a2).await);
        assert!(!hub.is_online("alice").await);
        assert_eq!(
            parse(bob.recv().await.unwrap()),
            json!({"type": "DisconnectUser", "payload": "alice"})
        );

        // unknown ids are ignored
        assert!(!hub.unregister("alice", a2).await);
    }

    #[tokio::test]
    async fn test_disconnect_user_closes_all_connections() {
        let hub = ChatHub::new(8);
        let (a1, mut rx1) = hub.register("alice").await;
        let (_, mut rx2) = hub.register("alice").await;
        let (_, mut bob) = hub.register("bob").await;
        while bob.try_recv().is_ok() {}

        assert_eq!(hub.disconnect_user("alice").await, 2);
        assert!(!hub.is_online("alice").await);
        assert_eq!(hub.connection_count().await, 1);
        assert_eq!(
            parse(bob.recv().await.unwrap()),
            json!({"type": "DisconnectUser", "payload": "alice"})
        );

        // socket tasks see their channel end once buffered frames are drained
        while rx1.try_recv().is_ok() {}
        while rx2.try_recv().is_ok() {}
        assert!(rx1.recv().await.is_none());
        assert!(rx2.recv().await.is_none());

        // the socket task's own unregister afterwards is a no-op
        assert!(!hub.unregister("alice", a1).await);
        assert_eq!(hub.disconnect_user("alice").await, 0);
        assert!(bob.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_channel_drops_frames() {
        let hub = ChatHub::new(1);
        // the ConnectUser announcement fills the only slot
        let (_, mut rx) = hub.register("alice").await;

        assert_eq!(hub.send_to_user("alice", &HubEvent::Ping).await, 0);
        assert_eq!(parse(rx.recv().await.unwrap())["type"], "ConnectUser");
        assert_eq!(hub.send_to_user("alice", &HubEvent::Ping).await, 1);
    }

    #[tokio::test]
    async fn test_closed_receiver_is_skipped() {
        let hub = ChatHub::new(4);
        let (_, rx) = hub.register("alice").await;
        drop(rx);
        assert_eq!(hub.send_to_user("alice", &HubEvent::Ping).await, 0);
    }
}
