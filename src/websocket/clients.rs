use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::{mpsc::UnboundedSender, RwLock};
use uuid::Uuid;

use crate::websocket::ServerMessage;

/// Where a connection is bound after a successful create/join. A connection
/// carries at most one binding for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub room: String,
    pub nickname: String,
}

/// A live connection: outbound channel plus its room binding, if any.
#[derive(Debug, Clone)]
pub struct Client {
    sender: UnboundedSender<Message>,
    binding: Option<Binding>,
}

impl Client {
    pub fn new(sender: UnboundedSender<Message>) -> Self {
        Self {
            sender,
            binding: None,
        }
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    /// Send a protocol message to this connection.
    /// Returns true if successful, false if the channel is closed.
    pub fn send(&self, message: &ServerMessage) -> bool {
        match serde_json::to_string(message) {
            Ok(text) => self.sender.send(Message::Text(text)).is_ok(),
            Err(_) => false,
        }
    }
}

/// Directory of every live connection, bound to a room or not. Lobby updates
/// fan out through this map; room bindings are looked up here on every
/// inbound room-scoped message.
#[derive(Clone, Default)]
pub struct Clients {
    inner: Arc<RwLock<HashMap<Uuid, Client>>>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, id: Uuid, sender: UnboundedSender<Message>) {
        self.inner.write().await.insert(id, Client::new(sender));
    }

    pub async fn remove(&self, id: &Uuid) -> Option<Client> {
        self.inner.write().await.remove(id)
    }

    /// Record the room a connection joined. No effect on unknown ids.
    pub async fn bind(&self, id: &Uuid, room: String, nickname: String) {
        if let Some(client) = self.inner.write().await.get_mut(id) {
            client.binding = Some(Binding { room, nickname });
        }
    }

    pub async fn binding(&self, id: &Uuid) -> Option<Binding> {
        self.inner.read().await.get(id).and_then(|c| c.binding.clone())
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Push a message to every connected client, bound or not.
    pub async fn broadcast_all(&self, message: &ServerMessage) {
        let clients = self.inner.read().await;
        for client in clients.values() {
            let _ = client.send(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_add_and_remove_client() {
        let clients = Clients::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        clients.add(id, tx).await;
        assert_eq!(clients.count().await, 1);

        let removed = clients.remove(&id).await;
        assert!(removed.is_some());
        assert_eq!(clients.count().await, 0);
    }

    #[tokio::test]
    async fn test_binding_lifecycle() {
        let clients = Clients::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        clients.add(id, tx).await;
        assert!(clients.binding(&id).await.is_none());

        clients.bind(&id, "r1".to_string(), "alice".to_string()).await;
        let binding = clients.binding(&id).await.unwrap();
        assert_eq!(binding.room, "r1");
        assert_eq!(binding.nickname, "alice");

        let removed = clients.remove(&id).await.unwrap();
        assert_eq!(removed.binding(), Some(&binding));
    }

    #[tokio::test]
    async fn test_broadcast_all_reaches_unbound_clients() {
        let clients = Clients::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        let bound = Uuid::new_v4();
        clients.add(bound, tx1).await;
        clients.bind(&bound, "r1".to_string(), "alice".to_string()).await;
        clients.add(Uuid::new_v4(), tx2).await;

        clients.broadcast_all(&ServerMessage::ClearCanvas).await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }
}
