use axum::extract::ws::Message;
use tokio::sync::mpsc::UnboundedSender;

use crate::websocket::ServerMessage;

/// A player inside a room: nickname plus the outbound channel of their
/// connection.
#[derive(Debug, Clone)]
pub struct Player {
    nickname: String,
    sender: UnboundedSender<Message>,
}

impl Player {
    pub fn new(nickname: String, sender: UnboundedSender<Message>) -> Self {
        Self { nickname, sender }
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Send a protocol message to this player.
    /// Returns false if the connection's channel is closed.
    pub fn send(&self, message: &ServerMessage) -> bool {
        match serde_json::to_string(message) {
            Ok(text) => self.sender.send(Message::Text(text)).is_ok(),
            Err(_) => false,
        }
    }
}
