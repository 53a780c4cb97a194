pub mod error;
pub mod game;
pub mod room;
pub mod websocket;
pub mod words;

use room::RoomRegistry;
use websocket::Clients;

/// Application state shared across all connections
#[derive(Clone, Default)]
pub struct AppState {
    pub rooms: RoomRegistry,
    pub clients: Clients,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
