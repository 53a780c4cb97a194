use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::GameError;
use crate::room::Room;
use crate::websocket::RoomSummary;

/// Shared handle to a single room. All components read and mutate the same
/// instance through this handle.
pub type SharedRoom = Arc<RwLock<Room>>;

/// The process-wide room collection: name to room, created lazily and
/// destroyed when the last player leaves. Cheap to clone.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<String, SharedRoom>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicitly create a room, optionally password-locked.
    /// Fails when the name is already taken.
    pub async fn create(
        &self,
        name: &str,
        password: Option<String>,
    ) -> Result<SharedRoom, GameError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(name) {
            return Err(GameError::RoomExists(name.to_string()));
        }
        let room = Arc::new(RwLock::new(Room::new(password)));
        rooms.insert(name.to_string(), room.clone());
        Ok(room)
    }

    /// Fetch a room for joining, lazily creating an unlocked one.
    pub async fn get_or_create(&self, name: &str) -> SharedRoom {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Room::new(None))))
            .clone()
    }

    /// Look a room up without creating it. Timer ticks and deferred
    /// rotations use this to detect rooms destroyed in the meantime.
    pub async fn get(&self, name: &str) -> Option<SharedRoom> {
        self.rooms.read().await.get(name).cloned()
    }

    /// Destroy a room. The caller cancels its countdown first.
    pub async fn remove(&self, name: &str) -> Option<SharedRoom> {
        self.rooms.write().await.remove(name)
    }

    /// Lobby view over all populated rooms; empty rooms are omitted.
    pub async fn summaries(&self) -> HashMap<String, RoomSummary> {
        let rooms: Vec<(String, SharedRoom)> = self
            .rooms
            .read()
            .await
            .iter()
            .map(|(name, room)| (name.clone(), room.clone()))
            .collect();

        let mut summaries = HashMap::new();
        for (name, room) in rooms {
            let room = room.read().await;
            if room.player_count() > 0 {
                summaries.insert(
                    name,
                    RoomSummary {
                        player_count: room.player_count(),
                        max_players: crate::room::MAX_PLAYERS,
                        locked: room.locked(),
                    },
                );
            }
        }
        summaries
    }
}
