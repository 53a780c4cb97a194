use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message types sent from client to server. Stroke payloads are opaque
/// blobs: stored, replayed and relayed, never inspected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        room: String,
        nickname: String,
        #[serde(default)]
        password: Option<String>,
    },
    JoinRoom {
        room: String,
        nickname: String,
        #[serde(default)]
        password: Option<String>,
    },
    Draw {
        stroke: Value,
    },
    ClearCanvas,
    Chat {
        message: String,
    },
}

/// Message types sent from server to client.
///
/// `draw_state` carries the word only for the drawer; for everyone else the
/// field is absent from the wire entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Joined {
        room: String,
    },
    Error {
        message: String,
    },
    DrawingHistory {
        strokes: Vec<Value>,
    },
    DrawState {
        is_drawer: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        word: Option<String>,
    },
    GameState {
        drawer: String,
        word_length: usize,
    },
    ClearCanvas,
    Draw {
        stroke: Value,
    },
    Chat {
        nickname: String,
        message: String,
    },
    System {
        message: String,
    },
    TimerUpdate {
        seconds: u32,
    },
    LeaderboardUpdate {
        leaderboard: Vec<LeaderboardEntry>,
    },
    LobbyUpdate {
        rooms: HashMap<String, RoomSummary>,
    },
}

/// One row of a room's score ranking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub nickname: String,
    pub score: u32,
}

/// One room's entry in the global lobby view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomSummary {
    pub player_count: usize,
    pub max_players: usize,
    pub locked: bool,
}
