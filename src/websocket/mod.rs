pub mod clients;
pub mod handler;
pub mod message;

pub use clients::{Binding, Client, Clients};
pub use message::{ClientMessage, LeaderboardEntry, RoomSummary, ServerMessage};
