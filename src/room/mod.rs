pub mod player;
pub mod registry;
pub mod room;

pub use player::Player;
pub use registry::{RoomRegistry, SharedRoom};
pub use room::{GuessOutcome, Room, DRAWER_POINTS, GUESSER_POINTS, MAX_PLAYERS};
