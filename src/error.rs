use thiserror::Error;

/// Rejections for room create/join requests. Rendered through `Display` into
/// the `error` message sent back to the requesting connection; none of these
/// mutate any state.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GameError {
    #[error("Room name and nickname must not be empty")]
    EmptyField,

    #[error("Room '{0}' already exists")]
    RoomExists(String),

    #[error("Wrong password for room '{0}'")]
    WrongPassword(String),

    #[error("Room '{0}' is full (max {max} players)", max = crate::room::MAX_PLAYERS)]
    RoomFull(String),

    #[error("Already joined a room")]
    AlreadyJoined,
}
