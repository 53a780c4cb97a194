use crate::websocket::ServerMessage;
use crate::AppState;

/// Recompute the global room overview and push it to every connected client,
/// whether they joined a room yet or not.
pub async fn refresh(state: &AppState) {
    let rooms = state.rooms.summaries().await;
    state
        .clients
        .broadcast_all(&ServerMessage::LobbyUpdate { rooms })
        .await;
}
