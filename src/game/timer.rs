use tokio::time::{interval, Duration};

use crate::game::round;
use crate::websocket::ServerMessage;
use crate::AppState;

/// Length of one drawing round in seconds.
pub const ROUND_DURATION_SECS: u32 = 60;

/// Arm the countdown for a room and spawn its once-per-second tick task.
///
/// Arming bumps the room's timer generation, which cancels any countdown
/// still running. The spawned task holds the generation it was armed with;
/// a tick that finds the room gone from the registry, or the generation
/// moved on, exits without touching anything.
// Returns a boxed `Send` future rather than being a plain `async fn` so its
// opaque return type does not form an unresolvable `Send`-inference cycle with
// `round::start_round`, which it spawns and which in turn awaits this function.
// Behavior is identical to an `async fn`; callers still `.await` it.
pub fn start<'a>(
    state: &'a AppState,
    room_name: &'a str,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
    Box::pin(async move {
        let Some(room) = state.rooms.get(room_name).await else {
            return;
        };
        let gen = room.write().await.arm_timer(ROUND_DURATION_SECS);

        let state = state.clone();
        let room_name = room_name.to_string();
        tokio::spawn(async move {
            let mut ticks = interval(Duration::from_secs(1));
            // consume the immediate first tick so the countdown starts after 1s
            ticks.tick().await;
            loop {
                ticks.tick().await;
                let Some(room) = state.rooms.get(&room_name).await else {
                    break;
                };
                let mut room = room.write().await;
                if room.timer_gen() != gen {
                    break;
                }

                let remaining = room.tick();
                room.broadcast(&ServerMessage::TimerUpdate { seconds: remaining });

                if remaining == 0 {
                    room.cancel_timer();
                    room.broadcast(&ServerMessage::System {
                        message: format!("Time is up! The word was '{}'.", room.word()),
                    });
                    drop(room);
                    Box::pin(round::start_round(&state, &room_name)).await;
                    break;
                }
            }
            tracing::debug!("countdown for room '{}' finished", room_name);
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::Player;
    use axum::extract::ws::Message;
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use uuid::Uuid;

    fn drain(rx: &mut UnboundedReceiver<Message>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(Message::Text(text)) = rx.try_recv() {
            messages.push(serde_json::from_str(&text).unwrap());
        }
        messages
    }

    /// Let spawned tasks run to their next await point on the
    /// current-thread test runtime.
    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    async fn room_with_player(state: &AppState, name: &str) -> UnboundedReceiver<Message> {
        let room = state.rooms.get_or_create(name).await;
        let (tx, rx) = mpsc::unbounded_channel();
        room.write()
            .await
            .add_player(Uuid::new_v4(), Player::new("alice".to_string(), tx));
        rx
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_broadcasts_each_second() {
        let state = AppState::new();
        let mut rx = room_with_player(&state, "r1").await;

        start(&state, "r1").await;
        settle().await;

        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;

        let seconds: Vec<u32> = drain(&mut rx)
            .into_iter()
            .filter_map(|msg| match msg {
                ServerMessage::TimerUpdate { seconds } => Some(seconds),
                _ => None,
            })
            .collect();
        assert_eq!(seconds, vec![59, 58]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_countdown_stops_ticking() {
        let state = AppState::new();
        let mut rx = room_with_player(&state, "r1").await;

        start(&state, "r1").await;
        settle().await;

        state.rooms.get("r1").await.unwrap().write().await.cancel_timer();

        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;

        assert!(drain(&mut rx)
            .iter()
            .all(|msg| !matches!(msg, ServerMessage::TimerUpdate { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_tick_after_room_destroyed_is_noop() {
        let state = AppState::new();
        let mut rx = room_with_player(&state, "r1").await;

        start(&state, "r1").await;
        settle().await;

        // destroy the room out from under the countdown
        state.rooms.get("r1").await.unwrap().write().await.cancel_timer();
        state.rooms.remove("r1").await;

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;

        assert!(drain(&mut rx).is_empty());
        assert!(state.rooms.get("r1").await.is_none());
    }
}
