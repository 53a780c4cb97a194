use tokio::time::{sleep, Duration};

use crate::game::{lobby, timer};
use crate::websocket::ServerMessage;
use crate::{words, AppState};

/// Pause between a fully guessed round and the next one, so players see the
/// reveal before the canvas clears.
pub const NEXT_ROUND_DELAY_SECS: u64 = 3;

/// Rotate a room into a new round, or park it when fewer than two players
/// remain. Safe to call for a room that no longer exists.
pub async fn start_round(state: &AppState, room_name: &str) {
    let Some(room) = state.rooms.get(room_name).await else {
        return;
    };

    {
        let mut room = room.write().await;

        if room.player_count() < 2 {
            room.clear_drawer();
            room.cancel_timer();
            room.broadcast(&ServerMessage::System {
                message: "At least 2 players are needed to play. Waiting for more...".to_string(),
            });
            room.broadcast(&ServerMessage::LeaderboardUpdate {
                leaderboard: room.leaderboard(),
            });
            drop(room);
            lobby::refresh(state).await;
            return;
        }

        room.begin_round(words::random_word().to_string());
        room.broadcast(&ServerMessage::ClearCanvas);

        // player_count >= 2, so a successor always exists
        let Some(drawer) = room.next_drawer() else {
            return;
        };
        room.set_drawer(drawer);

        for id in room.player_ids() {
            let is_drawer = id == drawer;
            room.send_to(
                &id,
                &ServerMessage::DrawState {
                    is_drawer,
                    word: is_drawer.then(|| room.word().to_string()),
                },
            );
        }

        let drawer_name = room.nickname(&drawer).unwrap_or_default().to_string();
        room.broadcast(&ServerMessage::GameState {
            drawer: drawer_name.clone(),
            word_length: room.word_len(),
        });
        room.broadcast(&ServerMessage::System {
            message: format!(
                "New round! {} is drawing. The word: {}",
                drawer_name,
                words::masked(room.word())
            ),
        });
        room.broadcast(&ServerMessage::LeaderboardUpdate {
            leaderboard: room.leaderboard(),
        });
    }

    timer::start(state, room_name).await;
    lobby::refresh(state).await;
}

/// Schedule the next round after the reveal delay.
///
/// `gen` is the room's timer generation captured when the current round was
/// closed out; the deferred task only acts if the room still exists and no
/// other rotation or stop moved the generation in the meantime.
pub fn schedule_next_round(state: &AppState, room_name: &str, gen: u64) {
    let state = state.clone();
    let room_name = room_name.to_string();
    tokio::spawn(async move {
        sleep(Duration::from_secs(NEXT_ROUND_DELAY_SECS)).await;
        let Some(room) = state.rooms.get(&room_name).await else {
            return;
        };
        if room.read().await.timer_gen() != gen {
            return;
        }
        Box::pin(start_round(&state, &room_name)).await;
    });
}
