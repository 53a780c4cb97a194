use uuid::Uuid;

use crate::game::round;
use crate::room::{GuessOutcome, GUESSER_POINTS};
use crate::websocket::ServerMessage;
use crate::AppState;

/// Route one chat line from a connection: drawer narration, a guess against
/// the secret word, or plain conversation. Connections without a room
/// binding are ignored.
pub async fn handle_chat(state: &AppState, conn_id: Uuid, text: String) {
    let Some(binding) = state.clients.binding(&conn_id).await else {
        return;
    };
    let Some(room) = state.rooms.get(&binding.room).await else {
        return;
    };

    let mut room = room.write().await;
    match room.evaluate_guess(conn_id, &text) {
        // wrong guesses stay visible to everyone, drawer included
        GuessOutcome::Narration | GuessOutcome::Chat | GuessOutcome::Repeat => {
            room.broadcast(&ServerMessage::Chat {
                nickname: binding.nickname,
                message: text,
            });
        }
        GuessOutcome::Correct { round_over } => {
            room.broadcast(&ServerMessage::System {
                message: format!(
                    "🎉 {} guessed the word! It was '{}'.",
                    binding.nickname,
                    room.word()
                ),
            });
            room.send_to(
                &conn_id,
                &ServerMessage::System {
                    message: format!("Correct! +{} points.", GUESSER_POINTS),
                },
            );
            room.broadcast(&ServerMessage::LeaderboardUpdate {
                leaderboard: room.leaderboard(),
            });

            if round_over {
                room.cancel_timer();
                let gen = room.timer_gen();
                room.broadcast(&ServerMessage::System {
                    message: "Everyone guessed the word! Next round starting...".to_string(),
                });
                drop(room);
                round::schedule_next_round(state, &binding.room, gen);
            }
        }
    }
}
