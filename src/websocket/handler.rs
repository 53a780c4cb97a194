use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedSender};
use uuid::Uuid;

use crate::error::GameError;
use crate::game::{guess, lobby, round};
use crate::room::Player;
use crate::websocket::message::{ClientMessage, ServerMessage};
use crate::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection from accept to teardown.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let conn_id = Uuid::new_v4();
    state.clients.add(conn_id, tx.clone()).await;
    tracing::info!("client {} connected", conn_id);

    // New connections land in the lobby; show everyone what is open.
    lobby::refresh(&state).await;

    // Spawn a task to forward messages from the channel to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                handle_text_message(&state, conn_id, &tx, &text).await;
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Ok(_) => {
                // Ignore binary, ping and pong frames
            }
            Err(e) => {
                tracing::warn!("websocket error for {}: {}", conn_id, e);
                break;
            }
        }
    }

    handle_disconnect(&state, conn_id).await;
    send_task.abort();
    tracing::info!("client {} disconnected", conn_id);
}

/// Decode one frame and dispatch it. Unparseable frames are logged and
/// dropped; join/create rejections go back to the sender only.
async fn handle_text_message(
    state: &AppState,
    conn_id: Uuid,
    tx: &UnboundedSender<Message>,
    text: &str,
) {
    let msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!("unparseable message from {}: {}", conn_id, e);
            return;
        }
    };

    match msg {
        ClientMessage::CreateRoom {
            room,
            nickname,
            password,
        } => {
            if let Err(e) = join_room(state, conn_id, tx, &room, &nickname, password, true).await {
                send_error(tx, &e);
            }
        }
        ClientMessage::JoinRoom {
            room,
            nickname,
            password,
        } => {
            if let Err(e) = join_room(state, conn_id, tx, &room, &nickname, password, false).await {
                send_error(tx, &e);
            }
        }
        ClientMessage::Draw { stroke } => handle_draw(state, conn_id, stroke).await,
        ClientMessage::ClearCanvas => handle_clear_canvas(state, conn_id).await,
        ClientMessage::Chat { message } => guess::handle_chat(state, conn_id, message).await,
    }
}

fn send_error(tx: &UnboundedSender<Message>, err: &GameError) {
    if let Ok(text) = serde_json::to_string(&ServerMessage::Error {
        message: err.to_string(),
    }) {
        let _ = tx.send(Message::Text(text));
    }
}

/// Bind a connection to a room, creating the room when asked to (`create`)
/// or lazily on join. On success the newcomer gets the confirmation, the
/// current drawing history and, mid-round, their role and the clock; the
/// room gets the join notice and a fresh leaderboard.
async fn join_room(
    state: &AppState,
    conn_id: Uuid,
    tx: &UnboundedSender<Message>,
    room_name: &str,
    nickname: &str,
    password: Option<String>,
    create: bool,
) -> Result<(), GameError> {
    if room_name.trim().is_empty() || nickname.trim().is_empty() {
        return Err(GameError::EmptyField);
    }
    // a connection binds once; switching rooms means reconnecting
    if state.clients.binding(&conn_id).await.is_some() {
        return Err(GameError::AlreadyJoined);
    }

    let room = if create {
        state.rooms.create(room_name, password.clone()).await?
    } else {
        state.rooms.get_or_create(room_name).await
    };

    let start_first_round = {
        let mut room = room.write().await;

        if !room.password_matches(password.as_deref()) {
            return Err(GameError::WrongPassword(room_name.to_string()));
        }
        if !room.add_player(conn_id, Player::new(nickname.to_string(), tx.clone())) {
            return Err(GameError::RoomFull(room_name.to_string()));
        }

        room.send_to(
            &conn_id,
            &ServerMessage::Joined {
                room: room_name.to_string(),
            },
        );
        // the current round's strokes, replayed to the newcomer only
        room.send_to(
            &conn_id,
            &ServerMessage::DrawingHistory {
                strokes: room.history().to_vec(),
            },
        );

        room.broadcast(&ServerMessage::System {
            message: format!("{} joined the game.", nickname),
        });
        if room.player_count() == 1 {
            room.broadcast(&ServerMessage::System {
                message: "At least 2 players are needed to start.".to_string(),
            });
        }

        if let Some(drawer) = room.drawer() {
            // a round is running; bring the late joiner up to speed
            room.send_to(
                &conn_id,
                &ServerMessage::DrawState {
                    is_drawer: false,
                    word: None,
                },
            );
            room.send_to(
                &conn_id,
                &ServerMessage::GameState {
                    drawer: room.nickname(&drawer).unwrap_or_default().to_string(),
                    word_length: room.word_len(),
                },
            );
            room.send_to(
                &conn_id,
                &ServerMessage::TimerUpdate {
                    seconds: room.timer(),
                },
            );
        }

        room.broadcast(&ServerMessage::LeaderboardUpdate {
            leaderboard: room.leaderboard(),
        });

        room.player_count() >= 2 && room.drawer().is_none()
    };

    state
        .clients
        .bind(&conn_id, room_name.to_string(), nickname.to_string())
        .await;
    tracing::info!("{} joined room '{}'", nickname, room_name);

    if start_first_round {
        // start_round refreshes the lobby itself
        round::start_round(state, room_name).await;
    } else {
        lobby::refresh(state).await;
    }
    Ok(())
}

/// Relay a stroke from the drawer to the rest of the room.
/// Strokes from anyone else, or from unbound connections, are dropped.
async fn handle_draw(state: &AppState, conn_id: Uuid, stroke: Value) {
    let Some(binding) = state.clients.binding(&conn_id).await else {
        return;
    };
    let Some(room) = state.rooms.get(&binding.room).await else {
        return;
    };

    let mut room = room.write().await;
    if room.drawer() != Some(conn_id) {
        return;
    }
    room.push_stroke(stroke.clone());
    room.broadcast_except(&conn_id, &ServerMessage::Draw { stroke });
}

/// Wipe the canvas; only the drawer may do this. Unlike draw relays, the
/// clear is echoed back to the drawer too.
async fn handle_clear_canvas(state: &AppState, conn_id: Uuid) {
    let Some(binding) = state.clients.binding(&conn_id).await else {
        return;
    };
    let Some(room) = state.rooms.get(&binding.room).await else {
        return;
    };

    let mut room = room.write().await;
    if room.drawer() != Some(conn_id) {
        return;
    }
    room.clear_history();
    room.broadcast(&ServerMessage::ClearCanvas);
}

/// Tear down a departing connection: drop its directory entry and room
/// membership, destroying the room once it empties. The round rotates when
/// the drawer left or the room dropped below two players.
async fn handle_disconnect(state: &AppState, conn_id: Uuid) {
    let Some(client) = state.clients.remove(&conn_id).await else {
        return;
    };
    let Some(binding) = client.binding().cloned() else {
        return;
    };
    let Some(room) = state.rooms.get(&binding.room).await else {
        return;
    };

    let (was_drawer, remaining) = {
        let mut room = room.write().await;
        if room.remove_player(&conn_id).is_none() {
            return;
        }
        let was_drawer = room.drawer() == Some(conn_id);
        room.broadcast(&ServerMessage::System {
            message: format!("{} left the game.", binding.nickname),
        });
        let remaining = room.player_count();
        if remaining == 0 {
            // cancel before the registry entry goes away so no stale tick
            // can resurrect the room
            room.cancel_timer();
        }
        (was_drawer, remaining)
    };

    if remaining == 0 {
        state.rooms.remove(&binding.room).await;
        tracing::info!("room '{}' destroyed", binding.room);
        lobby::refresh(state).await;
    } else if was_drawer || remaining < 2 {
        // start_round refreshes the lobby itself
        round::start_round(state, &binding.room).await;
    } else {
        let room = room.read().await;
        room.broadcast(&ServerMessage::LeaderboardUpdate {
            leaderboard: room.leaderboard(),
        });
        drop(room);
        lobby::refresh(state).await;
    }
}
