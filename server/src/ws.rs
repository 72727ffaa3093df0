use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use fruitfall_shared::protocol::{ClientMsg, ServerMsg};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::game_loop::{GameBroadcast, GameCommand};

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub game_tx: mpsc::Sender<GameCommand>,
    pub broadcast_tx: broadcast::Sender<GameBroadcast>,
    pub shutdown_rx: watch::Receiver<bool>,
    pub max_message_size: usize,
    /// Held by every socket task so shutdown can wait for them to finish.
    pub socket_guard: mpsc::Sender<()>,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    ws.max_message_size(app_state.max_message_size)
        .on_upgrade(|socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut shutdown_rx = app_state.shutdown_rx.clone();
    if *shutdown_rx.borrow() {
        return;
    }

    // Subscribe before joining so nothing broadcast after our init is missed.
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();

    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .game_tx
        .send(GameCommand::PlayerJoin { response: resp_tx })
        .await
        .is_err()
    {
        tracing::error!("Failed to send PlayerJoin command");
        return;
    }

    let (my_id, init) = match resp_rx.await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Failed to receive game init");
            return;
        }
    };

    tracing::info!("Player {} connected", my_id);

    let connected = match serde_json::to_string(&ServerMsg::GameInit(init)) {
        Ok(json) => sink.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to encode game init: {}", e);
            false
        }
    };

    if connected {
        loop {
            tokio::select! {
                // Client -> Server
                msg = stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let Some(cmd) = decode_command(my_id, text.as_str()) else {
                                continue;
                            };
                            if app_state.game_tx.send(cmd).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            tracing::debug!("Player {} socket error: {}", my_id, e);
                            break;
                        }
                        _ => {} // Ignore ping/pong/binary
                    }
                }

                // Server -> Client (broadcast)
                result = broadcast_rx.recv() => {
                    match result {
                        Ok(broadcast) => {
                            let json = match encode_broadcast(&broadcast) {
                                Ok(json) => json,
                                Err(e) => {
                                    tracing::error!("Failed to encode broadcast: {}", e);
                                    continue;
                                }
                            };
                            if sink.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!("Player {} lagged by {} messages", my_id, n);
                            // Snapshots are complete; the next one catches the client up.
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }

                res = shutdown_rx.changed() => {
                    if res.is_err() || *shutdown_rx.borrow() {
                        let _ = sink
                            .send(Message::Close(Some(CloseFrame {
                                code: close_code::AWAY,
                                reason: "server shutting down".into(),
                            })))
                            .await;
                        break;
                    }
                }
            }
        }
    }

    // Cleanup on disconnect
    let _ = app_state
        .game_tx
        .send(GameCommand::PlayerLeave { id: my_id })
        .await;
    tracing::info!("Player {} disconnected", my_id);
}

/// Turn a client frame into a game command. Malformed input yields `None`.
pub fn decode_command(player_id: u32, text: &str) -> Option<GameCommand> {
    let client_msg = match serde_json::from_str::<ClientMsg>(text) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!("Player {} sent an unreadable frame: {}", player_id, e);
            return None;
        }
    };

    match client_msg {
        ClientMsg::PlayerMove(position) => {
            if !position.is_finite() {
                return None;
            }
            Some(GameCommand::PlayerMove {
                id: player_id,
                position,
            })
        }
        ClientMsg::StartGame(start) => {
            tracing::info!("Player {} started the game", player_id);
            Some(GameCommand::SetName {
                id: player_id,
                name: start.player_name,
            })
        }
        ClientMsg::UpdateName(name) => Some(GameCommand::SetName {
            id: player_id,
            name,
        }),
    }
}

pub fn encode_broadcast(broadcast: &GameBroadcast) -> serde_json::Result<String> {
    match broadcast {
        GameBroadcast::GameState(msg) => {
            serde_json::to_string(&ServerMsg::GameState(msg.as_ref().clone()))
        }
        GameBroadcast::PlayerDisconnected(id) => {
            serde_json::to_string(&ServerMsg::PlayerDisconnected(*id))
        }
        GameBroadcast::FruitCaught(msg) => {
            serde_json::to_string(&ServerMsg::FruitCaught(msg.clone()))
        }
    }
}
