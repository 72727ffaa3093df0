use std::sync::Arc;

use fruitfall_shared::protocol::{FruitCaughtMsg, GameInitMsg, GameStateMsg, Point};
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::config::ServerConfig;
use crate::state::GameState;

/// Commands from client connections to the game loop
#[derive(Debug)]
pub enum GameCommand {
    PlayerJoin {
        response: oneshot::Sender<(u32, GameInitMsg)>,
    },
    PlayerLeave {
        id: u32,
    },
    PlayerMove {
        id: u32,
        position: Point,
    },
    SetName {
        id: u32,
        name: String,
    },
}

/// Broadcasts from game loop to all clients
#[derive(Debug, Clone)]
pub enum GameBroadcast {
    GameState(Arc<GameStateMsg>),
    PlayerDisconnected(u32),
    FruitCaught(FruitCaughtMsg),
}

/// Run the main game loop. Owns all game state.
///
/// Ticks and commands are handled one at a time, so every mutation of the
/// state completes before the next one starts. Returns when `shutdown`
/// flips to true or every command sender is gone.
pub async fn run_game_loop(
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    broadcast_tx: broadcast::Sender<GameBroadcast>,
    server_config: ServerConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut state = GameState::new(&server_config);

    // Interval ticks are scheduled from the start instant, so a slow tick
    // does not push every later one back.
    let mut tick_interval = tokio::time::interval(server_config.tick_interval);
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!(
        "Game loop started: {} collectibles, tick every {:?}",
        state.pool.len(),
        server_config.tick_interval
    );

    loop {
        tokio::select! {
            biased;

            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    break;
                }
            }

            _ = tick_interval.tick() => {
                let missed = state.tick();
                if !missed.is_empty() {
                    tracing::trace!("Respawned missed collectibles {:?}", missed);
                }
                let _ = broadcast_tx.send(GameBroadcast::GameState(Arc::new(state.game_state())));
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(cmd) => handle_command(&mut state, cmd, &broadcast_tx),
                    None => break,
                }
            }
        }
    }

    tracing::info!("Game loop ended");
}

fn handle_command(
    state: &mut GameState,
    cmd: GameCommand,
    broadcast_tx: &broadcast::Sender<GameBroadcast>,
) {
    match cmd {
        GameCommand::PlayerJoin { response } => {
            let (player_id, init) = state.player_join();
            if response.send((player_id, init)).is_err() {
                // Connection vanished before it got its init.
                state.player_leave(player_id);
                return;
            }
            tracing::info!("Player {} joined ({} online)", player_id, state.registry.len());
        }
        GameCommand::PlayerLeave { id } => {
            if state.player_leave(id) {
                let _ = broadcast_tx.send(GameBroadcast::PlayerDisconnected(id));
                tracing::info!("Player {} left ({} online)", id, state.registry.len());
            }
        }
        GameCommand::PlayerMove { id, position } => {
            if let Some(event) = state.player_move(id, position) {
                tracing::debug!(
                    "Player {} caught collectible {} (score {})",
                    event.player_id,
                    event.collectible_id,
                    event.new_score
                );
                let _ = broadcast_tx.send(GameBroadcast::FruitCaught(event.to_msg()));
            }
        }
        GameCommand::SetName { id, name } => {
            if state.set_name(id, &name) {
                if let Some(player) = state.registry.get(id) {
                    tracing::info!("Player {} is now {:?}", id, player.name);
                }
            }
        }
    }
}
