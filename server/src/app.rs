use std::future::Future;
use std::path::Path;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, watch};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::config::ServerConfig;
use crate::game_loop::{run_game_loop, GameBroadcast, GameCommand};
use crate::ws::{ws_handler, AppState};

/// How long `serve` waits for open sockets to send their close frames.
const SOCKET_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// `/ws` for the game socket; everything else comes from `static_dir`.
pub fn router(app_state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Run the game loop and the HTTP server on `listener` until `shutdown`
/// resolves. On shutdown the loop stops ticking, every socket gets a close
/// frame, and the listener stops accepting. Returns once the sockets are
/// closed and the game loop has stopped.
pub async fn serve<F>(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (game_tx, game_rx) = mpsc::channel::<GameCommand>(256);
    let (broadcast_tx, _) = broadcast::channel::<GameBroadcast>(config.broadcast_capacity);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    // Every socket task holds a clone; `recv` yields `None` once all are gone.
    let (socket_guard, mut sockets_done) = mpsc::channel::<()>(1);

    let app_state = AppState {
        game_tx,
        broadcast_tx: broadcast_tx.clone(),
        shutdown_rx: shutdown_rx.clone(),
        max_message_size: config.max_message_size,
        socket_guard,
    };
    let app = router(app_state, &config.static_dir);

    let game_handle = tokio::spawn(run_game_loop(game_rx, broadcast_tx, config, shutdown_rx));

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Shutdown requested");
            let _ = shutdown_tx.send(true);
        })
        .await;

    if tokio::time::timeout(SOCKET_DRAIN_TIMEOUT, sockets_done.recv())
        .await
        .is_err()
    {
        tracing::warn!("Timed out waiting for sockets to close");
    }

    if let Err(e) = game_handle.await {
        tracing::error!("Game loop task failed: {}", e);
    }
    result
}
