//! Integration tests for the fruitfall server.
//!
//! These tests start a real server instance and connect via WebSocket
//! to verify end-to-end behavior.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use fruitfall_server::config::ServerConfig;
use fruitfall_shared::protocol::{GameInitMsg, GameStateMsg, ServerMsg};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{connect_async, tungstenite::Message};

type Ws = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<TcpStream>>;

struct TestServer {
    url: String,
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
    static_dir: StaticDir,
}

/// Per-server static directory, removed on drop.
struct StaticDir(PathBuf);

impl StaticDir {
    fn create(port: u16) -> Self {
        let path = std::env::temp_dir().join(format!("fruitfall-static-{}", port));
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("hello.txt"), "hello from fruitfall").unwrap();
        StaticDir(path)
    }
}

impl Drop for StaticDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// Start a test server on a random available port.
async fn start_test_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let static_dir = StaticDir::create(addr.port());
    let config = test_config(addr, &static_dir);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(fruitfall_server::app::serve(listener, config, async move {
        let _ = shutdown_rx.await;
    }));

    TestServer {
        url: format!("ws://{}/ws", addr),
        addr,
        shutdown: Some(shutdown_tx),
        handle,
        static_dir,
    }
}

fn test_config(addr: SocketAddr, static_dir: &StaticDir) -> ServerConfig {
    ServerConfig {
        listen_addr: addr.to_string(),
        static_dir: static_dir.0.clone(),
        rng_seed: Some(12345),
        ..Default::default()
    }
}

async fn connect(url: &str) -> Ws {
    let (ws, _) = connect_async(url).await.expect("Failed to connect");
    ws
}

/// Read the next text message and parse as ServerMsg.
async fn recv_msg(ws: &mut Ws) -> ServerMsg {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(text.as_str()).expect("Failed to parse server message");
            }
            Some(Ok(_)) => continue, // Skip ping/pong
            Some(Err(e)) => panic!("WebSocket error: {}", e),
            None => panic!("WebSocket closed unexpectedly"),
        }
    }
}

/// Read the next text message with a timeout.
async fn recv_msg_timeout(ws: &mut Ws, timeout: Duration) -> Option<ServerMsg> {
    tokio::time::timeout(timeout, recv_msg(ws)).await.ok()
}

async fn recv_init(ws: &mut Ws) -> GameInitMsg {
    match recv_msg(ws).await {
        ServerMsg::GameInit(init) => init,
        other => panic!("Expected GameInit, got {:?}", other),
    }
}

async fn recv_game_state(ws: &mut Ws) -> GameStateMsg {
    for _ in 0..100 {
        if let Some(ServerMsg::GameState(state)) =
            recv_msg_timeout(ws, Duration::from_millis(500)).await
        {
            return state;
        }
    }
    panic!("No gameState received");
}

async fn send_json(ws: &mut Ws, json: &str) {
    ws.send(Message::Text(json.to_string().into())).await.unwrap();
}

/// True once the server has closed the socket.
async fn wait_for_close(ws: &mut Ws) -> bool {
    for _ in 0..20 {
        match tokio::time::timeout(Duration::from_millis(100), ws.next()).await {
            Ok(Some(Ok(Message::Close(_)))) | Ok(None) | Ok(Some(Err(_))) => return true,
            Ok(Some(Ok(_))) => continue,
            Err(_) => {
                if ws.send(Message::Ping(vec![].into())).await.is_err() {
                    return true;
                }
            }
        }
    }
    false
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_connect_and_receive_game_init() {
    let server = start_test_server().await;
    let mut ws = connect(&server.url).await;

    let init = recv_init(&mut ws).await;
    assert_eq!(init.protocol_version, 1);
    assert!(init.player_id > 0);
    assert_eq!(init.collectibles.len(), 8);
    let me = init
        .players
        .iter()
        .find(|p| p.id == init.player_id)
        .expect("players should include self");
    assert_eq!(me.score, 0);
    assert!(me.name.starts_with("Player "));
}

#[tokio::test]
async fn test_multiple_clients_get_unique_ids() {
    let server = start_test_server().await;

    let mut ws1 = connect(&server.url).await;
    let mut ws2 = connect(&server.url).await;

    let id1 = recv_init(&mut ws1).await.player_id;
    let id2 = recv_init(&mut ws2).await.player_id;

    assert_ne!(id1, id2, "Each client should get a unique ID");
}

#[tokio::test]
async fn test_game_state_streams_every_tick() {
    let server = start_test_server().await;
    let mut ws = connect(&server.url).await;
    let init = recv_init(&mut ws).await;

    let first = recv_game_state(&mut ws).await;
    let second = recv_game_state(&mut ws).await;
    assert_eq!(first.collectibles.len(), 8);
    assert!(first.players.iter().any(|p| p.id == init.player_id));

    // Identity is stable between snapshots.
    let ids1: Vec<u32> = first.collectibles.iter().map(|c| c.id).collect();
    let ids2: Vec<u32> = second.collectibles.iter().map(|c| c.id).collect();
    assert_eq!(ids1, ids2);
}

#[tokio::test]
async fn test_update_name_is_truncated_in_snapshots() {
    let server = start_test_server().await;
    let mut ws = connect(&server.url).await;
    let my_id = recv_init(&mut ws).await.player_id;

    send_json(
        &mut ws,
        r#"{"type":"updateName","data":"verylongname-that-exceeds-twenty-characters"}"#,
    )
    .await;

    let mut found = false;
    for _ in 0..50 {
        let state = recv_game_state(&mut ws).await;
        let me = state.players.iter().find(|p| p.id == my_id).unwrap();
        if me.name == "verylongname-that-ex" {
            found = true;
            break;
        }
    }
    assert!(found, "Name should be truncated to 20 characters");
}

#[tokio::test]
async fn test_start_game_sets_name() {
    let server = start_test_server().await;
    let mut ws = connect(&server.url).await;
    let my_id = recv_init(&mut ws).await.player_id;

    send_json(
        &mut ws,
        r#"{"type":"startGame","data":{"playerId":12345,"playerName":"Mallory"}}"#,
    )
    .await;

    let mut found = false;
    for _ in 0..50 {
        let state = recv_game_state(&mut ws).await;
        if state
            .players
            .iter()
            .any(|p| p.id == my_id && p.name == "Mallory")
        {
            found = true;
            break;
        }
    }
    assert!(found, "startGame should rename the sending session");
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    let server = start_test_server().await;
    let mut ws = connect(&server.url).await;
    let my_id = recv_init(&mut ws).await.player_id;

    send_json(&mut ws, "not valid json").await;
    send_json(&mut ws, r#"{"type":"playerMove","data":{"x":"left","y":3}}"#).await;
    send_json(&mut ws, r#"{"type":"updateName","data":42}"#).await;
    send_json(&mut ws, r#"{"type":"fruitCaught","data":{"fruitId":"abc"}}"#).await;
    ws.send(Message::Binary(vec![1, 2, 3].into())).await.unwrap();

    // Still connected and still processing valid input.
    send_json(&mut ws, r#"{"type":"updateName","data":"still here"}"#).await;
    let mut found = false;
    for _ in 0..50 {
        let state = recv_game_state(&mut ws).await;
        if state
            .players
            .iter()
            .any(|p| p.id == my_id && p.name == "still here")
        {
            found = true;
            break;
        }
    }
    assert!(found);
}

#[tokio::test]
async fn test_player_disconnect_notifies_remaining_sessions_once() {
    let server = start_test_server().await;

    let mut ws1 = connect(&server.url).await;
    let mut ws2 = connect(&server.url).await;

    let id1 = recv_init(&mut ws1).await.player_id;
    let _id2 = recv_init(&mut ws2).await.player_id;

    ws1.close(None).await.unwrap();

    let mut notifications = 0;
    let mut removed_from_state = false;
    let deadline = tokio::time::Instant::now() + Duration::from_millis(800);
    while tokio::time::Instant::now() < deadline {
        match recv_msg_timeout(&mut ws2, Duration::from_millis(200)).await {
            Some(ServerMsg::PlayerDisconnected(id)) => {
                assert_eq!(id, id1);
                notifications += 1;
            }
            Some(ServerMsg::GameState(state)) if notifications > 0 => {
                assert!(state.players.iter().all(|p| p.id != id1));
                removed_from_state = true;
            }
            _ => {}
        }
    }
    assert_eq!(notifications, 1, "Exactly one playerDisconnected expected");
    assert!(removed_from_state);
}

#[tokio::test]
async fn test_catching_collectible_rewards_and_notifies_everyone() {
    let server = start_test_server().await;
    let mut ws_a = connect(&server.url).await;
    let mut ws_b = connect(&server.url).await;
    let id_a = recv_init(&mut ws_a).await.player_id;
    let _id_b = recv_init(&mut ws_b).await.player_id;

    let mut caught = None;
    for _attempt in 0..20 {
        let state = recv_game_state(&mut ws_a).await;
        let Some(target) = state.collectibles.iter().find(|c| c.y < 300.0) else {
            continue;
        };
        // Aim slightly ahead of the falling collectible.
        let json = format!(
            r#"{{"type":"playerMove","data":{{"x":{},"y":{}}}}}"#,
            target.x,
            target.y + target.speed * 2.0
        );
        send_json(&mut ws_a, &json).await;

        for _ in 0..20 {
            if let Some(ServerMsg::FruitCaught(msg)) =
                recv_msg_timeout(&mut ws_a, Duration::from_millis(200)).await
            {
                caught = Some(msg);
                break;
            }
        }
        if caught.is_some() {
            break;
        }
    }

    let msg = caught.expect("Player A should catch a collectible");
    assert_eq!(msg.player_id, id_a);
    assert_eq!(msg.new_score, 10);

    // B hears about it too.
    let mut b_saw_reward = false;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while tokio::time::Instant::now() < deadline {
        match recv_msg_timeout(&mut ws_b, Duration::from_millis(200)).await {
            Some(ServerMsg::FruitCaught(m)) if m.player_id == id_a => {
                b_saw_reward = true;
                break;
            }
            Some(_) => continue,
            None => break,
        }
    }
    assert!(b_saw_reward, "Reward should be broadcast to every session");
}

#[tokio::test]
async fn test_oversized_message_disconnects_client() {
    let server = start_test_server().await;
    let mut ws = connect(&server.url).await;
    let _init = recv_init(&mut ws).await;

    let huge_name = "x".repeat(2000);
    let msg = format!(r#"{{"type":"updateName","data":"{}"}}"#, huge_name);
    let _ = ws.send(Message::Text(msg.into())).await;

    assert!(
        wait_for_close(&mut ws).await,
        "Client should be disconnected after oversized message"
    );
}

#[tokio::test]
async fn test_static_files_are_served() {
    let server = start_test_server().await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"GET /hello.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "got: {}", response);
    assert!(response.ends_with("hello from fruitfall"));
}

#[tokio::test]
async fn test_shutdown_closes_sockets_and_stops_server() {
    let mut server = start_test_server().await;
    let mut ws = connect(&server.url).await;
    let _init = recv_init(&mut ws).await;

    server.shutdown.take().unwrap().send(()).unwrap();

    assert!(wait_for_close(&mut ws).await, "Socket should close on shutdown");
    drop(ws);

    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_static_dir_removed_with_server() {
    let server = start_test_server().await;
    let path = server.static_dir.0.clone();
    assert!(path.join("hello.txt").exists());
    drop(server);
    assert!(!path.exists());
}

/// Runs the server on its own runtime and drops that runtime as soon as
/// `serve` returns, the way the binary does on exit.
#[tokio::test]
async fn test_shutdown_sends_close_frame_before_serve_returns() {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    std_listener.set_nonblocking(true).unwrap();
    let addr = std_listener.local_addr().unwrap();
    let static_dir = StaticDir::create(addr.port());
    let config = test_config(addr, &static_dir);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server_thread = std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let result = runtime.block_on(async move {
            let listener = TcpListener::from_std(std_listener).unwrap();
            fruitfall_server::app::serve(listener, config, async move {
                let _ = shutdown_rx.await;
            })
            .await
        });
        drop(runtime);
        result
    });

    let mut sockets = Vec::new();
    for _ in 0..4 {
        let mut ws = connect(&format!("ws://{}/ws", addr)).await;
        let _init = recv_init(&mut ws).await;
        sockets.push(ws);
    }

    shutdown_tx.send(()).unwrap();

    for ws in sockets.iter_mut() {
        let frame = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match ws.next().await {
                    Some(Ok(Message::Close(frame))) => return frame,
                    Some(Ok(_)) => continue,
                    other => panic!("Expected close frame, got {:?}", other),
                }
            }
        })
        .await
        .expect("no close frame");
        assert_eq!(frame.map(|f| f.code), Some(CloseCode::Away));
    }

    let result = tokio::task::spawn_blocking(move || server_thread.join().unwrap())
        .await
        .unwrap();
    assert!(result.is_ok());
}
