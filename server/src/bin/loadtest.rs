//! Load test for the fruitfall server.
//!
//! Spawns multiple fake WebSocket clients that:
//! - Connect to the server and set a name
//! - Periodically report a random mouth position
//! - Receive and count gameState and fruitCaught broadcasts
//!
//! Usage: cargo run --bin loadtest -- [OPTIONS]
//!
//! Options:
//!   --clients N      Number of clients to spawn (default: 50)
//!   --duration S     Test duration in seconds (default: 30)
//!   --move-rate R    Position reports per second per client (default: 30)
//!   --url URL        Server URL (default: ws://127.0.0.1:3000/ws)

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fruitfall_shared::protocol::{ClientMsg, Point, ServerMsg};
use futures_util::{SinkExt, StreamExt};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio_tungstenite::{connect_async, tungstenite::Message};

// === Metrics ===

#[derive(Default)]
struct Metrics {
    connected: AtomicU64,
    messages_received: AtomicU64,
    game_states_received: AtomicU64,
    catches_received: AtomicU64,
    moves_sent: AtomicU64,
    errors: AtomicU64,
    latency_sum_ms: AtomicU64,
    latency_count: AtomicU64,
}

// === Client task ===

async fn run_client(
    client_id: u32,
    url: String,
    move_rate: f64,
    duration: Duration,
    metrics: Arc<Metrics>,
) {
    let connect_start = Instant::now();

    let (mut ws, _) = match connect_async(&url).await {
        Ok(conn) => conn,
        Err(e) => {
            if client_id < 5 {
                eprintln!("Client {} failed to connect: {}", client_id, e);
            }
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    metrics
        .latency_sum_ms
        .fetch_add(connect_start.elapsed().as_millis() as u64, Ordering::Relaxed);
    metrics.latency_count.fetch_add(1, Ordering::Relaxed);
    metrics.connected.fetch_add(1, Ordering::Relaxed);

    // Wait for gameInit before doing anything else
    let init = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    metrics.messages_received.fetch_add(1, Ordering::Relaxed);
                    if let Ok(ServerMsg::GameInit(init)) =
                        serde_json::from_str::<ServerMsg>(text.as_str())
                    {
                        return Some(init);
                    }
                }
                Ok(Message::Close(_)) | Err(_) => return None,
                _ => {}
            }
        }
        None
    })
    .await;

    let (my_id, playfield) = match init {
        Ok(Some(init)) => (init.player_id, init.playfield),
        _ => {
            if client_id < 5 {
                eprintln!("Client {} never got gameInit", client_id);
            }
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            metrics.connected.fetch_sub(1, Ordering::Relaxed);
            return;
        }
    };

    let rename = ClientMsg::UpdateName(format!("bot-{}", client_id));
    if let Ok(json) = serde_json::to_string(&rename) {
        let _ = ws.send(Message::Text(json.into())).await;
    }

    let move_interval = if move_rate > 0.0 {
        Duration::from_secs_f64(1.0 / move_rate)
    } else {
        Duration::from_secs(3600) // Effectively never
    };
    let mut move_timer = tokio::time::interval(move_interval);
    move_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut rng = ChaCha8Rng::seed_from_u64(client_id as u64);
    let test_end = Instant::now() + duration;

    while Instant::now() < test_end {
        tokio::select! {
            _ = move_timer.tick() => {
                let msg = ClientMsg::PlayerMove(Point::new(
                    rng.gen_range(0.0..playfield.width),
                    rng.gen_range(0.0..playfield.height),
                ));
                let Ok(json) = serde_json::to_string(&msg) else {
                    continue;
                };
                if ws.send(Message::Text(json.into())).await.is_ok() {
                    metrics.moves_sent.fetch_add(1, Ordering::Relaxed);
                } else {
                    metrics.errors.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }

            msg = ws.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        metrics.messages_received.fetch_add(1, Ordering::Relaxed);
                        match serde_json::from_str::<ServerMsg>(text.as_str()) {
                            Ok(ServerMsg::GameState(_)) => {
                                metrics.game_states_received.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(ServerMsg::FruitCaught(caught)) if caught.player_id == my_id => {
                                metrics.catches_received.fetch_add(1, Ordering::Relaxed);
                            }
                            _ => {}
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        if client_id < 3 {
                            eprintln!("Client {} error: {}", client_id, e);
                        }
                        metrics.errors.fetch_add(1, Ordering::Relaxed);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    let _ = ws.close(None).await;
    metrics.connected.fetch_sub(1, Ordering::Relaxed);
}

// === Main ===

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut num_clients: u32 = 50;
    let mut duration_secs: u64 = 30;
    let mut move_rate: f64 = 30.0;
    let mut url = "ws://127.0.0.1:3000/ws".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--clients" => {
                i += 1;
                num_clients = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(50);
            }
            "--duration" => {
                i += 1;
                duration_secs = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(30);
            }
            "--move-rate" => {
                i += 1;
                move_rate = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(30.0);
            }
            "--url" => {
                i += 1;
                url = args.get(i).cloned().unwrap_or(url);
            }
            _ => {}
        }
        i += 1;
    }

    println!("=== Fruitfall Server Load Test ===");
    println!("Clients: {}", num_clients);
    println!("Duration: {}s", duration_secs);
    println!("Move rate: {}/s per client", move_rate);
    println!("URL: {}", url);
    println!();

    let metrics = Arc::new(Metrics::default());
    let duration = Duration::from_secs(duration_secs);

    let mut handles = Vec::with_capacity(num_clients as usize);
    let spawn_start = Instant::now();

    for client_id in 0..num_clients {
        let url = url.clone();
        let metrics = Arc::clone(&metrics);
        handles.push(tokio::spawn(run_client(
            client_id, url, move_rate, duration, metrics,
        )));

        // Stagger spawns slightly to avoid thundering herd
        if client_id % 50 == 49 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    println!("All clients spawned in {:?}", spawn_start.elapsed());
    println!();

    let metrics_clone = Arc::clone(&metrics);
    let stats_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        let start = Instant::now();
        loop {
            interval.tick().await;
            let elapsed = start.elapsed().as_secs();
            println!(
                "[{:3}s] connected={}, msgs={}, game_states={}, catches={}, moves={}, errors={}",
                elapsed,
                metrics_clone.connected.load(Ordering::Relaxed),
                metrics_clone.messages_received.load(Ordering::Relaxed),
                metrics_clone.game_states_received.load(Ordering::Relaxed),
                metrics_clone.catches_received.load(Ordering::Relaxed),
                metrics_clone.moves_sent.load(Ordering::Relaxed),
                metrics_clone.errors.load(Ordering::Relaxed),
            );
        }
    });

    for handle in handles {
        let _ = handle.await;
    }
    stats_handle.abort();

    println!();
    println!("=== Final Results ===");
    let msgs = metrics.messages_received.load(Ordering::Relaxed);
    let game_states = metrics.game_states_received.load(Ordering::Relaxed);
    let latency_sum = metrics.latency_sum_ms.load(Ordering::Relaxed);
    let latency_count = metrics.latency_count.load(Ordering::Relaxed);

    println!("Total messages received: {}", msgs);
    println!("Total gameState messages: {}", game_states);
    println!(
        "Total catches: {}",
        metrics.catches_received.load(Ordering::Relaxed)
    );
    println!(
        "Total playerMove sent: {}",
        metrics.moves_sent.load(Ordering::Relaxed)
    );
    println!("Total errors: {}", metrics.errors.load(Ordering::Relaxed));
    if latency_count > 0 {
        println!("Average connect latency: {}ms", latency_sum / latency_count);
    }

    // One snapshot per 16 ms tick
    let expected_per_client = duration_secs as f64 * 1000.0 / 16.0;
    let per_client = game_states as f64 / num_clients.max(1) as f64;
    println!();
    println!("Game states per client: {:.1}", per_client);
    println!("Expected per client: {:.1}", expected_per_client);
    println!(
        "Delivery rate: {:.1}%",
        per_client / expected_per_client * 100.0
    );
}
