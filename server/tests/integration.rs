//! Integration tests for the wheel server.
//!
//! These tests start a real server instance and connect via WebSocket
//! to verify end-to-end behavior.

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use wheel_server::config::ServerConfig;
use wheel_shared::config::SpinConfig;

// Re-create minimal protocol types for testing
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[allow(dead_code)]
enum ServerMsg {
    #[serde(rename = "welcome")]
    Welcome {
        #[serde(rename = "protocolVersion")]
        protocol_version: u32,
        #[serde(rename = "selfId")]
        self_id: u32,
        wheel: serde_json::Value,
        sets: serde_json::Value,
        config: serde_json::Value,
    },
    #[serde(rename = "wheel_state")]
    WheelState { angle: f64, spinning: bool },
    #[serde(rename = "sets_state")]
    SetsState {
        names: Vec<String>,
        eligible: Vec<String>,
        #[serde(rename = "canSpin")]
        can_spin: bool,
    },
    #[serde(rename = "winner")]
    Winner {
        name: String,
        index: u32,
        cancelled: bool,
    },
    #[serde(rename = "rejected")]
    Rejected { reason: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ClientMsg {
    #[serde(rename = "toggle_spin")]
    ToggleSpin,
    #[serde(rename = "add_name")]
    AddName { name: String },
    #[serde(rename = "load_samples")]
    LoadSamples,
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Decays hard and spins one or two turns so a spin settles in well under a second.
fn fast_spin_config() -> SpinConfig {
    SpinConfig {
        decay_factor: 0.8,
        min_extra_turns: 1,
        max_extra_turns: 2,
        ..Default::default()
    }
}

/// Start a test server on a random available port and return the WebSocket URL.
async fn start_test_server() -> String {
    start_test_server_with(ServerConfig::default()).await
}

async fn start_test_server_with(base: ServerConfig) -> String {
    use wheel_server::game_loop::{run_game_loop, GameBroadcast, GameCommand};
    use wheel_server::ws::AppState;

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener); // Release the port so the server can bind to it

    let config = ServerConfig {
        listen_addr: addr.to_string(),
        rng_seed: Some(12345),
        ..base
    };

    let (game_tx, game_rx) = mpsc::channel::<GameCommand>(256);
    let (broadcast_tx, _) = broadcast::channel::<GameBroadcast>(256);

    let app_state = AppState {
        game_tx,
        broadcast_tx: broadcast_tx.clone(),
        max_commands_per_sec: config.max_commands_per_sec,
        connection_semaphore: Arc::new(Semaphore::new(config.max_connections)),
    };

    // Start game loop
    let game_config = config.clone();
    tokio::spawn(async move {
        run_game_loop(game_rx, broadcast_tx, game_config, fast_spin_config()).await;
    });

    // Start HTTP/WebSocket server
    let app = axum::Router::new()
        .route("/ws", axum::routing::get(wheel_server::ws::ws_handler))
        .with_state(app_state);

    tokio::spawn(async move {
        let listener = TcpListener::bind(&config.listen_addr).await.unwrap();
        axum::serve(listener, app).await.unwrap();
    });

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("ws://{}/ws", addr)
}

async fn connect(url: &str) -> WsStream {
    let (ws, _) = connect_async(url).await.expect("Failed to connect");
    ws
}

/// Read the next text message and parse as ServerMsg.
async fn recv_msg(ws: &mut WsStream) -> ServerMsg {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(&text).expect("Failed to parse server message");
            }
            Some(Ok(_)) => continue, // Skip ping/pong
            Some(Err(e)) => panic!("WebSocket error: {}", e),
            None => panic!("WebSocket closed unexpectedly"),
        }
    }
}

/// Read the next text message with a timeout.
async fn recv_msg_timeout(ws: &mut WsStream, timeout: Duration) -> Option<ServerMsg> {
    tokio::time::timeout(timeout, recv_msg(ws)).await.ok()
}

async fn send(ws: &mut WsStream, msg: ClientMsg) {
    let json = serde_json::to_string(&msg).unwrap();
    ws.send(Message::Text(json.into())).await.unwrap();
}

/// Skip messages until `pick` matches one, or give up after `timeout`.
async fn wait_for<T>(
    ws: &mut WsStream,
    timeout: Duration,
    mut pick: impl FnMut(ServerMsg) -> Option<T>,
) -> Option<T> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        let msg = recv_msg_timeout(ws, remaining).await?;
        if let Some(found) = pick(msg) {
            return Some(found);
        }
    }
}

/// Connect, swallow the welcome and load the sample names.
async fn connect_with_samples(url: &str) -> WsStream {
    let mut ws = connect(url).await;
    let _welcome = recv_msg(&mut ws).await;
    send(&mut ws, ClientMsg::LoadSamples).await;
    let loaded = wait_for(&mut ws, Duration::from_secs(2), |msg| match msg {
        ServerMsg::SetsState { names, .. } => Some(names.len()),
        _ => None,
    })
    .await;
    assert_eq!(loaded, Some(8));
    ws
}

async fn assert_disconnected(ws: &mut WsStream, why: &str) {
    let mut disconnected = false;
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        match tokio::time::timeout(Duration::from_millis(100), ws.next()).await {
            Ok(Some(Ok(Message::Close(_)))) | Ok(None) | Ok(Some(Err(_))) => {
                disconnected = true;
                break;
            }
            Err(_) => {
                // Timeout - try sending to check if connection is dead
                if ws.send(Message::Ping(vec![].into())).await.is_err() {
                    disconnected = true;
                    break;
                }
            }
            _ => continue,
        }
    }
    assert!(disconnected, "{}", why);
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_connect_and_receive_welcome() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;

    match recv_msg(&mut ws).await {
        ServerMsg::Welcome {
            protocol_version,
            self_id,
            wheel,
            sets,
            config,
        } => {
            assert_eq!(protocol_version, 1);
            assert!(self_id > 0, "self_id should be positive");
            assert_eq!(wheel["spinning"], false);
            assert_eq!(sets["canSpin"], false);
            assert_eq!(config["decayFactor"], 0.8);
        }
        other => panic!("Expected Welcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_multiple_clients_get_unique_ids() {
    let url = start_test_server().await;

    let mut ws1 = connect(&url).await;
    let mut ws2 = connect(&url).await;

    let id1 = match recv_msg(&mut ws1).await {
        ServerMsg::Welcome { self_id, .. } => self_id,
        _ => panic!("Expected Welcome"),
    };
    let id2 = match recv_msg(&mut ws2).await {
        ServerMsg::Welcome { self_id, .. } => self_id,
        _ => panic!("Expected Welcome"),
    };

    assert_ne!(id1, id2, "Each client should get a unique ID");
}

#[tokio::test]
async fn test_added_name_reaches_every_viewer() {
    let url = start_test_server().await;
    let mut ws1 = connect(&url).await;
    let mut ws2 = connect(&url).await;
    let _ = recv_msg(&mut ws1).await;
    let _ = recv_msg(&mut ws2).await;

    send(
        &mut ws1,
        ClientMsg::AddName {
            name: "  Ada ".to_string(),
        },
    )
    .await;

    for ws in [&mut ws1, &mut ws2] {
        let state = wait_for(ws, Duration::from_secs(2), |msg| match msg {
            ServerMsg::SetsState {
                names, can_spin, ..
            } => Some((names, can_spin)),
            _ => None,
        })
        .await;
        assert_eq!(state, Some((vec!["Ada".to_string()], true)));
    }
}

#[tokio::test]
async fn test_spin_settles_and_removes_winner() {
    let url = start_test_server().await;
    let mut ws = connect_with_samples(&url).await;

    send(&mut ws, ClientMsg::ToggleSpin).await;

    let mut saw_spinning = false;
    let winner = wait_for(&mut ws, Duration::from_secs(5), |msg| match msg {
        ServerMsg::WheelState { spinning, .. } => {
            saw_spinning |= spinning;
            None
        }
        ServerMsg::Winner {
            name, cancelled, ..
        } => Some((name, cancelled)),
        _ => None,
    })
    .await;
    let (name, cancelled) = winner.expect("spin should settle with a winner");
    assert!(saw_spinning, "angle should stream while spinning");
    assert!(!cancelled);

    let names = wait_for(&mut ws, Duration::from_secs(1), |msg| match msg {
        ServerMsg::SetsState { names, .. } => Some(names),
        _ => None,
    })
    .await
    .expect("sets should follow the winner");
    assert_eq!(names.len(), 7);
    assert!(!names.contains(&name), "winner should leave the wheel");
}

#[tokio::test]
async fn test_second_toggle_cancels_spin() {
    let url = start_test_server().await;
    let mut ws = connect_with_samples(&url).await;

    send(&mut ws, ClientMsg::ToggleSpin).await;
    send(&mut ws, ClientMsg::ToggleSpin).await;

    let cancelled = wait_for(&mut ws, Duration::from_secs(5), |msg| match msg {
        ServerMsg::Winner { cancelled, .. } => Some(cancelled),
        _ => None,
    })
    .await;
    assert_eq!(cancelled, Some(true));
}

#[tokio::test]
async fn test_spin_on_empty_wheel_rejected_to_sender_only() {
    let url = start_test_server().await;
    let mut ws1 = connect(&url).await;
    let mut ws2 = connect(&url).await;
    let _ = recv_msg(&mut ws1).await;
    let _ = recv_msg(&mut ws2).await;

    send(&mut ws1, ClientMsg::ToggleSpin).await;

    match recv_msg_timeout(&mut ws1, Duration::from_secs(2)).await {
        Some(ServerMsg::Rejected { reason }) => {
            assert!(reason.contains("no eligible names"), "reason: {}", reason)
        }
        other => panic!("Expected Rejected, got {:?}", other),
    }
    assert!(
        recv_msg_timeout(&mut ws2, Duration::from_millis(300))
            .await
            .is_none(),
        "Other viewers should not see the rejection"
    );
}

#[tokio::test]
async fn test_list_edit_while_spinning_rejected() {
    let url = start_test_server().await;
    let mut ws = connect_with_samples(&url).await;

    send(&mut ws, ClientMsg::ToggleSpin).await;
    send(
        &mut ws,
        ClientMsg::AddName {
            name: "Zed".to_string(),
        },
    )
    .await;

    let reason = wait_for(&mut ws, Duration::from_secs(2), |msg| match msg {
        ServerMsg::Rejected { reason } => Some(reason),
        _ => None,
    })
    .await;
    assert_eq!(reason.as_deref(), Some("the wheel is spinning"));
}

#[tokio::test]
async fn test_connection_limit_refuses_extra_viewers() {
    let url = start_test_server_with(ServerConfig {
        max_connections: 1,
        ..Default::default()
    })
    .await;

    let mut ws1 = connect(&url).await;
    let _ = recv_msg(&mut ws1).await;

    assert!(
        connect_async(url.as_str()).await.is_err(),
        "Second viewer should be refused"
    );
}

#[tokio::test]
async fn test_oversized_message_disconnects_client() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;
    let _welcome = recv_msg(&mut ws).await;

    let msg = format!(
        r#"{{"type":"add_name","name":"{}"}}"#,
        "x".repeat(2000)
    );
    let _ = ws.send(Message::Text(msg.into())).await;

    assert_disconnected(&mut ws, "Client should be disconnected after oversized message").await;
}

#[tokio::test]
async fn test_parse_spam_disconnects_client() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;
    let _welcome = recv_msg(&mut ws).await;

    for _ in 0..10 {
        let _ = ws.send(Message::Text("not valid json".into())).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_disconnected(
        &mut ws,
        "Client should be disconnected after too many parse errors",
    )
    .await;
}

#[tokio::test]
async fn test_rate_limiting_disconnects_abusive_client() {
    let url = start_test_server_with(ServerConfig {
        max_commands_per_sec: 5,
        ..Default::default()
    })
    .await;
    let mut ws = connect(&url).await;
    let _welcome = recv_msg(&mut ws).await;

    for i in 0..10 {
        let msg = ClientMsg::AddName {
            name: format!("Name {}", i),
        };
        let json = serde_json::to_string(&msg).unwrap();
        if ws.send(Message::Text(json.into())).await.is_err() {
            return; // Already disconnected
        }
    }

    assert_disconnected(
        &mut ws,
        "Client should be disconnected after exceeding rate limit",
    )
    .await;
}
