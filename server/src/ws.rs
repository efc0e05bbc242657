use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot, OwnedSemaphorePermit, Semaphore};
use wheel_shared::protocol::{ClientMsg, RejectedMsg, ServerMsg};

use crate::game_loop::{GameBroadcast, GameCommand};

/// Client messages are tiny; anything larger is abuse.
pub const MAX_MESSAGE_SIZE: usize = 1024;
/// Unparseable messages tolerated before the viewer is dropped
pub const MAX_PARSE_ERRORS: u32 = 5;

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub game_tx: mpsc::Sender<GameCommand>,
    pub broadcast_tx: broadcast::Sender<GameBroadcast>,
    pub max_commands_per_sec: u32,
    pub connection_semaphore: Arc<Semaphore>,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    let permit = match app_state.connection_semaphore.clone().try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => {
            tracing::warn!("Connection refused: viewer limit reached");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };

    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, app_state, permit))
        .into_response()
}

/// Sliding one-second window over incoming commands.
struct RateLimiter {
    max_per_sec: u32,
    window_start: Instant,
    count: u32,
}

impl RateLimiter {
    fn new(max_per_sec: u32) -> Self {
        Self {
            max_per_sec,
            window_start: Instant::now(),
            count: 0,
        }
    }

    /// Record one command. Returns false once the viewer is over the limit.
    fn allow(&mut self, now: Instant) -> bool {
        if now.duration_since(self.window_start) >= Duration::from_secs(1) {
            self.window_start = now;
            self.count = 0;
        }
        self.count += 1;
        self.count <= self.max_per_sec
    }
}

fn to_command(viewer_id: u32, msg: ClientMsg) -> GameCommand {
    match msg {
        ClientMsg::ToggleSpin => GameCommand::ToggleSpin { viewer_id },
        ClientMsg::AddName { name } => GameCommand::AddName { viewer_id, name },
        ClientMsg::RemoveName { name } => GameCommand::RemoveName { viewer_id, name },
        ClientMsg::ClearSet => GameCommand::ClearSet { viewer_id },
        ClientMsg::LoadSamples => GameCommand::LoadSamples { viewer_id },
        ClientMsg::SelectSet { set_id } => GameCommand::SelectSet { viewer_id, set_id },
    }
}

/// Wire form of a broadcast for one viewer; empty when it is addressed to someone else.
fn to_server_msgs(viewer_id: u32, broadcast: &GameBroadcast) -> Vec<ServerMsg> {
    match broadcast {
        GameBroadcast::WheelState(msg) => vec![ServerMsg::WheelState(msg.clone())],
        GameBroadcast::SetsState(msg) => vec![ServerMsg::SetsState(msg.clone())],
        GameBroadcast::Winner(msg) => vec![ServerMsg::Winner(msg.clone())],
        GameBroadcast::Rejected {
            viewer_id: target,
            reason,
        } if *target == viewer_id => vec![ServerMsg::Rejected(RejectedMsg {
            reason: reason.clone(),
        })],
        GameBroadcast::Snapshot {
            viewer_id: target,
            wheel,
            sets,
        } if *target == viewer_id => vec![
            ServerMsg::WheelState(wheel.clone()),
            ServerMsg::SetsState(sets.clone()),
        ],
        GameBroadcast::Rejected { .. } | GameBroadcast::Snapshot { .. } => Vec::new(),
    }
}

async fn handle_socket(socket: WebSocket, app_state: AppState, _permit: OwnedSemaphorePermit) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe before joining so nothing between welcome and the first broadcast is missed
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();

    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .game_tx
        .send(GameCommand::ViewerJoin { response: resp_tx })
        .await
        .is_err()
    {
        tracing::error!("Failed to send ViewerJoin command");
        return;
    }

    let (my_id, welcome) = match resp_rx.await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Failed to receive welcome");
            return;
        }
    };

    tracing::info!("Viewer {} connected", my_id);

    let welcome_json = match serde_json::to_string(&ServerMsg::Welcome(welcome)) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to encode welcome: {}", e);
            return;
        }
    };
    if sink.send(Message::Text(welcome_json.into())).await.is_err() {
        return;
    }

    let mut parse_errors: u32 = 0;
    let mut rate_limiter = RateLimiter::new(app_state.max_commands_per_sec);

    loop {
        tokio::select! {
            // Client -> Server
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if !rate_limiter.allow(Instant::now()) {
                            tracing::warn!("Viewer {} exceeded command rate, disconnecting", my_id);
                            break;
                        }
                        match serde_json::from_str::<ClientMsg>(&text) {
                            Ok(client_msg) => {
                                if app_state.game_tx.send(to_command(my_id, client_msg)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                parse_errors += 1;
                                tracing::debug!("Viewer {} sent bad message: {}", my_id, e);
                                if parse_errors >= MAX_PARSE_ERRORS {
                                    tracing::warn!("Viewer {} sent too many bad messages, disconnecting", my_id);
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        // Includes frames over MAX_MESSAGE_SIZE
                        tracing::warn!("Viewer {} socket error: {}", my_id, e);
                        break;
                    }
                    _ => {} // Ignore ping/pong/binary
                }
            }

            // Server -> Client (broadcast)
            result = broadcast_rx.recv() => {
                match result {
                    Ok(broadcast) => {
                        let mut closed = false;
                        for server_msg in to_server_msgs(my_id, &broadcast) {
                            if let Ok(json) = serde_json::to_string(&server_msg) {
                                if sink.send(Message::Text(json.into())).await.is_err() {
                                    closed = true;
                                    break;
                                }
                            }
                        }
                        if closed {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Dropped winner events are not replayed; the snapshot shows the
                        // winner gone from the sets and the wheel at rest.
                        tracing::warn!("Viewer {} lagged by {} messages, resyncing", my_id, n);
                        if app_state.game_tx.send(GameCommand::Resync { viewer_id: my_id }).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    let _ = app_state
        .game_tx
        .send(GameCommand::ViewerLeave { id: my_id })
        .await;
    tracing::info!("Viewer {} disconnected", my_id);
}
