use crate::config::ServerConfig;
use crate::controller::{SpinOutcome, Toggle};
use crate::error::SpinError;
use crate::state::WheelState;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;
use wheel_shared::config::SpinConfig;
use wheel_shared::protocol::{
    SetsStateMsg, WelcomeMsg, WheelStateMsg, WinnerMsg, PROTOCOL_VERSION,
};

/// Commands from viewer connections to the game loop
pub enum GameCommand {
    ViewerJoin {
        response: oneshot::Sender<(u32, WelcomeMsg)>,
    },
    ViewerLeave {
        id: u32,
    },
    ToggleSpin {
        viewer_id: u32,
    },
    AddName {
        viewer_id: u32,
        name: String,
    },
    RemoveName {
        viewer_id: u32,
        name: String,
    },
    ClearSet {
        viewer_id: u32,
    },
    LoadSamples {
        viewer_id: u32,
    },
    SelectSet {
        viewer_id: u32,
        set_id: u32,
    },
    /// Viewer fell behind the broadcast channel and wants current state
    Resync {
        viewer_id: u32,
    },
}

/// Broadcasts from game loop to all viewers
#[derive(Debug, Clone)]
pub enum GameBroadcast {
    WheelState(WheelStateMsg),
    SetsState(SetsStateMsg),
    Winner(WinnerMsg),
    /// Only delivered to the viewer whose command failed
    Rejected { viewer_id: u32, reason: String },
    /// Current state for one viewer that missed broadcasts
    Snapshot {
        viewer_id: u32,
        wheel: WheelStateMsg,
        sets: SetsStateMsg,
    },
}

/// Run the main game loop. Owns all wheel state.
pub async fn run_game_loop(
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    broadcast_tx: broadcast::Sender<GameBroadcast>,
    server_config: ServerConfig,
    spin_config: SpinConfig,
) {
    let mut state = WheelState::new(&server_config, spin_config);
    let mut next_viewer_id: u32 = 1;

    let tick_duration = Duration::from_secs_f64(1.0 / server_config.tick_rate_hz as f64);
    let broadcast_every_n = server_config.broadcast_every_n();
    let mut tick_count: u64 = 0;

    let mut tick_interval = tokio::time::interval(tick_duration);
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_tick = Instant::now();

    loop {
        tokio::select! {
            now = tick_interval.tick() => {
                // Skipped ticks still count: the wheel advances by the time that really passed
                let dt = elapsed_since(&mut last_tick, now);
                let was_spinning = state.controller.is_spinning();
                match state.tick(dt) {
                    Ok(Some(outcome)) => announce_outcome(&state, &outcome, &broadcast_tx),
                    Ok(None) => {
                        // Stream the angle at a lower rate while the wheel moves
                        if was_spinning {
                            tick_count += 1;
                            if tick_count % broadcast_every_n == 0 {
                                let _ = broadcast_tx.send(GameBroadcast::WheelState(
                                    state.get_wheel_state(),
                                ));
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Spin engine failed: {}", e);
                        let _ = broadcast_tx.send(GameBroadcast::WheelState(state.get_wheel_state()));
                        break;
                    }
                }
            }

            Some(cmd) = cmd_rx.recv() => {
                if let Err(e) = handle_command(&mut state, cmd, &broadcast_tx, &mut next_viewer_id) {
                    tracing::error!("Spin engine failed: {}", e);
                    break;
                }
            }

            else => break,
        }
    }

    tracing::info!("Game loop ended");
}

/// Seconds from `last_tick` to `now`, moving `last_tick` forward.
fn elapsed_since(last_tick: &mut Instant, now: Instant) -> f64 {
    let dt = now.saturating_duration_since(*last_tick).as_secs_f64();
    *last_tick = now.max(*last_tick);
    dt
}

/// Apply one viewer command. Only fatal engine errors are returned; everything
/// else is reported back to the viewer that sent the command.
fn handle_command(
    state: &mut WheelState,
    cmd: GameCommand,
    broadcast_tx: &broadcast::Sender<GameBroadcast>,
    next_viewer_id: &mut u32,
) -> Result<(), SpinError> {
    match cmd {
        GameCommand::ViewerJoin { response } => {
            let id = *next_viewer_id;
            *next_viewer_id = next_viewer_id.wrapping_add(1);
            let welcome = WelcomeMsg {
                protocol_version: PROTOCOL_VERSION,
                server_version: env!("CARGO_PKG_VERSION").to_string(),
                self_id: id,
                wheel: state.get_wheel_state(),
                sets: state.get_sets_state(),
                config: *state.controller.config(),
            };
            let _ = response.send((id, welcome));
        }
        GameCommand::ViewerLeave { id } => {
            tracing::info!("Viewer {} left", id);
        }
        GameCommand::ToggleSpin { viewer_id } => match state.toggle_spin() {
            Ok(Toggle::Started(plan)) => {
                tracing::info!(
                    "Viewer {} started a spin: {} turns, v0 {:.1} deg/s",
                    viewer_id,
                    plan.extra_turns,
                    plan.initial_velocity
                );
                let _ = broadcast_tx.send(GameBroadcast::WheelState(state.get_wheel_state()));
            }
            Ok(Toggle::CancelRequested) => {
                tracing::info!("Viewer {} stopped the spin", viewer_id);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => reject(broadcast_tx, viewer_id, e.to_string()),
        },
        GameCommand::AddName { viewer_id, name } => {
            let result = state.add_name(&name).map(|_| ());
            after_list_change(state, broadcast_tx, viewer_id, result);
        }
        GameCommand::RemoveName { viewer_id, name } => {
            let result = state.remove_name(&name);
            after_list_change(state, broadcast_tx, viewer_id, result);
        }
        GameCommand::ClearSet { viewer_id } => {
            let result = state.clear_set();
            after_list_change(state, broadcast_tx, viewer_id, result);
        }
        GameCommand::LoadSamples { viewer_id } => {
            let result = state.load_samples();
            after_list_change(state, broadcast_tx, viewer_id, result);
        }
        GameCommand::SelectSet { viewer_id, set_id } => {
            let result = state.select_set(set_id);
            after_list_change(state, broadcast_tx, viewer_id, result);
        }
        GameCommand::Resync { viewer_id } => {
            let _ = broadcast_tx.send(GameBroadcast::Snapshot {
                viewer_id,
                wheel: state.get_wheel_state(),
                sets: state.get_sets_state(),
            });
        }
    }
    Ok(())
}

fn after_list_change<E: std::fmt::Display>(
    state: &WheelState,
    broadcast_tx: &broadcast::Sender<GameBroadcast>,
    viewer_id: u32,
    result: Result<(), E>,
) {
    match result {
        Ok(()) => {
            let _ = broadcast_tx.send(GameBroadcast::SetsState(state.get_sets_state()));
        }
        Err(e) => reject(broadcast_tx, viewer_id, e.to_string()),
    }
}

fn reject(broadcast_tx: &broadcast::Sender<GameBroadcast>, viewer_id: u32, reason: String) {
    tracing::warn!("Rejected command from viewer {}: {}", viewer_id, reason);
    let _ = broadcast_tx.send(GameBroadcast::Rejected { viewer_id, reason });
}

/// Settled: push the resting angle, then the winner, then the shrunken sets.
fn announce_outcome(
    state: &WheelState,
    outcome: &SpinOutcome,
    broadcast_tx: &broadcast::Sender<GameBroadcast>,
) {
    tracing::info!(
        "Wheel settled on {:?} (index {}, cancelled: {}, drift {:.4} deg)",
        outcome.winner,
        outcome.winner_index,
        outcome.cancelled,
        outcome.drift
    );
    let _ = broadcast_tx.send(GameBroadcast::WheelState(state.get_wheel_state()));
    let _ = broadcast_tx.send(GameBroadcast::Winner(WinnerMsg {
        name: outcome.winner.clone(),
        index: outcome.winner_index as u32,
        cancelled: outcome.cancelled,
    }));
    let _ = broadcast_tx.send(GameBroadcast::SetsState(state.get_sets_state()));
}
