//! Orchestrates a spin: decide the winner, resolve where the wheel must stop,
//! launch the simulator, and report the winner once the wheel has settled.

use crate::error::SpinError;
use crate::segment::segment_at;
use crate::selector::{draw_extra_turns, select_winner};
use crate::simulator::{Settled, SpinSimulator, TickOutcome};
use crate::target::resolve_target;
use rand::Rng;
use wheel_shared::angle::normalize;
use wheel_shared::config::SpinConfig;

/// What was decided when a spin started.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinPlan {
    pub winner: String,
    /// Winner's segment index in the layout the spin started with
    pub winner_index: usize,
    pub start_angle: f64,
    pub target_angle: f64,
    pub extra_turns: u32,
    pub initial_velocity: f64,
}

/// Emitted exactly once per spin, when the wheel comes to rest.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinOutcome {
    pub winner: String,
    pub winner_index: usize,
    pub final_angle: f64,
    /// Stopped early; `winner` is the name under the pointer rather than the planned one
    pub cancelled: bool,
    /// Pre-snap distance from the target (natural stops only)
    pub drift: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Toggle {
    Started(SpinPlan),
    CancelRequested,
}

/// Spin in flight: the decided winner and the layout it was resolved against.
struct ActiveSpin {
    plan: SpinPlan,
    names: Vec<String>,
}

pub struct SpinController {
    config: SpinConfig,
    simulator: SpinSimulator,
    active: Option<ActiveSpin>,
}

impl SpinController {
    pub fn new(config: SpinConfig) -> Self {
        Self {
            config,
            simulator: SpinSimulator::new(config),
            active: None,
        }
    }

    pub fn config(&self) -> &SpinConfig {
        &self.config
    }

    /// Current wheel rotation (degrees).
    pub fn angle(&self) -> f64 {
        self.simulator.angle()
    }

    pub fn is_spinning(&self) -> bool {
        self.simulator.is_spinning()
    }

    /// Plan of the spin in progress, if any.
    pub fn active_plan(&self) -> Option<&SpinPlan> {
        self.active.as_ref().map(|a| &a.plan)
    }

    /// Pick a winner from `eligible`, aim the wheel at it within `names`, and launch.
    ///
    /// Nothing changes unless every step succeeds.
    pub fn start_spin(
        &mut self,
        eligible: &[String],
        names: &[String],
        rng: &mut impl Rng,
    ) -> Result<SpinPlan, SpinError> {
        if self.simulator.is_spinning() {
            return Err(SpinError::AlreadySpinning);
        }
        if eligible.is_empty() || names.is_empty() {
            return Err(SpinError::EmptyPool);
        }

        let winner = select_winner(eligible, rng)?.clone();
        let extra_turns = draw_extra_turns(&self.config, rng);

        // Resolve against the folded angle; the simulator is rebased only once this succeeds
        let start_angle = normalize(self.simulator.angle());
        let target_angle = resolve_target(
            &winner,
            names,
            start_angle,
            extra_turns,
            self.config.pointer_angle_deg,
        )?;
        let winner_index = names
            .iter()
            .position(|n| *n == winner)
            .ok_or_else(|| SpinError::WinnerNotFound {
                winner: winner.clone(),
            })?;

        self.simulator.rebase();
        let initial_velocity = self.simulator.launch(target_angle)?;

        let plan = SpinPlan {
            winner,
            winner_index,
            start_angle,
            target_angle,
            extra_turns,
            initial_velocity,
        };
        tracing::debug!(
            "Spin planned: {:?} (index {}) target {:.3} after {} turns, v0 {:.1} deg/s",
            plan.winner,
            plan.winner_index,
            plan.target_angle,
            plan.extra_turns,
            plan.initial_velocity
        );
        self.active = Some(ActiveSpin {
            plan: plan.clone(),
            names: names.to_vec(),
        });
        Ok(plan)
    }

    /// The single spin button: start when idle, stop when spinning.
    pub fn request_stop_or_start(
        &mut self,
        eligible: &[String],
        names: &[String],
        rng: &mut impl Rng,
    ) -> Result<Toggle, SpinError> {
        if self.simulator.request_cancel() {
            return Ok(Toggle::CancelRequested);
        }
        self.start_spin(eligible, names, rng).map(Toggle::Started)
    }

    /// Advance the wheel. Returns the outcome on the tick the wheel settles.
    pub fn tick(&mut self, dt: f64) -> Result<Option<SpinOutcome>, SpinError> {
        match self.simulator.tick(dt) {
            Ok(TickOutcome::Settled(settled)) => Ok(self.finish(settled)),
            Ok(TickOutcome::Moving | TickOutcome::Idle) => Ok(None),
            Err(e) => {
                self.active = None;
                Err(e)
            }
        }
    }

    fn finish(&mut self, settled: Settled) -> Option<SpinOutcome> {
        let active = self.active.take()?;

        if settled.cancelled {
            let index = segment_at(
                settled.final_angle,
                self.config.pointer_angle_deg,
                active.names.len(),
            );
            return Some(SpinOutcome {
                winner: active.names[index].clone(),
                winner_index: index,
                final_angle: settled.final_angle,
                cancelled: true,
                drift: 0.0,
            });
        }

        Some(SpinOutcome {
            winner: active.plan.winner,
            winner_index: active.plan.winner_index,
            final_angle: settled.final_angle,
            cancelled: false,
            drift: settled.drift,
        })
    }
}
