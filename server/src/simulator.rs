//! Deceleration physics for the wheel.
//!
//! The wheel's angular velocity decays exponentially, `v(t) = v0 · e^(-λt)`,
//! where `λ` comes from the per-frame decay factor and the reference frame
//! rate. Each tick integrates that curve exactly over `dt`, so the distance
//! covered between two velocities is `(v_a - v_b) / λ` no matter how the time
//! was sliced into frames. Launching inverts that relation: the initial
//! velocity is chosen so the wheel would cover exactly the distance to the
//! target before dropping to the stop threshold.

use crate::error::SpinError;
use wheel_shared::angle::normalize;
use wheel_shared::config::SpinConfig;

/// Hard cap on ticks per spin, independent of the simulated time budget
/// (catches hosts that keep ticking with dt = 0).
const MAX_SPIN_TICKS: u64 = 1_000_000;

/// Simulator phase. Settling is the transition back to `Idle`, not a phase of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinPhase {
    Idle,
    Spinning,
}

/// Motion state of an active spin.
#[derive(Debug, Clone)]
pub struct SpinState {
    pub current_angle: f64,
    /// deg/s
    pub angular_velocity: f64,
    pub target_angle: f64,
    /// Simulated seconds since launch
    pub elapsed: f64,
    pub ticks: u64,
    cancel_requested: bool,
}

/// Result of the settling transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settled {
    /// Angle the wheel rests at
    pub final_angle: f64,
    pub target_angle: f64,
    /// Where motion actually stopped minus the target, before the snap
    pub drift: f64,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Idle,
    Moving,
    Settled(Settled),
}

/// Wheel rotation and the deceleration state machine.
pub struct SpinSimulator {
    config: SpinConfig,
    decay_rate: f64,
    angle: f64,
    spin: Option<SpinState>,
}

impl SpinSimulator {
    pub fn new(config: SpinConfig) -> Self {
        Self {
            decay_rate: config.decay_rate(),
            config,
            angle: 0.0,
            spin: None,
        }
    }

    /// Current wheel rotation in degrees (what the renderer draws).
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn velocity(&self) -> f64 {
        self.spin.as_ref().map_or(0.0, |s| s.angular_velocity)
    }

    pub fn phase(&self) -> SpinPhase {
        if self.spin.is_some() {
            SpinPhase::Spinning
        } else {
            SpinPhase::Idle
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.spin.is_some()
    }

    pub fn state(&self) -> Option<&SpinState> {
        self.spin.as_ref()
    }

    /// Velocity that coasts exactly `distance` degrees before reaching the stop threshold.
    pub fn initial_velocity_for(&self, distance: f64) -> f64 {
        distance.max(0.0) * self.decay_rate + self.config.stop_threshold_deg_per_sec
    }

    /// Distance covered from `initial_velocity` until the stop threshold.
    pub fn predicted_distance(&self, initial_velocity: f64) -> f64 {
        ((initial_velocity - self.config.stop_threshold_deg_per_sec) / self.decay_rate).max(0.0)
    }

    /// Predicted time (seconds) for `initial_velocity` to decay to the stop threshold.
    pub fn predicted_duration(&self, initial_velocity: f64) -> f64 {
        let threshold = self.config.stop_threshold_deg_per_sec;
        if initial_velocity <= threshold {
            return 0.0;
        }
        (initial_velocity / threshold).ln() / self.decay_rate
    }

    /// Fold the resting angle into [0, 360). Looks identical on screen.
    /// No-op while spinning.
    pub fn rebase(&mut self) {
        if self.spin.is_none() {
            self.angle = normalize(self.angle);
        }
    }

    /// Start spinning from the current angle toward `target_angle`.
    /// Returns the initial velocity.
    pub fn launch(&mut self, target_angle: f64) -> Result<f64, SpinError> {
        if self.spin.is_some() {
            return Err(SpinError::AlreadySpinning);
        }
        debug_assert!(target_angle > self.angle, "spins only move forward");

        let velocity = self.initial_velocity_for(target_angle - self.angle);
        self.spin = Some(SpinState {
            current_angle: self.angle,
            angular_velocity: velocity,
            target_angle,
            elapsed: 0.0,
            ticks: 0,
            cancel_requested: false,
        });
        Ok(velocity)
    }

    /// Ask the running spin to stop where it is. Takes effect on the next tick.
    /// Returns false when idle.
    pub fn request_cancel(&mut self) -> bool {
        match self.spin.as_mut() {
            Some(state) => {
                state.cancel_requested = true;
                true
            }
            None => false,
        }
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f64) -> Result<TickOutcome, SpinError> {
        let threshold = self.config.stop_threshold_deg_per_sec;
        let max_seconds = self.config.max_spin_seconds;
        let decay_rate = self.decay_rate;

        let Some(state) = self.spin.as_mut() else {
            return Ok(TickOutcome::Idle);
        };

        if state.cancel_requested {
            let stopped_at = state.current_angle;
            return Ok(TickOutcome::Settled(self.settle(true, stopped_at)));
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        // r - 1 where r = e^(-λ dt) = decay_factor^(dt * reference_rate)
        let decay = (-decay_rate * dt).exp_m1();
        let v = state.angular_velocity;
        let travelled = state.current_angle - v * decay / decay_rate;
        // The last tick may carry past the target; the wheel itself never does
        state.current_angle = travelled.min(state.target_angle);
        state.angular_velocity = v * (1.0 + decay);
        state.elapsed += dt;
        state.ticks += 1;
        self.angle = state.current_angle;

        if state.angular_velocity.abs() < threshold {
            return Ok(TickOutcome::Settled(self.settle(false, travelled)));
        }

        if state.elapsed > max_seconds || state.ticks > MAX_SPIN_TICKS {
            let err = SpinError::NonConvergent {
                ticks: state.ticks,
                elapsed: state.elapsed,
            };
            self.spin = None;
            return Err(err);
        }

        Ok(TickOutcome::Moving)
    }

    /// Settling: snap to the final angle, zero the velocity and go idle.
    /// A natural stop rests exactly on the target; a cancelled one where it was.
    /// `stopped_at` is where unclamped motion ended, reported as drift.
    fn settle(&mut self, cancelled: bool, stopped_at: f64) -> Settled {
        let Some(state) = self.spin.take() else {
            return Settled {
                final_angle: self.angle,
                target_angle: self.angle,
                drift: 0.0,
                cancelled,
            };
        };

        let final_angle = if cancelled {
            state.current_angle
        } else {
            state.target_angle
        };
        self.angle = final_angle;

        Settled {
            final_angle,
            target_angle: state.target_angle,
            drift: stopped_at - state.target_angle,
            cancelled,
        }
    }
}
