use crate::config::ServerConfig;
use crate::controller::{SpinController, SpinOutcome, Toggle};
use crate::error::{RosterError, SpinError};
use crate::roster::Roster;
use rand_chacha::ChaCha8Rng;
use wheel_shared::config::SpinConfig;
use wheel_shared::protocol::{round4, SetsStateMsg, WheelStateMsg};

/// Central wheel state owned by the game loop task.
pub struct WheelState {
    pub roster: Roster,
    pub controller: SpinController,
    pub rng: ChaCha8Rng,
}

impl WheelState {
    pub fn new(server_config: &ServerConfig, spin_config: SpinConfig) -> Self {
        use rand::SeedableRng;
        let rng = match server_config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            roster: Roster::new(),
            controller: SpinController::new(spin_config),
            rng,
        }
    }

    /// The spin button: start a spin on the selected set, or stop the running one.
    pub fn toggle_spin(&mut self) -> Result<Toggle, SpinError> {
        let eligible = self.roster.eligible();
        let names = self.roster.all_names();
        self.controller
            .request_stop_or_start(&eligible, &names, &mut self.rng)
    }

    /// Advance the wheel. A settled winner is taken out of the selected set.
    pub fn tick(&mut self, dt: f64) -> Result<Option<SpinOutcome>, SpinError> {
        let outcome = self.controller.tick(dt)?;
        if let Some(outcome) = &outcome {
            if !self.roster.remove_winner(&outcome.winner) {
                tracing::debug!(
                    "Winner {:?} is not in set {}, nothing removed",
                    outcome.winner,
                    self.roster.selected_set_id()
                );
            }
        }
        Ok(outcome)
    }

    pub fn add_name(&mut self, name: &str) -> Result<String, RosterError> {
        self.ensure_idle()?;
        self.roster.add_name(name)
    }

    pub fn remove_name(&mut self, name: &str) -> Result<(), RosterError> {
        self.ensure_idle()?;
        self.roster.remove_name(name)
    }

    pub fn clear_set(&mut self) -> Result<(), RosterError> {
        self.ensure_idle()?;
        self.roster.clear_set();
        Ok(())
    }

    pub fn load_samples(&mut self) -> Result<(), RosterError> {
        self.ensure_idle()?;
        self.roster.load_samples();
        Ok(())
    }

    pub fn select_set(&mut self, id: u32) -> Result<(), RosterError> {
        self.ensure_idle()?;
        self.roster.select_set(id)
    }

    /// Get wheel rotation for broadcasting
    pub fn get_wheel_state(&self) -> WheelStateMsg {
        WheelStateMsg {
            angle: round4(self.controller.angle()),
            spinning: self.controller.is_spinning(),
        }
    }

    /// Get name sets for broadcasting
    pub fn get_sets_state(&self) -> SetsStateMsg {
        SetsStateMsg {
            sets: self.roster.to_wire(),
            selected_set_id: self.roster.selected_set_id(),
            names: self.roster.all_names(),
            eligible: self.roster.eligible(),
            can_spin: self.roster.can_spin(),
        }
    }

    // The layout must not change under a spin; the target was resolved against it
    fn ensure_idle(&self) -> Result<(), RosterError> {
        if self.controller.is_spinning() {
            Err(RosterError::WheelBusy)
        } else {
            Ok(())
        }
    }
}
