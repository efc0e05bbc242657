/// Spin engine configuration
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SpinConfig {
    /// Velocity multiplier applied once per reference frame (must be < 1)
    pub decay_factor: f64,
    /// Frame rate the decay factor is expressed against (Hz)
    pub reference_rate_hz: f64,
    /// Velocity below which the wheel is considered stopped (deg/s)
    pub stop_threshold_deg_per_sec: f64,
    /// Minimum full turns before the wheel lands on the winner
    pub min_extra_turns: u32,
    /// Maximum full turns (inclusive)
    pub max_extra_turns: u32,
    /// Absolute angle of the pointer (degrees, 0 = pointing right)
    pub pointer_angle_deg: f64,
    /// A spin still moving after this long (simulated seconds) is treated as broken
    pub max_spin_seconds: f64,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            decay_factor: 0.985,
            reference_rate_hz: 60.0,
            stop_threshold_deg_per_sec: 10.0,
            min_extra_turns: 5,
            max_extra_turns: 7,
            pointer_angle_deg: 0.0,
            max_spin_seconds: 60.0,
        }
    }
}

impl SpinConfig {
    /// Upper bound on extra turns; keeps resolved targets in the exactly representable range.
    pub const MAX_EXTRA_TURNS_LIMIT: u32 = 1000;

    pub fn validate(&self) -> Result<(), String> {
        if !self.decay_factor.is_finite() || self.decay_factor <= 0.0 || self.decay_factor >= 1.0 {
            return Err("decay_factor must be finite and in (0, 1)".to_string());
        }
        if !self.reference_rate_hz.is_finite() || self.reference_rate_hz <= 0.0 {
            return Err("reference_rate_hz must be finite and > 0".to_string());
        }
        if !self.stop_threshold_deg_per_sec.is_finite() || self.stop_threshold_deg_per_sec <= 0.0
        {
            return Err("stop_threshold_deg_per_sec must be finite and > 0".to_string());
        }
        if self.min_extra_turns < 1 {
            return Err("min_extra_turns must be >= 1".to_string());
        }
        if self.max_extra_turns < self.min_extra_turns {
            return Err("max_extra_turns must be >= min_extra_turns".to_string());
        }
        if self.max_extra_turns > Self::MAX_EXTRA_TURNS_LIMIT {
            return Err(format!(
                "max_extra_turns must be <= {}",
                Self::MAX_EXTRA_TURNS_LIMIT
            ));
        }
        if !self.pointer_angle_deg.is_finite() {
            return Err("pointer_angle_deg must be finite".to_string());
        }
        if !self.max_spin_seconds.is_finite() || self.max_spin_seconds <= 0.0 {
            return Err("max_spin_seconds must be finite and > 0".to_string());
        }
        let longest = self.longest_spin_seconds();
        if longest > self.max_spin_seconds {
            return Err(format!(
                "longest spin takes {:.1}s, over max_spin_seconds {:.1}s",
                longest, self.max_spin_seconds
            ));
        }
        Ok(())
    }

    /// Duration of the longest possible spin: `max_extra_turns` plus almost a full
    /// turn to reach the winner, decaying from launch speed to the stop threshold.
    pub fn longest_spin_seconds(&self) -> f64 {
        let rate = self.decay_rate();
        let distance = (self.max_extra_turns as f64 + 1.0) * 360.0;
        let threshold = self.stop_threshold_deg_per_sec;
        ((distance * rate + threshold) / threshold).ln() / rate
    }

    /// Continuous decay rate λ (1/s) such that v(t) = v0 · e^(-λt).
    pub fn decay_rate(&self) -> f64 {
        -self.decay_factor.ln() * self.reference_rate_hz
    }
}
