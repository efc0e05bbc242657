/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub tick_rate_hz: u32,
    /// How often the wheel angle is pushed to viewers while spinning
    pub broadcast_rate_hz: u32,
    /// Fixed seed for reproducible draws; None seeds from the OS
    pub rng_seed: Option<u64>,
    pub max_connections: usize,
    /// Per-viewer command budget; exceeding it drops the connection
    pub max_commands_per_sec: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9002".to_string(),
            tick_rate_hz: 60,
            broadcast_rate_hz: 30,
            rng_seed: None,
            max_connections: 200,
            max_commands_per_sec: 20,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("listen_addr must not be empty".to_string());
        }
        if self.tick_rate_hz == 0 {
            return Err("tick_rate_hz must be > 0".to_string());
        }
        if self.broadcast_rate_hz == 0 || self.broadcast_rate_hz > self.tick_rate_hz {
            return Err("broadcast_rate_hz must be in 1..=tick_rate_hz".to_string());
        }
        if self.max_connections == 0 {
            return Err("max_connections must be > 0".to_string());
        }
        if self.max_commands_per_sec == 0 {
            return Err("max_commands_per_sec must be > 0".to_string());
        }
        Ok(())
    }

    /// Ticks between two wheel-angle broadcasts while spinning.
    pub fn broadcast_every_n(&self) -> u64 {
        (self.tick_rate_hz / self.broadcast_rate_hz).max(1) as u64
    }
}
