use thiserror::Error;

/// Spin engine failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpinError {
    /// No names to draw from. Refused before any state changes.
    #[error("cannot spin: no eligible names")]
    EmptyPool,
    /// The drawn winner is not on the wheel (eligible set was not a subset of the wheel).
    #[error("winner {winner:?} is not on the wheel")]
    WinnerNotFound { winner: String },
    /// The deceleration never reached the stop threshold.
    #[error("spin did not settle after {ticks} ticks ({elapsed:.2}s simulated)")]
    NonConvergent { ticks: u64, elapsed: f64 },
    #[error("a spin is already in progress")]
    AlreadySpinning,
}

impl SpinError {
    /// Fatal errors mean an internal invariant broke; the caller should not carry on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SpinError::WinnerNotFound { .. } | SpinError::NonConvergent { .. }
        )
    }
}

/// Name list management failures. All of these are user-recoverable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("name is empty")]
    EmptyName,
    #[error("{0:?} is already on the wheel")]
    DuplicateName(String),
    #[error("{0:?} is not in set {1}")]
    UnknownName(String, u32),
    #[error("set id {0} is out of range")]
    InvalidSetId(u32),
    #[error("the wheel is spinning")]
    WheelBusy,
}
