use crate::error::SpinError;
use crate::segment::segment_center;
use wheel_shared::angle::{normalize, normalize_quantized, whole_turns, FULL_TURN};

/// Wheel orientation (in [0, 360)) that puts the middle of segment `index` under the pointer.
///
/// Snapped to the angle quantum so that adding whole turns stays exact.
pub fn base_rotation(pointer_angle: f64, index: usize, total: usize) -> f64 {
    normalize_quantized(pointer_angle - segment_center(index, total))
}

/// Absolute rotation at which `winner` sits under the pointer after `extra_turns` full turns.
///
/// The result is always ahead of `current_angle`, and `result mod 360` is
/// exactly `base_rotation(..)` as long as `current_angle` stays below
/// `EXACT_LIMIT` degrees.
pub fn resolve_target(
    winner: &str,
    names: &[String],
    current_angle: f64,
    extra_turns: u32,
    pointer_angle: f64,
) -> Result<f64, SpinError> {
    let index = names
        .iter()
        .position(|n| n == winner)
        .ok_or_else(|| SpinError::WinnerNotFound {
            winner: winner.to_string(),
        })?;

    let base = base_rotation(pointer_angle, index, names.len());
    let facing = normalize(current_angle);

    // Land in the current turn if the base is still ahead, otherwise the next one.
    // With no extra turns an exact match must still move a full turn.
    let wrap = if base < facing || (base == facing && extra_turns == 0) {
        1.0
    } else {
        0.0
    };
    let turns = whole_turns(current_angle) + wrap + extra_turns as f64;

    Ok(turns * FULL_TURN + base)
}
