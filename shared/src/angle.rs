//! Angle utilities for the wheel, in degrees.
//! The wheel rotates in the positive direction; angles are unbounded unless noted.

/// One full turn of the wheel in degrees
pub const FULL_TURN: f64 = 360.0;

/// Grid that resolved rotations are snapped to (2^-32 degrees).
/// A multiple of 360 plus an angle on this grid stays exact in f64 below `EXACT_LIMIT`.
pub const ANGLE_QUANTUM: f64 = 1.0 / 4_294_967_296.0;

/// Largest magnitude (degrees) at which `whole_turns * 360 + quantized` is exact
pub const EXACT_LIMIT: f64 = 1_048_576.0;

/// Normalize an angle into [0, 360).
pub fn normalize(deg: f64) -> f64 {
    let r = deg.rem_euclid(FULL_TURN);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if r >= FULL_TURN {
        0.0
    } else {
        r
    }
}

/// Snap an angle onto the `ANGLE_QUANTUM` grid.
pub fn quantize(deg: f64) -> f64 {
    (deg / ANGLE_QUANTUM).round() * ANGLE_QUANTUM
}

/// Normalize then snap, keeping the result in [0, 360).
pub fn normalize_quantized(deg: f64) -> f64 {
    normalize(quantize(normalize(deg)))
}

/// Smallest non-negative forward rotation taking orientation `from` to `to`.
/// Result is in [0, 360).
pub fn forward_delta(from: f64, to: f64) -> f64 {
    normalize(normalize(to) - normalize(from))
}

/// Number of completed turns below `deg` (floor division by 360).
pub fn whole_turns(deg: f64) -> f64 {
    ((deg - normalize(deg)) / FULL_TURN).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn normalize_keeps_in_range_values() {
        assert_eq!(normalize(0.0), 0.0);
        assert_eq!(normalize(135.0), 135.0);
        assert_eq!(normalize(359.5), 359.5);
    }

    #[test]
    fn normalize_wraps_large_and_negative_values() {
        assert_eq!(normalize(360.0), 0.0);
        assert_eq!(normalize(1935.0), 135.0);
        assert_eq!(normalize(-225.0), 135.0);
        assert_eq!(normalize(-720.0), 0.0);
    }

    #[test]
    fn normalize_never_returns_full_turn() {
        let r = normalize(-1e-20);
        assert!((0.0..FULL_TURN).contains(&r));
    }

    #[test]
    fn quantize_is_idempotent() {
        let q = quantize(360.0 / 7.0);
        assert_eq!(quantize(q), q);
        assert_close(q, 360.0 / 7.0);
    }

    #[test]
    fn quantized_angle_survives_turn_arithmetic() {
        let base = normalize_quantized(-(2.5 * 360.0 / 7.0));
        for turns in [0.0, 1.0, 5.0, 7.0, 250.0, 2000.0] {
            let total = turns * FULL_TURN + base;
            assert!(total < EXACT_LIMIT);
            assert_eq!(total.rem_euclid(FULL_TURN), base);
        }
    }

    #[test]
    fn forward_delta_is_zero_for_same_orientation() {
        assert_eq!(forward_delta(90.0, 450.0), 0.0);
    }

    #[test]
    fn forward_delta_wraps_forward() {
        assert_close(forward_delta(350.0, 10.0), 20.0);
        assert_close(forward_delta(10.0, 350.0), 340.0);
    }

    #[test]
    fn whole_turns_floors() {
        assert_eq!(whole_turns(0.0), 0.0);
        assert_eq!(whole_turns(359.0), 0.0);
        assert_eq!(whole_turns(360.0), 1.0);
        assert_eq!(whole_turns(1935.0), 5.0);
        assert_eq!(whole_turns(-10.0), -1.0);
    }
}
