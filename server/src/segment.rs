//! Angular layout of names around the wheel.
//!
//! Segment `i` of `total` covers `[i * 360/total, (i + 1) * 360/total)` in the
//! wheel's own frame. The frame rotates with the wheel, so a point at wheel
//! angle `a` sits at absolute angle `a + rotation`. Callers must not pass
//! `total == 0`.

use wheel_shared::angle::{normalize, FULL_TURN};

/// Angular width of one segment.
pub fn segment_width(total: usize) -> f64 {
    debug_assert!(total > 0, "segment layout needs at least one name");
    FULL_TURN / total as f64
}

/// Start and end angle of segment `index`.
pub fn segment_of(index: usize, total: usize) -> (f64, f64) {
    let width = segment_width(total);
    (index as f64 * width, (index + 1) as f64 * width)
}

/// Angle of the middle of segment `index`.
pub fn segment_center(index: usize, total: usize) -> f64 {
    (index as f64 + 0.5) * segment_width(total)
}

/// Index of the segment under a pointer at `pointer_angle` when the wheel is rotated by `rotation`.
pub fn segment_at(rotation: f64, pointer_angle: f64, total: usize) -> usize {
    let wheel_angle = normalize(pointer_angle - rotation);
    let index = (wheel_angle / segment_width(total)).floor() as usize;
    index.min(total - 1)
}
