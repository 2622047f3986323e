//! Frame-to-frame velocities.

use crate::common::Landmark;

/// Displacement in the image plane divided by elapsed time.
/// Zero without a previous position or with a non-positive time step.
pub fn linear_velocity(current: Option<&Landmark>, previous: Option<&Landmark>, elapsed: f64) -> f64 {
    let (Some(current), Some(previous)) = (current, previous) else {
        return 0.0;
    };
    if !(elapsed > 0.0) {
        return 0.0;
    }

    let dx = current.x - previous.x;
    let dy = current.y - previous.y;
    (dx * dx + dy * dy).sqrt() / elapsed
}

/// Magnitude of the change in an angle per second. Direction is discarded.
pub fn angular_velocity(current: f64, previous: f64, elapsed: f64) -> f64 {
    if !(elapsed > 0.0) {
        return 0.0;
    }
    (current - previous).abs() / elapsed
}
