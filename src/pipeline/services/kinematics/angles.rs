//! Joint angles via the dot product formula
//!
//! cos(θ) = (v1 · v2) / (|v1| × |v2|), clamped to [-1, 1] before acos.

use crate::common::{BodyPoint, Landmark, LandmarkSet};

/// Magnitudes below this are treated as a degenerate (zero-length) segment.
const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// Knee angle reported when the leg cannot be measured (fully straight).
pub const DEFAULT_KNEE_BEND: f64 = 180.0;

/// Angle in degrees between two vectors, `None` if either has no length.
fn angle_between(v1: [f64; 3], v2: [f64; 3]) -> Option<f64> {
    let dot: f64 = v1.iter().zip(v2.iter()).map(|(a, b)| a * b).sum();
    let mag1 = v1.iter().map(|a| a * a).sum::<f64>().sqrt();
    let mag2 = v2.iter().map(|b| b * b).sum::<f64>().sqrt();

    if mag1 < MIN_SEGMENT_LENGTH || mag2 < MIN_SEGMENT_LENGTH {
        return None;
    }

    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    Some(cos_angle.acos().to_degrees())
}

/// Angle at vertex `b` formed by `a` and `c` in the image (x, y) plane.
///
/// Returns degrees in [0, 180]:
/// - 90° = bent at a right angle
/// - 180° = fully straight
pub fn joint_angle(a: &Landmark, b: &Landmark, c: &Landmark) -> Option<f64> {
    angle_between([a.x - b.x, a.y - b.y, 0.0], [c.x - b.x, c.y - b.y, 0.0])
}

/// Right elbow angle (shoulder-elbow-wrist). 0.0 when the arm cannot be
/// measured, so a missing arm never reads as extended.
pub fn calculate_elbow_angle(landmarks: &LandmarkSet) -> f64 {
    let (Some(shoulder), Some(elbow), Some(wrist)) = (
        landmarks.get(BodyPoint::RightShoulder),
        landmarks.get(BodyPoint::RightElbow),
        landmarks.get(BodyPoint::RightWrist),
    ) else {
        return 0.0;
    };
    joint_angle(shoulder, elbow, wrist).unwrap_or(0.0)
}

/// Right knee angle (hip-knee-ankle) in 3D. Missing data means straight.
pub fn calculate_knee_bend(landmarks: &LandmarkSet) -> f64 {
    let (Some(hip), Some(knee), Some(ankle)) = (
        landmarks.get(BodyPoint::RightHip),
        landmarks.get(BodyPoint::RightKnee),
        landmarks.get(BodyPoint::RightAnkle),
    ) else {
        return DEFAULT_KNEE_BEND;
    };

    angle_between(
        [hip.x - knee.x, hip.y - knee.y, hip.z - knee.z],
        [ankle.x - knee.x, ankle.y - knee.y, ankle.z - knee.z],
    )
    .unwrap_or(DEFAULT_KNEE_BEND)
}

/// Right upper-arm elevation against the vertical shoulder-to-hip line.
/// 0 = arm hanging down, 90 = horizontal, 180 = straight up.
pub fn calculate_upper_arm_angle(landmarks: &LandmarkSet) -> f64 {
    let (Some(shoulder), Some(elbow), Some(hip)) = (
        landmarks.get(BodyPoint::RightShoulder),
        landmarks.get(BodyPoint::RightElbow),
        landmarks.get(BodyPoint::RightHip),
    ) else {
        return 0.0;
    };

    angle_between(
        [elbow.x - shoulder.x, elbow.y - shoulder.y, elbow.z - shoulder.z],
        [0.0, hip.y - shoulder.y, 0.0],
    )
    .unwrap_or(0.0)
}
