//! Segment rotation relative to the camera plane.
//!
//! Rotation of a left/right landmark pair is atan2(Δz, Δx) in degrees, range
//! (-180, 180]. 0 means the segment is parallel to the camera.

use crate::common::{BodyPoint, LandmarkSet};

fn pair_rotation(landmarks: &LandmarkSet, left: BodyPoint, right: BodyPoint) -> f64 {
    let (Some(left), Some(right)) = (landmarks.get(left), landmarks.get(right)) else {
        return 0.0;
    };
    (right.z - left.z).atan2(right.x - left.x).to_degrees()
}

/// Hip line rotation; 0.0 when either hip is missing.
pub fn calculate_hip_rotation(landmarks: &LandmarkSet) -> f64 {
    pair_rotation(landmarks, BodyPoint::LeftHip, BodyPoint::RightHip)
}

/// Shoulder line rotation; 0.0 when either shoulder is missing.
pub fn calculate_shoulder_rotation(landmarks: &LandmarkSet) -> f64 {
    pair_rotation(landmarks, BodyPoint::LeftShoulder, BodyPoint::RightShoulder)
}

/// Forward/backward lean of the hip-to-shoulder line against vertical.
/// Image y grows downward, hence the negated Δy.
pub fn calculate_trunk_lean(landmarks: &LandmarkSet) -> f64 {
    let (Some(left_hip), Some(right_hip), Some(left_shoulder), Some(right_shoulder)) = (
        landmarks.get(BodyPoint::LeftHip),
        landmarks.get(BodyPoint::RightHip),
        landmarks.get(BodyPoint::LeftShoulder),
        landmarks.get(BodyPoint::RightShoulder),
    ) else {
        return 0.0;
    };

    let dy = (left_shoulder.y + right_shoulder.y) / 2.0 - (left_hip.y + right_hip.y) / 2.0;
    let dz = (left_shoulder.z + right_shoulder.z) / 2.0 - (left_hip.z + right_hip.z) / 2.0;
    dz.atan2(-dy).to_degrees()
}
