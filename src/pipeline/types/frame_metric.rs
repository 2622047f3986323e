use serde::{Deserialize, Serialize};

/// Scalar measurements derived from one valid frame (and its valid predecessor
/// for the velocity terms).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameMetric {
    pub frame_number: u32,
    pub timestamp: f64,
    /// Degrees, 0-180.
    pub elbow_angle: f64,
    /// Normalized distance per second.
    pub wrist_velocity: f64,
    pub wrist_x: f64,
    pub wrist_y: f64,
    /// Midpoint of the shoulder x-coordinates.
    pub body_center_x: f64,
    pub wrist_behind_body: bool,
    /// Degrees, (-180, 180].
    pub hip_rotation: f64,
    pub shoulder_rotation: f64,
    /// Degrees per second, magnitude only.
    pub hip_angular_velocity: f64,
    pub shoulder_angular_velocity: f64,
    pub elbow_velocity: f64,
    pub shoulder_velocity: f64,
    pub knee_bend: f64,
    pub trunk_lean: f64,
    pub upper_arm_angle: f64,
}

impl FrameMetric {
    /// How far the wrist trails the body center (positive = behind).
    pub fn wrist_offset_behind(&self) -> f64 {
        self.body_center_x - self.wrist_x
    }

    /// How far the wrist leads the body center (positive = in front).
    pub fn wrist_offset_ahead(&self) -> f64 {
        self.wrist_x - self.body_center_x
    }

    pub fn rotation_separation(&self) -> f64 {
        (self.shoulder_rotation - self.hip_rotation).abs()
    }
}
