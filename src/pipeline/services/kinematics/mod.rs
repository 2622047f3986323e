//! Kinematic feature extraction - pure functions over landmark snapshots.
//!
//! Every function degrades to a documented default on missing or malformed
//! landmarks; none of them can fail.

mod angles;
mod rotation;
mod velocity;

pub use angles::{calculate_elbow_angle, calculate_knee_bend, calculate_upper_arm_angle, joint_angle};
pub use rotation::{calculate_hip_rotation, calculate_shoulder_rotation, calculate_trunk_lean};
pub use velocity::{angular_velocity, linear_velocity};
