use serde::{Deserialize, Serialize};

/// An extreme value found in the metrics sequence and where it occurred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakMeasurement {
    pub value: f64,
    pub frame: u32,
    pub timestamp: f64,
}

/// Rotation ("engine") summary of the swing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineMetrics {
    pub hip_shoulder_separation: Option<PeakMeasurement>,
    /// Most negative (most coiled) shoulder rotation.
    pub max_shoulder_rotation: Option<PeakMeasurement>,
    pub max_hip_rotation: Option<PeakMeasurement>,
}

/// Swing timing. Absent values mean the inputs were not detected, not zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TempoMetrics {
    pub backswing_duration: Option<f64>,
    pub forward_swing_duration: Option<f64>,
    pub swing_rhythm_ratio: Option<f64>,
}

/// Body segments in proximal-to-distal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainSegment {
    Hip,
    Shoulder,
    Elbow,
    Wrist,
}

impl ChainSegment {
    pub const ORDER: [ChainSegment; 4] = [
        ChainSegment::Hip,
        ChainSegment::Shoulder,
        ChainSegment::Elbow,
        ChainSegment::Wrist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainSegment::Hip => "hip",
            ChainSegment::Shoulder => "shoulder",
            ChainSegment::Elbow => "elbow",
            ChainSegment::Wrist => "wrist",
        }
    }
}

/// Per-segment peak velocities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakVelocitySequence {
    pub hip: PeakMeasurement,
    pub shoulder: PeakMeasurement,
    pub elbow: PeakMeasurement,
    pub wrist: PeakMeasurement,
}

impl PeakVelocitySequence {
    pub fn get(&self, segment: ChainSegment) -> &PeakMeasurement {
        match segment {
            ChainSegment::Hip => &self.hip,
            ChainSegment::Shoulder => &self.shoulder,
            ChainSegment::Elbow => &self.elbow,
            ChainSegment::Wrist => &self.wrist,
        }
    }

    /// Peak timestamps in proximal-to-distal order.
    pub fn timestamps(&self) -> [f64; 4] {
        ChainSegment::ORDER.map(|segment| self.get(segment).timestamp)
    }
}

/// Lag between the velocity peaks of adjacent segments, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainLag {
    pub hip_to_shoulder: f64,
    pub shoulder_to_elbow: f64,
    pub elbow_to_wrist: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KineticChainMetrics {
    pub peak_velocity_sequence: Option<PeakVelocitySequence>,
    pub chain_lag: Option<ChainLag>,
    pub confidence: Option<f64>,
}
