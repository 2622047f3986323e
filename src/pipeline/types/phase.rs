use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ResultError;

/// The five swing phases, in their fixed dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingPhase {
    UnitTurn,
    Backswing,
    ForwardSwing,
    Contact,
    FollowThrough,
}

impl SwingPhase {
    pub const ALL: [SwingPhase; 5] = [
        SwingPhase::UnitTurn,
        SwingPhase::Backswing,
        SwingPhase::ForwardSwing,
        SwingPhase::Contact,
        SwingPhase::FollowThrough,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SwingPhase::UnitTurn => "unit_turn",
            SwingPhase::Backswing => "backswing",
            SwingPhase::ForwardSwing => "forward_swing",
            SwingPhase::Contact => "contact",
            SwingPhase::FollowThrough => "follow_through",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SwingPhase::UnitTurn => "Unit turn",
            SwingPhase::Backswing => "Backswing",
            SwingPhase::ForwardSwing => "Forward swing",
            SwingPhase::Contact => "Contact",
            SwingPhase::FollowThrough => "Follow-through",
        }
    }

    /// The phase that must be detected before this one can be.
    pub fn prerequisite(&self) -> Option<SwingPhase> {
        match self {
            SwingPhase::UnitTurn => None,
            SwingPhase::Backswing => Some(SwingPhase::UnitTurn),
            SwingPhase::ForwardSwing => Some(SwingPhase::Backswing),
            SwingPhase::Contact => Some(SwingPhase::ForwardSwing),
            SwingPhase::FollowThrough => Some(SwingPhase::Contact),
        }
    }
}

impl fmt::Display for SwingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable outcome codes for every phase detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseReason {
    Detected,
    NotAnalyzed,
    PrerequisiteNotDetected,
    InsufficientValidFrames,
    WristNeverBehindBody,
    InsufficientBodyRotation,
    NoBackswingFramesFound,
    InsufficientVelocity,
    NoHipVelocityReversal,
    InsufficientVelocityAndArmNotExtended,
    ArmNotExtended,
    WristPositionUnclear,
    NoProximalToDistalSequence,
    ContactCriteriaNotCoincident,
    NoContactDetectedByAnyMethod,
    WristNeverCrossedBodyCenter,
}

impl PhaseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseReason::Detected => "detected",
            PhaseReason::NotAnalyzed => "not_analyzed",
            PhaseReason::PrerequisiteNotDetected => "prerequisite_not_detected",
            PhaseReason::InsufficientValidFrames => "insufficient_valid_frames",
            PhaseReason::WristNeverBehindBody => "wrist_never_behind_body",
            PhaseReason::InsufficientBodyRotation => "insufficient_body_rotation",
            PhaseReason::NoBackswingFramesFound => "no_backswing_frames_found",
            PhaseReason::InsufficientVelocity => "insufficient_velocity",
            PhaseReason::NoHipVelocityReversal => "no_hip_velocity_reversal",
            PhaseReason::InsufficientVelocityAndArmNotExtended => {
                "insufficient_velocity_and_arm_not_extended"
            }
            PhaseReason::ArmNotExtended => "arm_not_extended",
            PhaseReason::WristPositionUnclear => "wrist_position_unclear",
            PhaseReason::NoProximalToDistalSequence => "no_proximal_to_distal_sequence",
            PhaseReason::ContactCriteriaNotCoincident => "contact_criteria_not_coincident",
            PhaseReason::NoContactDetectedByAnyMethod => "no_contact_detected_by_any_method",
            PhaseReason::WristNeverCrossedBodyCenter => "wrist_never_crossed_body_center",
        }
    }

    /// Human-readable explanation of the code.
    pub fn describe(&self) -> &'static str {
        match self {
            PhaseReason::Detected => "detected",
            PhaseReason::NotAnalyzed => "not analyzed yet",
            PhaseReason::PrerequisiteNotDetected => "an earlier phase was not detected",
            PhaseReason::InsufficientValidFrames => "too few frames with a tracked pose",
            PhaseReason::WristNeverBehindBody => "the wrist never moved behind the body",
            PhaseReason::InsufficientBodyRotation => {
                "the hips and shoulders never turned far enough while the wrist was back"
            }
            PhaseReason::NoBackswingFramesFound => "no frame with the wrist behind the body",
            PhaseReason::InsufficientVelocity => "the wrist never moved fast enough",
            PhaseReason::NoHipVelocityReversal => {
                "the hips never started rotating forward with the wrist following"
            }
            PhaseReason::InsufficientVelocityAndArmNotExtended => {
                "the wrist was too slow and the arm never extended"
            }
            PhaseReason::ArmNotExtended => "the arm never extended enough",
            PhaseReason::WristPositionUnclear => "the wrist never came in front of the body",
            PhaseReason::NoProximalToDistalSequence => {
                "the wrist never outpaced the elbow (no proximal-to-distal sequence)"
            }
            PhaseReason::ContactCriteriaNotCoincident => {
                "speed, extension and wrist position never lined up on the same frame"
            }
            PhaseReason::NoContactDetectedByAnyMethod => "no contact strategy found a candidate",
            PhaseReason::WristNeverCrossedBodyCenter => {
                "the wrist never finished far enough across the body"
            }
        }
    }
}

impl fmt::Display for PhaseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which contact strategy produced a contact detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMethodUsed {
    VelocityPeak,
    KinematicChain,
    HybridVelocityPeak,
    HybridKinematicChain,
}

impl ContactMethodUsed {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactMethodUsed::VelocityPeak => "velocity_peak",
            ContactMethodUsed::KinematicChain => "kinematic_chain",
            ContactMethodUsed::HybridVelocityPeak => "hybrid_velocity_peak",
            ContactMethodUsed::HybridKinematicChain => "hybrid_kinematic_chain",
        }
    }

    /// The label a hybrid arbitration reports when it adopts this result.
    pub fn via_hybrid(self) -> Self {
        match self {
            ContactMethodUsed::VelocityPeak => ContactMethodUsed::HybridVelocityPeak,
            ContactMethodUsed::KinematicChain => ContactMethodUsed::HybridKinematicChain,
            other => other,
        }
    }
}

/// Kinematic-chain sequencing scores attached to a chain-based contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainScores {
    pub sequencing_quality: f64,
    pub ratio_quality: f64,
    pub elbow_velocity: f64,
    pub shoulder_velocity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactAttributes {
    pub method: ContactMethodUsed,
    pub elbow_angle: f64,
    pub wrist_velocity: f64,
    /// Frame of peak wrist speed before the contact offset was applied.
    pub peak_frame: u32,
    pub peak_velocity: f64,
    pub velocity_score: f64,
    pub angle_score: f64,
    pub chain: Option<ChainScores>,
}

/// Phase-specific measurements recorded at the detected frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhaseAttributes {
    UnitTurn {
        wrist_offset: f64,
        hip_rotation: f64,
        shoulder_rotation: f64,
    },
    Backswing {
        wrist_x: f64,
        depth: f64,
    },
    ForwardSwing {
        wrist_velocity: f64,
        hip_angular_velocity: f64,
    },
    Contact(ContactAttributes),
    FollowThrough {
        wrist_x: f64,
        distance: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseDetection {
    pub frame: u32,
    pub timestamp: f64,
    pub attributes: PhaseAttributes,
}

/// Outcome of one phase detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPhaseResult")]
pub struct PhaseResult {
    phase: SwingPhase,
    detected: bool,
    confidence: f64,
    reason: PhaseReason,
    detection: Option<PhaseDetection>,
}

impl PhaseResult {
    pub fn found(phase: SwingPhase, confidence: f64, detection: PhaseDetection) -> Self {
        Self {
            phase,
            detected: true,
            confidence,
            reason: PhaseReason::Detected,
            detection: Some(detection),
        }
    }

    pub fn missed(phase: SwingPhase, reason: PhaseReason) -> Self {
        Self {
            phase,
            detected: false,
            confidence: 0.0,
            reason,
            detection: None,
        }
    }

    pub fn phase(&self) -> SwingPhase {
        self.phase
    }

    pub fn is_detected(&self) -> bool {
        self.detected
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn reason(&self) -> PhaseReason {
        self.reason
    }

    pub fn detection(&self) -> Option<&PhaseDetection> {
        self.detection.as_ref()
    }

    pub fn frame(&self) -> Option<u32> {
        self.detection.map(|d| d.frame)
    }

    pub fn timestamp(&self) -> Option<f64> {
        self.detection.map(|d| d.timestamp)
    }

    pub fn contact_attributes(&self) -> Option<&ContactAttributes> {
        match self.detection.as_ref().map(|d| &d.attributes) {
            Some(PhaseAttributes::Contact(attributes)) => Some(attributes),
            _ => None,
        }
    }

    /// A detected phase has a frame and the `detected` reason; a missed one
    /// has neither.
    pub fn check_consistency(&self) -> Result<(), ResultError> {
        let detected_reason = self.reason == PhaseReason::Detected;
        if self.detected == self.detection.is_some() && self.detected == detected_reason {
            Ok(())
        } else {
            Err(ResultError::InconsistentPhase(self.phase.as_str()))
        }
    }
}

#[derive(Deserialize)]
struct RawPhaseResult {
    phase: SwingPhase,
    detected: bool,
    confidence: f64,
    reason: PhaseReason,
    #[serde(default)]
    detection: Option<PhaseDetection>,
}

impl TryFrom<RawPhaseResult> for PhaseResult {
    type Error = ResultError;

    fn try_from(raw: RawPhaseResult) -> Result<Self, Self::Error> {
        let result = Self {
            phase: raw.phase,
            detected: raw.detected,
            confidence: raw.confidence,
            reason: raw.reason,
            detection: raw.detection,
        };
        result.check_consistency()?;
        Ok(result)
    }
}
