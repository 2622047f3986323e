//! Contact detection strategies.
//!
//! Contact is searched for in a window that opens at the forward-swing
//! start. The strategy that picks the frame is chosen by configuration; the
//! hybrid strategy runs the other two and keeps the more confident result.

use std::ops::Range;
use tracing::debug;

use super::config::ContactDetectionMethod;
use super::core::{
    angle_adequacy, first_max_by, velocity_adequacy, DetectionContext, DetectionOutcome,
    PhaseCandidate, PhaseDetector,
};
use crate::pipeline::types::{
    ChainScores, ContactAttributes, ContactMethodUsed, FrameMetric, PhaseAttributes, PhaseReason,
    SwingPhase,
};

/// Fraction of the velocity threshold the elbow must reach.
const CHAIN_ELBOW_VELOCITY_RATIO: f64 = 0.6;
/// Wrist-minus-elbow speed gap at which sequencing quality saturates.
const SEQUENCING_FULL_GAP: f64 = 0.5;
const TARGET_SHOULDER_ELBOW_RATIO: f64 = 0.6;
const TARGET_ELBOW_WRIST_RATIO: f64 = 0.7;

/// A way of choosing the contact frame inside the search window
pub trait ContactStrategy: Send + Sync {
    fn locate(&self, context: &DetectionContext<'_>, window: Range<usize>) -> DetectionOutcome;
    fn name(&self) -> &'static str;
}

/// Per-frame contact predicates, evaluated once per window frame.
struct ContactChecks {
    extended: bool,
    fast: bool,
    in_front: bool,
}

impl ContactChecks {
    fn evaluate(m: &FrameMetric, context: &DetectionContext<'_>) -> Self {
        Self {
            extended: m.elbow_angle > context.config().contact_angle_min(),
            fast: m.wrist_velocity > context.velocity_threshold(),
            in_front: !m.wrist_behind_body,
        }
    }

    fn all(&self) -> bool {
        self.extended && self.fast && self.in_front
    }
}

/// Say which predicate never held anywhere in the window.
fn refine_failure<'a>(
    frames: impl Iterator<Item = &'a FrameMetric>,
    context: &DetectionContext<'_>,
) -> PhaseReason {
    let (mut any_fast, mut any_extended, mut any_in_front) = (false, false, false);
    for m in frames {
        let checks = ContactChecks::evaluate(m, context);
        any_fast |= checks.fast;
        any_extended |= checks.extended;
        any_in_front |= checks.in_front;
    }

    match (any_fast, any_extended, any_in_front) {
        (false, false, _) => PhaseReason::InsufficientVelocityAndArmNotExtended,
        (false, true, _) => PhaseReason::InsufficientVelocity,
        (true, false, _) => PhaseReason::ArmNotExtended,
        (true, true, false) => PhaseReason::WristPositionUnclear,
        (true, true, true) => PhaseReason::ContactCriteriaNotCoincident,
    }
}

/// Shift the peak forward by the configured offset, clamped to the sequence.
fn offset_index(context: &DetectionContext<'_>, peak_index: usize) -> usize {
    let last = context.metrics().len().saturating_sub(1);
    (peak_index + context.config().contact_frame_offset()).min(last)
}

fn contact_candidate(
    context: &DetectionContext<'_>,
    peak_index: usize,
    confidence: f64,
    method: ContactMethodUsed,
    chain: Option<ChainScores>,
) -> PhaseCandidate {
    let metrics = context.metrics();
    let peak = &metrics[peak_index];
    let index = offset_index(context, peak_index);
    let reported = &metrics[index];

    let attributes = ContactAttributes {
        method,
        elbow_angle: reported.elbow_angle,
        wrist_velocity: reported.wrist_velocity,
        peak_frame: peak.frame_number,
        peak_velocity: peak.wrist_velocity,
        velocity_score: velocity_adequacy(peak.wrist_velocity, context.velocity_threshold()),
        angle_score: angle_adequacy(peak.elbow_angle, context.config().contact_angle_min()),
        chain,
    };

    PhaseCandidate::new(
        index,
        confidence,
        PhaseAttributes::Contact(attributes),
        format!(
            "Contact ({}): peak {:.3} at frame {}, reported frame {}",
            method.as_str(),
            peak.wrist_velocity,
            peak.frame_number,
            reported.frame_number
        ),
    )
}

/// Peak wrist speed among frames that are fast, extended and in front
pub struct VelocityPeakContact;

impl ContactStrategy for VelocityPeakContact {
    fn locate(&self, context: &DetectionContext<'_>, window: Range<usize>) -> DetectionOutcome {
        let frames = &context.metrics().as_slice()[window.clone()];
        let candidates = frames
            .iter()
            .enumerate()
            .map(|(offset, m)| (window.start + offset, m))
            .filter(|(_, m)| ContactChecks::evaluate(m, context).all());

        let Some((peak_index, peak)) = first_max_by(candidates, |m| m.wrist_velocity) else {
            return Err(refine_failure(frames.iter(), context));
        };

        let velocity_score = velocity_adequacy(peak.wrist_velocity, context.velocity_threshold());
        let angle_score = angle_adequacy(peak.elbow_angle, context.config().contact_angle_min());

        Ok(contact_candidate(
            context,
            peak_index,
            (velocity_score + angle_score) / 2.0,
            ContactMethodUsed::VelocityPeak,
            None,
        ))
    }

    fn name(&self) -> &'static str {
        "VelocityPeakContact"
    }
}

/// Velocity-peak candidates that also show the elbow leading the wrist
pub struct KinematicChainContact;

impl KinematicChainContact {
    fn sequenced(m: &FrameMetric, threshold: f64) -> bool {
        m.elbow_velocity > CHAIN_ELBOW_VELOCITY_RATIO * threshold
            && m.wrist_velocity > m.elbow_velocity
    }

    /// Score closeness of a ratio to its target, 1.0 on target.
    fn ratio_score(ratio: f64, target: f64) -> f64 {
        (1.0 - (ratio - target).abs() / target).max(0.0)
    }

    pub fn chain_scores(m: &FrameMetric) -> ChainScores {
        let gap = m.wrist_velocity - m.elbow_velocity;
        let sequencing_quality = (gap.min(SEQUENCING_FULL_GAP) / SEQUENCING_FULL_GAP).max(0.0);

        let shoulder_elbow = if m.elbow_velocity > 0.0 {
            Self::ratio_score(
                m.shoulder_velocity / m.elbow_velocity,
                TARGET_SHOULDER_ELBOW_RATIO,
            )
        } else {
            0.0
        };
        let elbow_wrist = if m.wrist_velocity > 0.0 {
            Self::ratio_score(m.elbow_velocity / m.wrist_velocity, TARGET_ELBOW_WRIST_RATIO)
        } else {
            0.0
        };

        ChainScores {
            sequencing_quality,
            ratio_quality: (shoulder_elbow + elbow_wrist) / 2.0,
            elbow_velocity: m.elbow_velocity,
            shoulder_velocity: m.shoulder_velocity,
        }
    }
}

impl ContactStrategy for KinematicChainContact {
    fn locate(&self, context: &DetectionContext<'_>, window: Range<usize>) -> DetectionOutcome {
        let threshold = context.velocity_threshold();
        let frames = &context.metrics().as_slice()[window.clone()];
        let base: Vec<(usize, &FrameMetric)> = frames
            .iter()
            .enumerate()
            .map(|(offset, m)| (window.start + offset, m))
            .filter(|(_, m)| ContactChecks::evaluate(m, context).all())
            .collect();

        if base.is_empty() {
            return Err(refine_failure(frames.iter(), context));
        }

        let candidates = base
            .into_iter()
            .filter(|(_, m)| Self::sequenced(m, threshold));
        let (peak_index, peak) = first_max_by(candidates, |m| m.wrist_velocity)
            .ok_or(PhaseReason::NoProximalToDistalSequence)?;

        let chain = Self::chain_scores(peak);
        let confidence = (chain.sequencing_quality
            + chain.ratio_quality
            + velocity_adequacy(peak.wrist_velocity, threshold)
            + angle_adequacy(peak.elbow_angle, context.config().contact_angle_min()))
            / 4.0;

        Ok(contact_candidate(
            context,
            peak_index,
            confidence,
            ContactMethodUsed::KinematicChain,
            Some(chain),
        ))
    }

    fn name(&self) -> &'static str {
        "KinematicChainContact"
    }
}

/// Runs both strategies and keeps the more confident one. Ties go to the
/// velocity peak.
pub struct HybridContact {
    velocity: Box<dyn ContactStrategy>,
    chain: Box<dyn ContactStrategy>,
}

impl Default for HybridContact {
    fn default() -> Self {
        Self::new(Box::new(VelocityPeakContact), Box::new(KinematicChainContact))
    }
}

impl HybridContact {
    pub fn new(velocity: Box<dyn ContactStrategy>, chain: Box<dyn ContactStrategy>) -> Self {
        Self { velocity, chain }
    }

    fn relabel(mut candidate: PhaseCandidate) -> PhaseCandidate {
        if let PhaseAttributes::Contact(attributes) = &mut candidate.attributes {
            attributes.method = attributes.method.via_hybrid();
        }
        candidate.reasoning = format!("Hybrid: {}", candidate.reasoning);
        candidate
    }
}

impl ContactStrategy for HybridContact {
    fn locate(&self, context: &DetectionContext<'_>, window: Range<usize>) -> DetectionOutcome {
        let velocity = self.velocity.locate(context, window.clone());
        let chain = self.chain.locate(context, window);

        debug!(
            velocity = ?velocity.as_ref().map(|c| c.confidence),
            chain = ?chain.as_ref().map(|c| c.confidence),
            "Hybrid contact arbitration"
        );

        let chosen = match (velocity, chain) {
            (Ok(v), Ok(c)) if c.confidence > v.confidence => c,
            (Ok(v), _) => v,
            (Err(_), Ok(c)) => c,
            (Err(_), Err(_)) => return Err(PhaseReason::NoContactDetectedByAnyMethod),
        };

        Ok(Self::relabel(chosen))
    }

    fn name(&self) -> &'static str {
        "HybridContact"
    }
}

/// Contact detector - delegates the window search to a strategy
pub struct ContactDetector {
    strategy: Box<dyn ContactStrategy>,
}

impl ContactDetector {
    pub fn for_method(method: ContactDetectionMethod) -> Self {
        let strategy: Box<dyn ContactStrategy> = match method {
            ContactDetectionMethod::VelocityPeak => Box::new(VelocityPeakContact),
            ContactDetectionMethod::KinematicChain => Box::new(KinematicChainContact),
            ContactDetectionMethod::Hybrid => Box::new(HybridContact::default()),
        };
        Self::with_strategy(strategy)
    }

    pub fn with_strategy(strategy: Box<dyn ContactStrategy>) -> Self {
        Self { strategy }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }
}

impl PhaseDetector for ContactDetector {
    fn detect(&self, context: &DetectionContext<'_>) -> DetectionOutcome {
        let start = context
            .anchor(SwingPhase::ForwardSwing)
            .ok_or(PhaseReason::PrerequisiteNotDetected)?;
        let end = (start + context.config().forward_swing_search_window())
            .min(context.metrics().len());

        self.strategy.locate(context, start..end)
    }

    fn phase(&self) -> SwingPhase {
        SwingPhase::Contact
    }

    fn name(&self) -> &'static str {
        "ContactDetector"
    }
}
