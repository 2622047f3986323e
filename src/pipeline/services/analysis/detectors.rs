/// Phase detectors for the stages around contact
use super::core::{
    first_max_by, forward_swing_confidence, DetectionContext, DetectionOutcome, PhaseCandidate,
    PhaseDetector,
};
use crate::pipeline::types::{PhaseAttributes, PhaseReason, SwingPhase};

/// Wrist offset behind the body at which unit-turn confidence saturates.
const UNIT_TURN_FULL_OFFSET: f64 = 0.1;
/// Backswing depth at which confidence saturates.
const BACKSWING_FULL_DEPTH: f64 = 0.15;
/// Follow-through distance past body center at which confidence saturates.
const FOLLOW_THROUGH_FULL_DISTANCE: f64 = 0.3;

const MIN_HIP_ROTATION: f64 = 10.0;
const MIN_SHOULDER_ROTATION: f64 = 15.0;
const FULL_SHOULDER_ROTATION: f64 = 45.0;
/// Degrees per second.
const MIN_HIP_ANGULAR_VELOCITY: f64 = 30.0;
const FULL_HIP_ANGULAR_VELOCITY: f64 = 60.0;
/// Fraction of the velocity threshold the wrist must reach when the hips lead.
const CHAIN_WRIST_VELOCITY_RATIO: f64 = 0.5;

/// Confidence that the wrist is clearly behind the body. Non-decreasing in
/// the offset and saturating at 1.0.
pub fn unit_turn_confidence(wrist_offset: f64) -> f64 {
    (wrist_offset / UNIT_TURN_FULL_OFFSET).clamp(0.0, 1.0)
}

/// Unit turn detector - first frame the racket side turns back
pub struct UnitTurnDetector;

impl UnitTurnDetector {
    fn detect_traditional(&self, context: &DetectionContext<'_>) -> DetectionOutcome {
        let behind = context.config().wrist_behind_body_threshold();

        context
            .metrics()
            .iter()
            .enumerate()
            .find(|(_, m)| m.wrist_offset_behind() > behind)
            .map(|(index, m)| {
                let offset = m.wrist_offset_behind();
                PhaseCandidate::new(
                    index,
                    unit_turn_confidence(offset),
                    PhaseAttributes::UnitTurn {
                        wrist_offset: offset,
                        hip_rotation: m.hip_rotation,
                        shoulder_rotation: m.shoulder_rotation,
                    },
                    format!("Unit turn: wrist {:.3} behind body center", offset),
                )
            })
            .ok_or(PhaseReason::WristNeverBehindBody)
    }

    fn detect_kinematic(&self, context: &DetectionContext<'_>) -> DetectionOutcome {
        let behind = context.config().wrist_behind_body_threshold();
        let mut wrist_ever_behind = false;

        for (index, m) in context.metrics().iter().enumerate() {
            let offset = m.wrist_offset_behind();
            if offset <= behind {
                continue;
            }
            wrist_ever_behind = true;

            if m.hip_rotation.abs() > MIN_HIP_ROTATION
                && m.shoulder_rotation.abs() > MIN_SHOULDER_ROTATION
            {
                let rotation_score = (m.shoulder_rotation.abs() / FULL_SHOULDER_ROTATION).min(1.0);
                let confidence = 0.5 * rotation_score + 0.5 * unit_turn_confidence(offset);

                return Ok(PhaseCandidate::new(
                    index,
                    confidence,
                    PhaseAttributes::UnitTurn {
                        wrist_offset: offset,
                        hip_rotation: m.hip_rotation,
                        shoulder_rotation: m.shoulder_rotation,
                    },
                    format!(
                        "Unit turn: hips {:.1}°, shoulders {:.1}°, wrist {:.3} behind",
                        m.hip_rotation, m.shoulder_rotation, offset
                    ),
                ));
            }
        }

        Err(if wrist_ever_behind {
            PhaseReason::InsufficientBodyRotation
        } else {
            PhaseReason::WristNeverBehindBody
        })
    }
}

impl PhaseDetector for UnitTurnDetector {
    fn detect(&self, context: &DetectionContext<'_>) -> DetectionOutcome {
        if context.config().kinematic_chain_mode() {
            self.detect_kinematic(context)
        } else {
            self.detect_traditional(context)
        }
    }

    fn phase(&self) -> SwingPhase {
        SwingPhase::UnitTurn
    }

    fn name(&self) -> &'static str {
        "UnitTurnDetector"
    }
}

/// Max backswing detector - furthest-back wrist position
pub struct BackswingDetector;

impl PhaseDetector for BackswingDetector {
    fn detect(&self, context: &DetectionContext<'_>) -> DetectionOutcome {
        let behind = context.config().wrist_behind_body_threshold();
        let frames = context
            .scan_from(SwingPhase::UnitTurn)?
            .filter(|(_, m)| m.wrist_offset_behind() > behind);

        // Furthest back is the minimum wrist x, i.e. the maximum of its negation
        let (index, m) =
            first_max_by(frames, |m| -m.wrist_x).ok_or(PhaseReason::NoBackswingFramesFound)?;
        let depth = m.wrist_offset_behind();

        Ok(PhaseCandidate::new(
            index,
            (depth / BACKSWING_FULL_DEPTH).clamp(0.0, 1.0),
            PhaseAttributes::Backswing {
                wrist_x: m.wrist_x,
                depth,
            },
            format!("Max backswing: wrist x {:.3}, depth {:.3}", m.wrist_x, depth),
        ))
    }

    fn phase(&self) -> SwingPhase {
        SwingPhase::Backswing
    }

    fn name(&self) -> &'static str {
        "BackswingDetector"
    }
}

/// Forward swing detector - the swing starts moving toward the ball
pub struct ForwardSwingDetector;

impl PhaseDetector for ForwardSwingDetector {
    fn detect(&self, context: &DetectionContext<'_>) -> DetectionOutcome {
        let threshold = context.velocity_threshold();
        let mut frames = context.scan_from(SwingPhase::Backswing)?;

        if context.config().kinematic_chain_mode() {
            let wrist_floor = CHAIN_WRIST_VELOCITY_RATIO * threshold;
            let (index, m) = frames
                .find(|(_, m)| {
                    m.hip_angular_velocity > MIN_HIP_ANGULAR_VELOCITY
                        && m.wrist_velocity > wrist_floor
                })
                .ok_or(PhaseReason::NoHipVelocityReversal)?;

            let hip_score = (m.hip_angular_velocity / FULL_HIP_ANGULAR_VELOCITY).min(1.0);
            let wrist_score = if threshold > 0.0 {
                (m.wrist_velocity / threshold).min(1.0)
            } else {
                1.0
            };

            return Ok(PhaseCandidate::new(
                index,
                0.5 * hip_score + 0.5 * wrist_score,
                PhaseAttributes::ForwardSwing {
                    wrist_velocity: m.wrist_velocity,
                    hip_angular_velocity: m.hip_angular_velocity,
                },
                format!(
                    "Forward swing: hips {:.1}°/s lead, wrist {:.3}",
                    m.hip_angular_velocity, m.wrist_velocity
                ),
            ));
        }

        let (index, m) = frames
            .find(|(_, m)| m.wrist_velocity > threshold)
            .ok_or(PhaseReason::InsufficientVelocity)?;

        Ok(PhaseCandidate::new(
            index,
            forward_swing_confidence(m.wrist_velocity, threshold),
            PhaseAttributes::ForwardSwing {
                wrist_velocity: m.wrist_velocity,
                hip_angular_velocity: m.hip_angular_velocity,
            },
            format!(
                "Forward swing: wrist {:.3} above threshold {:.3}",
                m.wrist_velocity, threshold
            ),
        ))
    }

    fn phase(&self) -> SwingPhase {
        SwingPhase::ForwardSwing
    }

    fn name(&self) -> &'static str {
        "ForwardSwingDetector"
    }
}

/// Follow-through detector - the wrist finishes across the body
pub struct FollowThroughDetector;

impl PhaseDetector for FollowThroughDetector {
    fn detect(&self, context: &DetectionContext<'_>) -> DetectionOutcome {
        let offset = context.config().follow_through_offset();

        let (index, m) = context
            .scan_from(SwingPhase::Contact)?
            .find(|(_, m)| m.wrist_x > m.body_center_x + offset)
            .ok_or(PhaseReason::WristNeverCrossedBodyCenter)?;
        let distance = m.wrist_offset_ahead();

        Ok(PhaseCandidate::new(
            index,
            (distance / FOLLOW_THROUGH_FULL_DISTANCE).clamp(0.0, 1.0),
            PhaseAttributes::FollowThrough {
                wrist_x: m.wrist_x,
                distance,
            },
            format!("Follow-through: wrist {:.3} past body center", distance),
        ))
    }

    fn phase(&self) -> SwingPhase {
        SwingPhase::FollowThrough
    }

    fn name(&self) -> &'static str {
        "FollowThroughDetector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::services::analysis::AnalyzerConfig;
    use crate::pipeline::services::metrics_builder::MetricsSequence;
    use crate::pipeline::types::FrameMetric;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn metric(wrist_x: f64, wrist_velocity: f64) -> FrameMetric {
        FrameMetric {
            wrist_x,
            body_center_x: 0.5,
            wrist_behind_body: wrist_x < 0.5,
            wrist_velocity,
            elbow_angle: 150.0,
            ..FrameMetric::default()
        }
    }

    fn sequence(points: &[(f64, f64)]) -> MetricsSequence {
        MetricsSequence::from_metrics(
            points
                .iter()
                .enumerate()
                .map(|(i, (x, v))| FrameMetric {
                    frame_number: i as u32,
                    timestamp: i as f64 / 30.0,
                    ..metric(*x, *v)
                })
                .collect(),
        )
    }

    #[test]
    fn unit_turn_takes_first_frame_behind() {
        let metrics = sequence(&[(0.55, 0.0), (0.45, 0.0), (0.3, 0.0)]);
        let config = AnalyzerConfig::standard();
        let context = DetectionContext::new(&metrics, &config, 0.5);

        let candidate = UnitTurnDetector.detect(&context).unwrap();
        assert_eq!(candidate.index, 1);
        assert_relative_eq!(candidate.confidence, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn unit_turn_fails_when_wrist_stays_in_front() {
        let metrics = sequence(&[(0.55, 0.0), (0.6, 0.0), (0.5, 0.0)]);
        let config = AnalyzerConfig::standard();
        let context = DetectionContext::new(&metrics, &config, 0.5);

        assert_eq!(
            UnitTurnDetector.detect(&context),
            Err(PhaseReason::WristNeverBehindBody)
        );
    }

    #[test]
    fn kinematic_unit_turn_needs_rotation() {
        let mut frames = vec![metric(0.3, 0.0), metric(0.3, 0.0)];
        frames[1].hip_rotation = -20.0;
        frames[1].shoulder_rotation = -45.0;
        let metrics = MetricsSequence::from_metrics(frames);
        let config = AnalyzerConfig::builder()
            .with_kinematic_chain_mode(true)
            .build()
            .unwrap();
        let context = DetectionContext::new(&metrics, &config, 0.5);

        let candidate = UnitTurnDetector.detect(&context).unwrap();
        assert_eq!(candidate.index, 1);
        assert_relative_eq!(candidate.confidence, 1.0, epsilon = 1e-9);

        let flat = MetricsSequence::from_metrics(vec![metric(0.3, 0.0); 3]);
        let context = DetectionContext::new(&flat, &config, 0.5);
        assert_eq!(
            UnitTurnDetector.detect(&context),
            Err(PhaseReason::InsufficientBodyRotation)
        );
    }

    #[test]
    fn backswing_picks_furthest_back_after_unit_turn() {
        let metrics = sequence(&[(0.2, 0.0), (0.45, 0.0), (0.3, 0.0), (0.3, 0.0), (0.6, 0.0)]);
        let config = AnalyzerConfig::standard();
        let mut context = DetectionContext::new(&metrics, &config, 0.5);
        context.add_anchor(SwingPhase::UnitTurn, 1);

        let candidate = BackswingDetector.detect(&context).unwrap();
        assert_eq!(candidate.index, 2);
        assert_relative_eq!(candidate.confidence, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn forward_swing_requires_velocity_above_threshold() {
        let metrics = sequence(&[(0.3, 0.9), (0.2, 0.1), (0.3, 0.4), (0.4, 1.0)]);
        let config = AnalyzerConfig::standard();
        let mut context = DetectionContext::new(&metrics, &config, 0.5);
        context.add_anchor(SwingPhase::Backswing, 1);

        let candidate = ForwardSwingDetector.detect(&context).unwrap();
        assert_eq!(candidate.index, 3);
        assert_relative_eq!(candidate.confidence, 0.75, epsilon = 1e-9);

        let slow = sequence(&[(0.2, 0.1), (0.3, 0.2)]);
        let mut context = DetectionContext::new(&slow, &config, 0.5);
        context.add_anchor(SwingPhase::Backswing, 0);
        assert_eq!(
            ForwardSwingDetector.detect(&context),
            Err(PhaseReason::InsufficientVelocity)
        );
    }

    #[test]
    fn kinematic_forward_swing_needs_hip_lead() {
        let metrics = sequence(&[(0.2, 0.3), (0.3, 0.4)]);
        let config = AnalyzerConfig::builder()
            .with_kinematic_chain_mode(true)
            .build()
            .unwrap();
        let mut context = DetectionContext::new(&metrics, &config, 0.5);
        context.add_anchor(SwingPhase::Backswing, 0);

        assert_eq!(
            ForwardSwingDetector.detect(&context),
            Err(PhaseReason::NoHipVelocityReversal)
        );
    }

    #[test]
    fn kinematic_forward_swing_blends_hip_and_wrist() {
        let mut frames: Vec<FrameMetric> = [(0.30, 0.1), (0.35, 0.2), (0.40, 0.4), (0.45, 0.3)]
            .iter()
            .map(|(x, v)| metric(*x, *v))
            .collect();
        // Hips fire before the wrist is moving, then the wrist moves without the hips
        frames[1].hip_angular_velocity = 45.0;
        frames[2].hip_angular_velocity = 20.0;
        frames[3].hip_angular_velocity = 45.0;
        let metrics = MetricsSequence::from_metrics(frames);
        let config = AnalyzerConfig::builder()
            .with_kinematic_chain_mode(true)
            .build()
            .unwrap();
        let mut context = DetectionContext::new(&metrics, &config, 0.5);
        context.add_anchor(SwingPhase::Backswing, 0);

        let candidate = ForwardSwingDetector.detect(&context).unwrap();
        assert_eq!(candidate.index, 3);
        assert_relative_eq!(candidate.confidence, 0.5 * 0.75 + 0.5 * 0.6, epsilon = 1e-9);
        assert_eq!(
            candidate.attributes,
            PhaseAttributes::ForwardSwing {
                wrist_velocity: 0.3,
                hip_angular_velocity: 45.0,
            }
        );
    }

    #[test]
    fn follow_through_measures_distance_past_center() {
        let metrics = sequence(&[(0.6, 2.0), (0.7, 1.0), (0.8, 0.5)]);
        let config = AnalyzerConfig::standard();
        let mut context = DetectionContext::new(&metrics, &config, 0.5);
        context.add_anchor(SwingPhase::Contact, 0);

        let candidate = FollowThroughDetector.detect(&context).unwrap();
        assert_eq!(candidate.index, 1);
        assert_relative_eq!(candidate.confidence, 2.0 / 3.0, epsilon = 1e-9);

        let short = sequence(&[(0.6, 2.0), (0.62, 1.0)]);
        let mut context = DetectionContext::new(&short, &config, 0.5);
        context.add_anchor(SwingPhase::Contact, 0);
        assert_eq!(
            FollowThroughDetector.detect(&context),
            Err(PhaseReason::WristNeverCrossedBodyCenter)
        );
    }

    proptest! {
        #[test]
        fn unit_turn_confidence_is_monotonic(a in 0.0f64..0.5, b in 0.0f64..0.5) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(unit_turn_confidence(low) <= unit_turn_confidence(high));
        }

        #[test]
        fn unit_turn_confidence_saturates(offset in 0.1f64..1.0) {
            prop_assert_eq!(unit_turn_confidence(offset), 1.0);
        }
    }
}
