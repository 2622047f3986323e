use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::config::AnalyzerConfig;
use super::contact::ContactDetector;
use super::core::{DetectionContext, PhaseDetector};
use super::detectors::{
    BackswingDetector, FollowThroughDetector, ForwardSwingDetector, UnitTurnDetector,
};
use crate::common::LandmarkFrame;
use crate::error::{InputError, SwingError};
use crate::pipeline::services::aggregation::{
    compute_engine_metrics, compute_kinetic_chain_metrics, compute_tempo_metrics,
};
use crate::pipeline::services::metrics_builder::MetricsSequence;
use crate::pipeline::types::{AnalysisResult, PhaseReason, PhaseResult, SwingPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Complete,
    InsufficientData,
}

/// Pipeline-side quality score. Undetected phases count as zero confidence,
/// unlike [`AnalysisResult::overall_confidence`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisQuality {
    pub overall_score: f64,
    pub phases_detected: usize,
    pub total_phases: usize,
    pub detection_rate: f64,
}

impl AnalysisQuality {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let total_phases = SwingPhase::ALL.len();
        let phases_detected = result.phases_detected_count();
        let confidence_sum: f64 = result
            .phases()
            .map(|p| if p.is_detected() { p.confidence() } else { 0.0 })
            .sum();

        Self {
            overall_score: confidence_sum / total_phases as f64,
            phases_detected,
            total_phases,
            detection_rate: phases_detected as f64 / total_phases as f64,
        }
    }
}

/// Everything one analysis run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwingAnalysis {
    pub status: AnalysisStatus,
    /// Valid frames the analysis had to work with.
    pub frames_detected: usize,
    /// Effective threshold, absent when the run stopped before computing it.
    pub velocity_threshold: Option<f64>,
    pub quality: AnalysisQuality,
    pub result: AnalysisResult,
}

impl SwingAnalysis {
    pub fn is_complete(&self) -> bool {
        self.status == AnalysisStatus::Complete
    }
}

/// Runs the phase chain and the derived-metrics pass over one video.
///
/// Holds only immutable configuration; one analyzer can serve any number of
/// concurrent analyses.
pub struct SwingAnalyzer {
    config: AnalyzerConfig,
    detectors: Vec<Box<dyn PhaseDetector>>,
}

impl Default for SwingAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl SwingAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let detectors: Vec<Box<dyn PhaseDetector>> = vec![
            Box::new(UnitTurnDetector),
            Box::new(BackswingDetector),
            Box::new(ForwardSwingDetector),
            Box::new(ContactDetector::for_method(config.contact_detection_method())),
            Box::new(FollowThroughDetector),
        ];

        Self { config, detectors }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze raw tracker frames.
    #[instrument(skip(self, frames), fields(frames = frames.len()))]
    pub fn analyze(&self, frames: &[LandmarkFrame], fps: f64) -> Result<SwingAnalysis, SwingError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(InputError::InvalidFps(fps).into());
        }

        let metrics = MetricsSequence::from_frames(frames, fps);
        self.analyze_metrics(&metrics)
    }

    /// Analyze an already built metrics sequence.
    pub fn analyze_metrics(&self, metrics: &MetricsSequence) -> Result<SwingAnalysis, SwingError> {
        let frames_detected = metrics.len();

        if frames_detected < self.config.min_valid_frames() {
            info!(
                frames_detected,
                required = self.config.min_valid_frames(),
                "Not enough frames with pose detected"
            );
            return Self::insufficient_data(frames_detected);
        }

        let velocity_threshold = metrics.velocity_threshold(&self.config);
        let mut result = AnalysisResult::new();
        self.detect_phases(metrics, velocity_threshold, &mut result)?;

        result.set_engine_metrics(compute_engine_metrics(metrics))?;
        result.set_tempo_metrics(compute_tempo_metrics(&result))?;
        result.set_kinetic_chain_metrics(compute_kinetic_chain_metrics(metrics))?;

        let quality = AnalysisQuality::from_result(&result);
        info!(
            frames_detected,
            velocity_threshold,
            phases_detected = quality.phases_detected,
            overall_score = quality.overall_score,
            "Swing analysis complete"
        );

        Ok(SwingAnalysis {
            status: AnalysisStatus::Complete,
            frames_detected,
            velocity_threshold: Some(velocity_threshold),
            quality,
            result,
        })
    }

    fn detect_phases(
        &self,
        metrics: &MetricsSequence,
        velocity_threshold: f64,
        result: &mut AnalysisResult,
    ) -> Result<(), SwingError> {
        let mut context = DetectionContext::new(metrics, &self.config, velocity_threshold);
        let mut chain_broken = false;

        for detector in &self.detectors {
            let phase = detector.phase();
            if chain_broken {
                result.set_phase(PhaseResult::missed(
                    phase,
                    PhaseReason::PrerequisiteNotDetected,
                ))?;
                continue;
            }

            match detector.detect(&context) {
                Ok(candidate) => {
                    debug!(
                        detector = detector.name(),
                        confidence = candidate.confidence,
                        "{}",
                        candidate.reasoning
                    );
                    context.add_anchor(phase, candidate.index);
                    result.set_phase(candidate.into_result(phase, metrics))?;
                }
                Err(reason) => {
                    debug!(detector = detector.name(), %reason, "Phase not detected");
                    result.set_phase(PhaseResult::missed(phase, reason))?;
                    chain_broken = true;
                }
            }
        }

        Ok(())
    }

    fn insufficient_data(frames_detected: usize) -> Result<SwingAnalysis, SwingError> {
        let mut result = AnalysisResult::new();
        for phase in SwingPhase::ALL {
            result.set_phase(PhaseResult::missed(
                phase,
                PhaseReason::InsufficientValidFrames,
            ))?;
        }

        Ok(SwingAnalysis {
            status: AnalysisStatus::InsufficientData,
            frames_detected,
            velocity_threshold: None,
            quality: AnalysisQuality::from_result(&result),
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{BodyPoint, Landmark, LandmarkSet};
    use crate::pipeline::services::analysis::ContactDetectionMethod;
    use crate::pipeline::types::{ContactMethodUsed, FrameMetric};
    use approx::assert_relative_eq;

    fn metric(i: usize, wrist_x: f64, wrist_velocity: f64) -> FrameMetric {
        FrameMetric {
            frame_number: i as u32 + 1,
            timestamp: i as f64 / 30.0,
            wrist_x,
            body_center_x: 0.5,
            wrist_behind_body: wrist_x < 0.5,
            wrist_velocity,
            elbow_angle: 150.0,
            ..FrameMetric::default()
        }
    }

    /// Wrist goes back, loads, then accelerates through a clean spike and
    /// finishes across the body.
    fn full_swing() -> MetricsSequence {
        let path = [
            (0.55, 0.0),
            (0.45, 0.1),
            (0.35, 0.1),
            (0.30, 0.1),
            (0.32, 0.1),
            (0.40, 0.4),
            (0.52, 0.8),
            (0.56, 1.2),
            (0.58, 1.6),
            (0.60, 2.0),
            (0.62, 1.6),
            (0.66, 1.2),
            (0.70, 0.8),
            (0.75, 0.4),
            (0.78, 0.2),
        ];
        MetricsSequence::from_metrics(
            path.iter()
                .enumerate()
                .map(|(i, (x, v))| metric(i, *x, *v))
                .collect(),
        )
    }

    fn config(method: ContactDetectionMethod) -> AnalyzerConfig {
        AnalyzerConfig::builder()
            .with_contact_angle_min(100.0)
            .with_contact_detection_method(method)
            .build()
            .unwrap()
    }

    #[test]
    fn detects_every_phase_of_a_clean_swing() {
        let analyzer = SwingAnalyzer::new(config(ContactDetectionMethod::VelocityPeak));
        let analysis = analyzer.analyze_metrics(&full_swing()).unwrap();
        let result = &analysis.result;

        assert!(analysis.is_complete());
        assert_eq!(analysis.velocity_threshold, Some(0.5));
        assert_eq!(result.phases_detected_count(), 5);

        let frame = |phase| result.phase(phase).and_then(|p| p.frame());
        assert_eq!(frame(SwingPhase::UnitTurn), Some(2));
        assert_eq!(frame(SwingPhase::Backswing), Some(4));
        assert_eq!(frame(SwingPhase::ForwardSwing), Some(7));
        // Peak at frame 10, shifted by three
        assert_eq!(frame(SwingPhase::Contact), Some(13));
        assert_eq!(frame(SwingPhase::FollowThrough), Some(13));

        let contact = result.phase(SwingPhase::Contact).copied().unwrap();
        assert!(contact.confidence() > 0.9);
        assert_eq!(contact.contact_attributes().map(|a| a.peak_frame), Some(10));

        let tempo = result.tempo();
        assert_relative_eq!(tempo.backswing_duration.unwrap(), 5.0 / 30.0, epsilon = 1e-9);
        assert_relative_eq!(tempo.forward_swing_duration.unwrap(), 6.0 / 30.0, epsilon = 1e-9);
        assert!(result.kinetic_chain().confidence.is_some());
        assert_eq!(analysis.quality.phases_detected, 5);
    }

    /// The clean swing with the body rotating: hips and shoulders coil on the
    /// way back, the hips fire first on the way through and the elbow leads
    /// the wrist.
    fn rotating_swing() -> MetricsSequence {
        let rotations = [
            (0.0, 0.0),
            (-5.0, -10.0),
            (-20.0, -45.0),
            (-30.0, -60.0),
            (-25.0, -50.0),
            (-10.0, -30.0),
        ];
        let metrics = full_swing()
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let (hip_rotation, shoulder_rotation) =
                    rotations.get(i).copied().unwrap_or((0.0, 0.0));
                let hip_angular_velocity = match i {
                    5 => 45.0,
                    6 => 60.0,
                    _ => 0.0,
                };
                let elbow_velocity = 0.6 * m.wrist_velocity;
                FrameMetric {
                    hip_rotation,
                    shoulder_rotation,
                    hip_angular_velocity,
                    elbow_velocity,
                    shoulder_velocity: 0.6 * elbow_velocity,
                    ..*m
                }
            })
            .collect();
        MetricsSequence::from_metrics(metrics)
    }

    #[test]
    fn kinematic_chain_mode_detects_every_phase_in_order() {
        let config = AnalyzerConfig::builder()
            .with_contact_angle_min(100.0)
            .with_kinematic_chain_mode(true)
            .with_contact_detection_method(ContactDetectionMethod::KinematicChain)
            .build()
            .unwrap();
        let analysis = SwingAnalyzer::new(config)
            .analyze_metrics(&rotating_swing())
            .unwrap();
        let result = &analysis.result;

        assert!(analysis.is_complete());
        assert_eq!(result.phases_detected_count(), 5);

        let frames: Vec<u32> = SwingPhase::ALL
            .iter()
            .map(|phase| result.phase(*phase).and_then(|p| p.frame()).unwrap())
            .collect();
        // The wrist is behind at frame 2 but the body has not turned yet
        assert_eq!(frames, vec![3, 4, 6, 13, 13]);
        assert!(frames.windows(2).all(|w| w[0] <= w[1]));

        let forward = result.phase(SwingPhase::ForwardSwing).copied().unwrap();
        assert_relative_eq!(forward.confidence(), 0.5 * 0.75 + 0.5 * 0.8, epsilon = 1e-9);

        let contact = result.phase(SwingPhase::Contact).copied().unwrap();
        let attributes = contact.contact_attributes().unwrap();
        assert_eq!(attributes.method, ContactMethodUsed::KinematicChain);
        assert_eq!(attributes.peak_frame, 10);
        assert!(contact.confidence() > 0.9);
    }

    #[test]
    fn wrist_never_behind_breaks_the_whole_chain() {
        let metrics = MetricsSequence::from_metrics(
            (0..12).map(|i| metric(i, 0.6, 1.0)).collect(),
        );
        let analysis = SwingAnalyzer::default().analyze_metrics(&metrics).unwrap();
        let result = &analysis.result;

        assert_eq!(result.phases_detected_count(), 0);
        assert_eq!(
            result.phase(SwingPhase::UnitTurn).map(|p| p.reason()),
            Some(PhaseReason::WristNeverBehindBody)
        );
        for phase in &SwingPhase::ALL[1..] {
            assert_eq!(
                result.phase(*phase).map(|p| p.reason()),
                Some(PhaseReason::PrerequisiteNotDetected)
            );
        }
        assert_eq!(analysis.quality.overall_score, 0.0);
    }

    #[test]
    fn later_phases_follow_a_missing_prerequisite() {
        let mut metrics: Vec<FrameMetric> = full_swing().iter().copied().collect();
        for m in &mut metrics {
            m.elbow_angle = 90.0;
        }
        let analysis = SwingAnalyzer::new(config(ContactDetectionMethod::VelocityPeak))
            .analyze_metrics(&MetricsSequence::from_metrics(metrics))
            .unwrap();
        let result = &analysis.result;

        assert_eq!(result.phases_detected_count(), 3);
        assert_eq!(
            result.phase(SwingPhase::Contact).map(|p| p.reason()),
            Some(PhaseReason::ArmNotExtended)
        );
        assert_eq!(
            result.phase(SwingPhase::FollowThrough).map(|p| p.reason()),
            Some(PhaseReason::PrerequisiteNotDetected)
        );
        assert_eq!(result.tempo().forward_swing_duration, None);
        assert!(analysis.quality.overall_score < result.overall_confidence());
    }

    #[test]
    fn too_few_frames_is_reported_not_raised() {
        let frames: Vec<LandmarkFrame> = (0..3)
            .map(|i| {
                LandmarkFrame::detected(
                    i + 1,
                    i as f64 / 30.0,
                    LandmarkSet::new().with(BodyPoint::RightWrist, Landmark::new(0.5, 0.5, 0.0, 0.9)),
                )
            })
            .collect();

        let analysis = SwingAnalyzer::default().analyze(&frames, 30.0).unwrap();

        assert_eq!(analysis.status, AnalysisStatus::InsufficientData);
        assert_eq!(analysis.frames_detected, 3);
        assert_eq!(analysis.velocity_threshold, None);
        assert_eq!(analysis.result.phases_detected_count(), 0);
        assert!(analysis
            .result
            .phases()
            .all(|p| p.reason() == PhaseReason::InsufficientValidFrames));
    }

    #[test]
    fn rejects_non_positive_fps() {
        let error = SwingAnalyzer::default().analyze(&[], 0.0).unwrap_err();
        assert!(matches!(error, SwingError::Input(InputError::InvalidFps(_))));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let analyzer = SwingAnalyzer::new(config(ContactDetectionMethod::Hybrid));
        let metrics = full_swing();

        let first = analyzer.analyze_metrics(&metrics).unwrap();
        let second = analyzer.analyze_metrics(&metrics).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.result.to_json_pretty().unwrap(),
            second.result.to_json_pretty().unwrap()
        );
    }

    #[test]
    fn hybrid_labels_its_choice() {
        let analyzer = SwingAnalyzer::new(config(ContactDetectionMethod::Hybrid));
        let analysis = analyzer.analyze_metrics(&full_swing()).unwrap();

        let method = analysis
            .result
            .phase(SwingPhase::Contact)
            .and_then(|p| p.contact_attributes().map(|a| a.method));
        assert_eq!(method, Some(ContactMethodUsed::HybridVelocityPeak));
    }

    #[test]
    fn adaptive_threshold_is_computed_once_from_the_peak() {
        let analyzer = SwingAnalyzer::new(AnalyzerConfig::sensitive());
        let analysis = analyzer.analyze_metrics(&full_swing()).unwrap();
        assert_relative_eq!(analysis.velocity_threshold.unwrap(), 0.2, epsilon = 1e-12);
    }
}
