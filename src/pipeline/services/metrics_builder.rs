use std::ops::Index;
use tracing::debug;

use crate::common::{BodyPoint, LandmarkFrame, LandmarkSet};
use crate::pipeline::services::analysis::AnalyzerConfig;
use crate::pipeline::services::kinematics::{
    angular_velocity, calculate_elbow_angle, calculate_hip_rotation, calculate_knee_bend,
    calculate_shoulder_rotation, calculate_trunk_lean, calculate_upper_arm_angle, linear_velocity,
};
use crate::pipeline::types::FrameMetric;

/// Body center used when either shoulder is missing.
const DEFAULT_BODY_CENTER_X: f64 = 0.5;

/// Per-frame metrics for the valid frames of one video, in order.
///
/// Each analysis owns its sequence; nothing here is shared between runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSequence {
    metrics: Vec<FrameMetric>,
    max_wrist_velocity: f64,
}

impl MetricsSequence {
    /// Wrap already computed metrics, e.g. synthetic sequences.
    pub fn from_metrics(metrics: Vec<FrameMetric>) -> Self {
        let max_wrist_velocity = metrics
            .iter()
            .map(|m| m.wrist_velocity)
            .fold(0.0_f64, f64::max);

        Self {
            metrics,
            max_wrist_velocity,
        }
    }

    /// Keep detected frames only and extract their metrics. Velocities are
    /// taken against the previous valid frame with an elapsed time of 1/fps,
    /// whether or not undetected frames were skipped in between.
    pub fn from_frames(frames: &[LandmarkFrame], fps: f64) -> Self {
        let elapsed = 1.0 / fps;
        let mut metrics = Vec::with_capacity(frames.len());
        let mut previous: Option<(&LandmarkSet, f64, f64)> = None;

        for frame in frames {
            let Some(landmarks) = frame.valid_landmarks() else {
                continue;
            };

            let metric = extract_frame_metric(frame, landmarks, previous, elapsed);
            previous = Some((landmarks, metric.hip_rotation, metric.shoulder_rotation));
            metrics.push(metric);
        }

        debug!(
            total_frames = frames.len(),
            valid_frames = metrics.len(),
            "Built frame metrics"
        );

        Self::from_metrics(metrics)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn as_slice(&self) -> &[FrameMetric] {
        &self.metrics
    }

    pub fn get(&self, index: usize) -> Option<&FrameMetric> {
        self.metrics.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrameMetric> {
        self.metrics.iter()
    }

    pub fn max_wrist_velocity(&self) -> f64 {
        self.max_wrist_velocity
    }

    /// Effective velocity threshold for one analysis run.
    pub fn velocity_threshold(&self, config: &AnalyzerConfig) -> f64 {
        if config.use_adaptive_velocity() {
            let threshold = self.max_wrist_velocity * config.adaptive_velocity_percent();
            debug!(
                max_velocity = self.max_wrist_velocity,
                threshold,
                percent = config.adaptive_velocity_percent(),
                "Adaptive velocity threshold"
            );
            threshold
        } else {
            config.velocity_threshold()
        }
    }
}

impl Index<usize> for MetricsSequence {
    type Output = FrameMetric;

    fn index(&self, index: usize) -> &Self::Output {
        &self.metrics[index]
    }
}

impl<'a> IntoIterator for &'a MetricsSequence {
    type Item = &'a FrameMetric;
    type IntoIter = std::slice::Iter<'a, FrameMetric>;

    fn into_iter(self) -> Self::IntoIter {
        self.metrics.iter()
    }
}

fn extract_frame_metric(
    frame: &LandmarkFrame,
    landmarks: &LandmarkSet,
    previous: Option<(&LandmarkSet, f64, f64)>,
    elapsed: f64,
) -> FrameMetric {
    let body_center_x = match (
        landmarks.get(BodyPoint::LeftShoulder),
        landmarks.get(BodyPoint::RightShoulder),
    ) {
        (Some(left), Some(right)) => (left.x + right.x) / 2.0,
        _ => DEFAULT_BODY_CENTER_X,
    };

    let wrist = landmarks.get(BodyPoint::RightWrist);
    let wrist_x = wrist.map_or(body_center_x, |w| w.x);
    let wrist_y = wrist.map_or(0.0, |w| w.y);

    let hip_rotation = calculate_hip_rotation(landmarks);
    let shoulder_rotation = calculate_shoulder_rotation(landmarks);

    let mut metric = FrameMetric {
        frame_number: frame.frame_number,
        timestamp: frame.timestamp,
        elbow_angle: calculate_elbow_angle(landmarks),
        wrist_x,
        wrist_y,
        body_center_x,
        wrist_behind_body: wrist_x < body_center_x,
        hip_rotation,
        shoulder_rotation,
        knee_bend: calculate_knee_bend(landmarks),
        trunk_lean: calculate_trunk_lean(landmarks),
        upper_arm_angle: calculate_upper_arm_angle(landmarks),
        ..FrameMetric::default()
    };

    if let Some((prev, prev_hip, prev_shoulder)) = previous {
        let speed = |point: BodyPoint| linear_velocity(landmarks.get(point), prev.get(point), elapsed);

        metric.wrist_velocity = speed(BodyPoint::RightWrist);
        metric.elbow_velocity = speed(BodyPoint::RightElbow);
        metric.shoulder_velocity = speed(BodyPoint::RightShoulder);
        metric.hip_angular_velocity = angular_velocity(hip_rotation, prev_hip, elapsed);
        metric.shoulder_angular_velocity =
            angular_velocity(shoulder_rotation, prev_shoulder, elapsed);
    }

    metric
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Landmark;
    use approx::assert_relative_eq;

    fn pose(wrist_x: f64) -> LandmarkSet {
        LandmarkSet::new()
            .with(BodyPoint::LeftShoulder, Landmark::new(0.4, 0.3, 0.0, 0.9))
            .with(BodyPoint::RightShoulder, Landmark::new(0.6, 0.3, 0.0, 0.9))
            .with(BodyPoint::RightElbow, Landmark::new(0.7, 0.4, 0.0, 0.9))
            .with(BodyPoint::RightWrist, Landmark::new(wrist_x, 0.5, 0.0, 0.9))
    }

    #[test]
    fn skips_undetected_frames() {
        let frames = vec![
            LandmarkFrame::detected(1, 0.0, pose(0.3)),
            LandmarkFrame::missing(2, 0.1),
            LandmarkFrame::detected(3, 0.2, pose(0.5)),
        ];

        let sequence = MetricsSequence::from_frames(&frames, 10.0);

        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence[0].frame_number, 1);
        assert_eq!(sequence[1].frame_number, 3);
    }

    #[test]
    fn velocity_uses_previous_valid_frame_and_one_frame_interval() {
        let frames = vec![
            LandmarkFrame::detected(1, 0.0, pose(0.3)),
            LandmarkFrame::missing(2, 0.1),
            LandmarkFrame::detected(3, 0.2, pose(0.5)),
        ];

        let sequence = MetricsSequence::from_frames(&frames, 10.0);

        assert_eq!(sequence[0].wrist_velocity, 0.0);
        // 0.2 of travel over a single 0.1 s interval, not the 0.2 s actually elapsed
        assert_relative_eq!(sequence[1].wrist_velocity, 2.0, epsilon = 1e-9);
        assert_relative_eq!(sequence.max_wrist_velocity(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn body_center_and_behind_flag() {
        let frames = vec![LandmarkFrame::detected(1, 0.0, pose(0.3))];
        let metric = MetricsSequence::from_frames(&frames, 30.0)[0];

        assert_relative_eq!(metric.body_center_x, 0.5, epsilon = 1e-12);
        assert!(metric.wrist_behind_body);
        assert_relative_eq!(metric.wrist_offset_behind(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn missing_wrist_sits_on_body_center() {
        let landmarks = LandmarkSet::new()
            .with(BodyPoint::LeftShoulder, Landmark::new(0.2, 0.3, 0.0, 0.9))
            .with(BodyPoint::RightShoulder, Landmark::new(0.4, 0.3, 0.0, 0.9));
        let frames = vec![LandmarkFrame::detected(1, 0.0, landmarks)];
        let metric = MetricsSequence::from_frames(&frames, 30.0)[0];

        assert_relative_eq!(metric.wrist_x, metric.body_center_x, epsilon = 1e-12);
        assert!(!metric.wrist_behind_body);
        assert_eq!(metric.elbow_angle, 0.0);
    }

    #[test]
    fn threshold_is_fixed_or_adaptive() {
        let sequence = MetricsSequence::from_metrics(vec![
            FrameMetric {
                wrist_velocity: 1.0,
                ..FrameMetric::default()
            },
            FrameMetric {
                wrist_velocity: 4.0,
                ..FrameMetric::default()
            },
        ]);

        assert_eq!(sequence.velocity_threshold(&AnalyzerConfig::standard()), 0.5);
        assert_relative_eq!(
            sequence.velocity_threshold(&AnalyzerConfig::sensitive()),
            0.4,
            epsilon = 1e-12
        );
    }
}
