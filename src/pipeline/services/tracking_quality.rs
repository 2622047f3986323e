use serde::{Deserialize, Serialize};

use crate::common::LandmarkFrame;

/// Mean landmark visibility above which a frame counts as well tracked.
const HIGH_CONFIDENCE_VISIBILITY: f64 = 0.7;
/// Detection rate below which a video is unlikely to analyze well.
pub const MIN_RELIABLE_DETECTION_RATE: f64 = 0.7;

/// How well the pose tracker followed the player across a video.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackingQuality {
    /// Frames with usable landmarks over all frames.
    pub detection_rate: f64,
    /// Frames with mean visibility above 0.7, over all frames.
    pub high_confidence_rate: f64,
    /// Mean per-frame visibility over detected frames.
    pub average_confidence: f64,
}

impl TrackingQuality {
    pub fn assess(frames: &[LandmarkFrame]) -> Self {
        if frames.is_empty() {
            return Self::default();
        }

        let total = frames.len() as f64;
        let valid: Vec<_> = frames.iter().filter_map(|f| f.valid_landmarks()).collect();
        let detected = valid.len();
        let visibilities: Vec<f64> = valid
            .iter()
            .filter_map(|landmarks| landmarks.mean_visibility())
            .collect();

        let high_confidence = visibilities
            .iter()
            .filter(|v| **v > HIGH_CONFIDENCE_VISIBILITY)
            .count();
        let average_confidence = if visibilities.is_empty() {
            0.0
        } else {
            visibilities.iter().sum::<f64>() / visibilities.len() as f64
        };

        Self {
            detection_rate: detected as f64 / total,
            high_confidence_rate: high_confidence as f64 / total,
            average_confidence,
        }
    }

    pub fn is_reliable(&self) -> bool {
        self.detection_rate >= MIN_RELIABLE_DETECTION_RATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{BodyPoint, Landmark, LandmarkSet};
    use approx::assert_relative_eq;

    fn frame(number: u32, visibility: f64) -> LandmarkFrame {
        LandmarkFrame::detected(
            number,
            number as f64 / 30.0,
            LandmarkSet::new()
                .with(BodyPoint::RightWrist, Landmark::new(0.5, 0.5, 0.0, visibility))
                .with(BodyPoint::RightElbow, Landmark::new(0.5, 0.4, 0.0, visibility)),
        )
    }

    #[test]
    fn rates_are_over_all_frames() {
        let frames = vec![
            frame(1, 0.9),
            frame(2, 0.5),
            LandmarkFrame::missing(3, 0.1),
            LandmarkFrame::missing(4, 0.13),
        ];

        let quality = TrackingQuality::assess(&frames);
        assert_relative_eq!(quality.detection_rate, 0.5);
        assert_relative_eq!(quality.high_confidence_rate, 0.25);
        assert_relative_eq!(quality.average_confidence, 0.7, epsilon = 1e-9);
        assert!(!quality.is_reliable());
    }

    #[test]
    fn detected_frame_without_landmarks_is_not_counted() {
        let mut hollow = frame(2, 0.9);
        hollow.landmarks = None;
        let frames = vec![frame(1, 0.9), hollow];

        let quality = TrackingQuality::assess(&frames);
        assert_relative_eq!(quality.detection_rate, 0.5);
        assert_relative_eq!(quality.average_confidence, 0.9, epsilon = 1e-9);
    }

    #[test]
    fn empty_video_scores_zero() {
        assert_eq!(TrackingQuality::assess(&[]), TrackingQuality::default());
    }
}
