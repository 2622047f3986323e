use crate::pipeline::services::metrics_builder::MetricsSequence;
use crate::pipeline::types::{EngineMetrics, FrameMetric, PeakMeasurement};

fn peak_of<F>(metrics: &MetricsSequence, key: F) -> Option<PeakMeasurement>
where
    F: Fn(&FrameMetric) -> f64,
{
    metrics
        .iter()
        .fold(None::<(&FrameMetric, f64)>, |best, m| {
            let value = key(m);
            match best {
                Some((_, current)) if value <= current => best,
                _ => Some((m, value)),
            }
        })
        .map(|(m, value)| PeakMeasurement {
            value,
            frame: m.frame_number,
            timestamp: m.timestamp,
        })
}

/// Hip-shoulder separation and the most coiled hip and shoulder rotations.
/// Ties keep the earliest frame. Empty input leaves every field absent.
pub fn compute_engine_metrics(metrics: &MetricsSequence) -> EngineMetrics {
    let most_negative = |key: fn(&FrameMetric) -> f64| {
        peak_of(metrics, |m| -key(m)).map(|peak| PeakMeasurement {
            value: -peak.value,
            ..peak
        })
    };

    EngineMetrics {
        hip_shoulder_separation: peak_of(metrics, FrameMetric::rotation_separation),
        max_shoulder_rotation: most_negative(|m| m.shoulder_rotation),
        max_hip_rotation: most_negative(|m| m.hip_rotation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotations(values: &[(f64, f64)]) -> MetricsSequence {
        MetricsSequence::from_metrics(
            values
                .iter()
                .enumerate()
                .map(|(i, (hip, shoulder))| FrameMetric {
                    frame_number: i as u32 + 1,
                    timestamp: i as f64 * 0.1,
                    hip_rotation: *hip,
                    shoulder_rotation: *shoulder,
                    ..FrameMetric::default()
                })
                .collect(),
        )
    }

    #[test]
    fn finds_separation_and_most_coiled_frames() {
        let metrics = rotations(&[(0.0, 0.0), (-10.0, -40.0), (-25.0, -30.0), (5.0, 10.0)]);
        let engine = compute_engine_metrics(&metrics);

        let separation = engine.hip_shoulder_separation.unwrap();
        assert_eq!(separation.frame, 2);
        assert_eq!(separation.value, 30.0);

        let shoulder = engine.max_shoulder_rotation.unwrap();
        assert_eq!((shoulder.frame, shoulder.value), (2, -40.0));

        let hip = engine.max_hip_rotation.unwrap();
        assert_eq!((hip.frame, hip.value), (3, -25.0));
    }

    #[test]
    fn ties_keep_earliest_frame() {
        let metrics = rotations(&[(-20.0, 0.0), (-20.0, 0.0)]);
        let engine = compute_engine_metrics(&metrics);
        assert_eq!(engine.max_hip_rotation.map(|p| p.frame), Some(1));
        assert_eq!(engine.hip_shoulder_separation.map(|p| p.frame), Some(1));
    }

    #[test]
    fn empty_sequence_has_no_engine_metrics() {
        let engine = compute_engine_metrics(&MetricsSequence::default());
        assert_eq!(engine, EngineMetrics::default());
    }
}
