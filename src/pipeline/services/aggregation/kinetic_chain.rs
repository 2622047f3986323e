//! Proximal-to-distal sequencing of segment velocity peaks.

use crate::pipeline::services::metrics_builder::MetricsSequence;
use crate::pipeline::types::{
    ChainLag, ChainSegment, FrameMetric, KineticChainMetrics, PeakMeasurement,
    PeakVelocitySequence,
};

fn segment_velocity(segment: ChainSegment, m: &FrameMetric) -> f64 {
    match segment {
        ChainSegment::Hip => m.hip_angular_velocity,
        ChainSegment::Shoulder => m.shoulder_angular_velocity,
        ChainSegment::Elbow => m.elbow_velocity,
        ChainSegment::Wrist => m.wrist_velocity,
    }
}

fn segment_peak(metrics: &MetricsSequence, segment: ChainSegment) -> Option<PeakMeasurement> {
    let mut best: Option<PeakMeasurement> = None;
    for m in metrics {
        let value = segment_velocity(segment, m);
        if best.map_or(true, |b| value > b.value) {
            best = Some(PeakMeasurement {
                value,
                frame: m.frame_number,
                timestamp: m.timestamp,
            });
        }
    }
    best
}

/// 1.0 when the peak timestamps are non-decreasing from hip to wrist,
/// otherwise the share of adjacent pairs that are in order.
pub fn ordering_confidence(timestamps: [f64; 4]) -> f64 {
    let ordered = timestamps.windows(2).filter(|pair| pair[0] <= pair[1]).count();
    if ordered == 3 {
        1.0
    } else {
        ordered as f64 / 3.0
    }
}

/// Each segment's velocity peak over the whole sequence, independent of the
/// detected phases.
pub fn compute_kinetic_chain_metrics(metrics: &MetricsSequence) -> KineticChainMetrics {
    let peaks = (
        segment_peak(metrics, ChainSegment::Hip),
        segment_peak(metrics, ChainSegment::Shoulder),
        segment_peak(metrics, ChainSegment::Elbow),
        segment_peak(metrics, ChainSegment::Wrist),
    );

    let (Some(hip), Some(shoulder), Some(elbow), Some(wrist)) = peaks else {
        return KineticChainMetrics::default();
    };

    let sequence = PeakVelocitySequence {
        hip,
        shoulder,
        elbow,
        wrist,
    };
    let chain_lag = ChainLag {
        hip_to_shoulder: shoulder.timestamp - hip.timestamp,
        shoulder_to_elbow: elbow.timestamp - shoulder.timestamp,
        elbow_to_wrist: wrist.timestamp - elbow.timestamp,
    };

    KineticChainMetrics {
        peak_velocity_sequence: Some(sequence),
        chain_lag: Some(chain_lag),
        confidence: Some(ordering_confidence(sequence.timestamps())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ascending_peaks_are_fully_ordered() {
        assert_eq!(ordering_confidence([0.1, 0.2, 0.3, 0.4]), 1.0);
        assert_eq!(ordering_confidence([0.1, 0.1, 0.1, 0.1]), 1.0);
    }

    #[test]
    fn one_swapped_pair_costs_a_third() {
        assert_eq!(ordering_confidence([0.2, 0.1, 0.3, 0.4]), 2.0 / 3.0);
        assert_eq!(ordering_confidence([0.1, 0.3, 0.2, 0.4]), 2.0 / 3.0);
        assert_eq!(ordering_confidence([0.1, 0.2, 0.4, 0.3]), 2.0 / 3.0);
    }

    #[test]
    fn peaks_and_lags_follow_each_segment() {
        let frames = (0..5)
            .map(|i| {
                let bump = |peak: usize| if i == peak { 10.0 } else { 1.0 };
                FrameMetric {
                    frame_number: i as u32,
                    timestamp: i as f64 * 0.05,
                    hip_angular_velocity: bump(0),
                    shoulder_angular_velocity: bump(1),
                    elbow_velocity: bump(2),
                    wrist_velocity: bump(4),
                    ..FrameMetric::default()
                }
            })
            .collect();
        let chain = compute_kinetic_chain_metrics(&MetricsSequence::from_metrics(frames));

        let sequence = chain.peak_velocity_sequence.unwrap();
        assert_eq!(sequence.hip.frame, 0);
        assert_eq!(sequence.wrist.frame, 4);

        let lag = chain.chain_lag.unwrap();
        assert_relative_eq!(lag.hip_to_shoulder, 0.05, epsilon = 1e-9);
        assert_relative_eq!(lag.elbow_to_wrist, 0.10, epsilon = 1e-9);
        assert_eq!(chain.confidence, Some(1.0));
    }

    #[test]
    fn empty_sequence_has_no_chain() {
        assert_eq!(
            compute_kinetic_chain_metrics(&MetricsSequence::default()),
            KineticChainMetrics::default()
        );
    }
}
