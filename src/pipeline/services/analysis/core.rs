use indexmap::IndexMap;

use super::config::AnalyzerConfig;
use crate::pipeline::services::metrics_builder::MetricsSequence;
use crate::pipeline::types::{
    FrameMetric, PhaseAttributes, PhaseDetection, PhaseReason, PhaseResult, SwingPhase,
};

/// Core detection context that flows through the phase chain
pub struct DetectionContext<'a> {
    metrics: &'a MetricsSequence,
    config: &'a AnalyzerConfig,
    velocity_threshold: f64,
    anchors: IndexMap<SwingPhase, usize>,
}

impl<'a> DetectionContext<'a> {
    pub fn new(
        metrics: &'a MetricsSequence,
        config: &'a AnalyzerConfig,
        velocity_threshold: f64,
    ) -> Self {
        Self {
            metrics,
            config,
            velocity_threshold,
            anchors: IndexMap::new(),
        }
    }

    pub fn metrics(&self) -> &'a MetricsSequence {
        self.metrics
    }

    pub fn config(&self) -> &'a AnalyzerConfig {
        self.config
    }

    /// The threshold computed once for this run.
    pub fn velocity_threshold(&self) -> f64 {
        self.velocity_threshold
    }

    /// Record the metrics index a detected phase resolved to.
    pub fn add_anchor(&mut self, phase: SwingPhase, index: usize) {
        self.anchors.insert(phase, index);
    }

    pub fn anchor(&self, phase: SwingPhase) -> Option<usize> {
        self.anchors.get(&phase).copied()
    }

    /// Metrics from the anchor of `phase` to the end of the sequence, paired
    /// with their absolute indices.
    pub fn scan_from(
        &self,
        phase: SwingPhase,
    ) -> Result<impl Iterator<Item = (usize, &'a FrameMetric)>, PhaseReason> {
        let start = self
            .anchor(phase)
            .ok_or(PhaseReason::PrerequisiteNotDetected)?;
        Ok(self.metrics.iter().enumerate().skip(start))
    }
}

/// A located phase with confidence and reasoning
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseCandidate {
    /// Index into the metrics sequence of the reported frame.
    pub index: usize,
    pub confidence: f64,
    pub attributes: PhaseAttributes,
    pub reasoning: String,
}

impl PhaseCandidate {
    pub fn new(index: usize, confidence: f64, attributes: PhaseAttributes, reasoning: String) -> Self {
        Self {
            index,
            confidence,
            attributes,
            reasoning,
        }
    }

    pub fn into_result(self, phase: SwingPhase, metrics: &MetricsSequence) -> PhaseResult {
        let metric = &metrics[self.index];
        PhaseResult::found(
            phase,
            self.confidence,
            PhaseDetection {
                frame: metric.frame_number,
                timestamp: metric.timestamp,
                attributes: self.attributes,
            },
        )
    }
}

pub type DetectionOutcome = Result<PhaseCandidate, PhaseReason>;

/// One stage of the phase chain
pub trait PhaseDetector: Send + Sync {
    fn detect(&self, context: &DetectionContext<'_>) -> DetectionOutcome;
    fn phase(&self) -> SwingPhase;
    fn name(&self) -> &'static str;
}

/// How well a speed clears the threshold, saturating at twice the threshold.
pub fn velocity_adequacy(velocity: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return 1.0;
    }
    (velocity / (2.0 * threshold)).clamp(0.0, 1.0)
}

/// How extended the arm is, saturating 30 degrees past the minimum.
pub fn angle_adequacy(elbow_angle: f64, contact_angle_min: f64) -> f64 {
    (elbow_angle / (contact_angle_min + 30.0)).clamp(0.0, 1.0)
}

/// 0.5 just above threshold, 1.0 from three times the threshold.
pub fn forward_swing_confidence(velocity: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return 1.0;
    }
    (0.5 + 0.5 * (velocity - threshold) / (2.0 * threshold)).clamp(0.0, 1.0)
}

/// Index of the first maximum of `key` over `items`.
pub fn first_max_by<'a, T, I, F>(items: I, key: F) -> Option<(usize, &'a T)>
where
    I: IntoIterator<Item = (usize, &'a T)>,
    F: Fn(&T) -> f64,
{
    items.into_iter().fold(None, |best, (index, item)| match best {
        Some((_, current)) if key(item) <= key(current) => best,
        _ => Some((index, item)),
    })
}
