mod analysis_result;
mod derived;
mod frame_metric;
mod phase;

pub use analysis_result::AnalysisResult;
pub use derived::{
    ChainLag, ChainSegment, EngineMetrics, KineticChainMetrics, PeakMeasurement,
    PeakVelocitySequence, TempoMetrics,
};
pub use frame_metric::FrameMetric;
pub use phase::{
    ChainScores, ContactAttributes, ContactMethodUsed, PhaseAttributes, PhaseDetection,
    PhaseReason, PhaseResult, SwingPhase,
};
