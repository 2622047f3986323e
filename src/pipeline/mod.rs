pub mod services;
pub mod types;

pub use services::{MetricsSequence, SwingAnalyzer};
pub use types::{AnalysisResult, FrameMetric, PhaseResult, SwingPhase};
