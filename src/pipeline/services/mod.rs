pub mod aggregation;
pub mod analysis;
pub mod kinematics;
pub mod metrics_builder;
pub mod timeline;
pub mod tracking_quality;

pub use analysis::{AnalyzerConfig, SwingAnalyzer};
pub use metrics_builder::MetricsSequence;
pub use timeline::PhaseTimeline;
pub use tracking_quality::TrackingQuality;
