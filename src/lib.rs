//! Tennis swing phase detection from pose-landmark sequences.
//!
//! Frames go through kinematic feature extraction, a five-stage phase chain
//! (unit turn, backswing, forward swing, contact, follow-through) and a
//! derived-metrics pass. [`Coordinator`] runs batches of videos concurrently.

pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod pipeline;

pub use common::{BodyPoint, Landmark, LandmarkDocument, LandmarkFrame, LandmarkSet};
pub use crate::config::Settings;
pub use coordinator::{AnalysisJob, AnalysisReport, Coordinator, CoordinatorBuilder};
pub use error::{ConfigError, InputError, ResultError, SwingError};
pub use pipeline::services::analysis::{
    AnalysisQuality, AnalysisStatus, AnalyzerConfig, AnalyzerConfigBuilder,
    ContactDetectionMethod, SwingAnalysis, SwingAnalyzer,
};
pub use pipeline::services::metrics_builder::MetricsSequence;
pub use pipeline::services::timeline::{PhaseLabel, PhaseTimeline};
pub use pipeline::services::tracking_quality::TrackingQuality;
pub use pipeline::types::{AnalysisResult, PhaseReason, PhaseResult, SwingPhase};
