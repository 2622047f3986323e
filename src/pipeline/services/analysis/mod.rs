//! Swing phase detection.
//!
//! [`SwingAnalyzer`] runs five detectors in dependency order over a
//! [`MetricsSequence`](crate::pipeline::services::metrics_builder::MetricsSequence).
//! A detector only runs when its predecessor found its phase.

pub mod analyzer;
pub mod config;
pub mod contact;
pub mod core;
pub mod detectors;

pub use analyzer::{AnalysisQuality, AnalysisStatus, SwingAnalysis, SwingAnalyzer};
pub use self::config::{AnalyzerConfig, AnalyzerConfigBuilder, ContactDetectionMethod};
pub use contact::{
    ContactDetector, ContactStrategy, HybridContact, KinematicChainContact, VelocityPeakContact,
};
pub use self::core::{DetectionContext, DetectionOutcome, PhaseCandidate, PhaseDetector};
pub use detectors::{
    BackswingDetector, FollowThroughDetector, ForwardSwingDetector, UnitTurnDetector,
};
