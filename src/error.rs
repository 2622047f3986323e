use std::path::PathBuf;

use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum SwingError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Result Error: {0}")]
    Result(#[from] ResultError),
    #[error("Input Error: {0}")]
    Input(#[from] InputError),
}

// Engine configuration errors, raised before any analysis runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("velocity_threshold must be a finite value >= 0, got {0}")]
    VelocityThreshold(f64),
    #[error("contact_angle_min must be within [0, 180] degrees, got {0}")]
    ContactAngleMin(f64),
    #[error("adaptive_velocity_percent must be within (0, 1), got {0}")]
    AdaptiveVelocityPercent(f64),
    #[error("follow_through_offset must be within [0, 1], got {0}")]
    FollowThroughOffset(f64),
    #[error("wrist_behind_body_threshold must be within [0, 1), got {0}")]
    WristBehindBodyThreshold(f64),
    #[error("contact_frame_offset must be >= 0, got {0}")]
    ContactFrameOffset(i64),
    #[error("forward_swing_search_window must be >= 1, got {0}")]
    ForwardSwingSearchWindow(i64),
    #[error("min_valid_frames must be >= 1, got {0}")]
    MinValidFrames(i64),
    #[error("max_concurrent must be >= 1, got {0}")]
    MaxConcurrent(usize),
    #[error("Unknown log level '{0}', expected one of: trace, debug, info, warn, error")]
    LogLevel(String),
    #[error("Unknown preset '{0}', expected one of: standard, sensitive, strict")]
    UnknownPreset(String),
    #[error("Unknown contact detection method '{0}', expected one of: velocity_peak, kinematic_chain, hybrid")]
    UnknownContactMethod(String),
}

// Result container validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResultError {
    #[error("{field} must be between 0.0 and 1.0, got {value}")]
    ConfidenceOutOfRange { field: &'static str, value: f64 },
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be a mapping, got {kind}")]
    NotAMapping { field: &'static str, kind: &'static str },
    #[error("Phase {0} is missing from the analysis result")]
    MissingPhase(&'static str),
    #[error("Phase {0} has a detected flag that disagrees with its reason or frame")]
    InconsistentPhase(&'static str),
    #[error("Failed to encode analysis result: {0}")]
    Encode(String),
    #[error("Failed to decode analysis result: {0}")]
    Decode(String),
}

// Errors reading and preparing analysis input.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read {1}: {0}")]
    Read(std::io::Error, PathBuf),
    #[error("Failed to parse landmark document {1}: {0}")]
    Parse(serde_json::Error, PathBuf),
    #[error("Frames per second must be a finite value > 0, got {0}")]
    InvalidFps(f64),
    #[error("Failed to load settings: {0}")]
    Settings(#[from] ::config::ConfigError),
    #[error("Failed to encode report: {0}")]
    Encode(serde_json::Error),
    #[error("Analysis task failed: {0}")]
    Task(String),
}
