use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;

/// Strategy used to locate the contact frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactDetectionMethod {
    #[default]
    VelocityPeak,
    KinematicChain,
    Hybrid,
}

impl ContactDetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactDetectionMethod::VelocityPeak => "velocity_peak",
            ContactDetectionMethod::KinematicChain => "kinematic_chain",
            ContactDetectionMethod::Hybrid => "hybrid",
        }
    }
}

impl FromStr for ContactDetectionMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "velocity_peak" => Ok(ContactDetectionMethod::VelocityPeak),
            "kinematic_chain" => Ok(ContactDetectionMethod::KinematicChain),
            "hybrid" => Ok(ContactDetectionMethod::Hybrid),
            _ => Err(ConfigError::UnknownContactMethod(s.to_string())),
        }
    }
}

/// Validated, immutable parameters for one swing analyzer.
///
/// Only obtainable through a preset or [`AnalyzerConfigBuilder::build`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzerConfig {
    velocity_threshold: f64,
    contact_angle_min: f64,
    use_adaptive_velocity: bool,
    adaptive_velocity_percent: f64,
    contact_frame_offset: usize,
    follow_through_offset: f64,
    forward_swing_search_window: usize,
    min_valid_frames: usize,
    kinematic_chain_mode: bool,
    contact_detection_method: ContactDetectionMethod,
    wrist_behind_body_threshold: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl AnalyzerConfig {
    /// Fixed threshold, strict arm extension. The default.
    pub fn standard() -> Self {
        Self {
            velocity_threshold: 0.5,
            contact_angle_min: 150.0,
            use_adaptive_velocity: false,
            adaptive_velocity_percent: 0.15,
            contact_frame_offset: 3,
            follow_through_offset: 0.15,
            forward_swing_search_window: 40,
            min_valid_frames: 10,
            kinematic_chain_mode: false,
            contact_detection_method: ContactDetectionMethod::VelocityPeak,
            wrist_behind_body_threshold: 0.0,
        }
    }

    /// Adaptive threshold at 10% of peak wrist speed, relaxed extension
    pub fn sensitive() -> Self {
        Self {
            velocity_threshold: 0.3,
            contact_angle_min: 120.0,
            use_adaptive_velocity: true,
            adaptive_velocity_percent: 0.10,
            ..Self::standard()
        }
    }

    /// High fixed threshold, near-straight arm at contact
    pub fn strict() -> Self {
        Self {
            velocity_threshold: 0.7,
            contact_angle_min: 160.0,
            contact_frame_offset: 2,
            ..Self::standard()
        }
    }

    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "standard" | "default" => Ok(Self::standard()),
            "sensitive" => Ok(Self::sensitive()),
            "strict" => Ok(Self::strict()),
            _ => Err(ConfigError::UnknownPreset(name.to_string())),
        }
    }

    /// Builder seeded with the standard preset.
    pub fn builder() -> AnalyzerConfigBuilder {
        Self::standard().to_builder()
    }

    /// Builder seeded with this configuration's values.
    pub fn to_builder(&self) -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            velocity_threshold: self.velocity_threshold,
            contact_angle_min: self.contact_angle_min,
            use_adaptive_velocity: self.use_adaptive_velocity,
            adaptive_velocity_percent: self.adaptive_velocity_percent,
            contact_frame_offset: self.contact_frame_offset as i64,
            follow_through_offset: self.follow_through_offset,
            forward_swing_search_window: self.forward_swing_search_window as i64,
            min_valid_frames: self.min_valid_frames as i64,
            kinematic_chain_mode: self.kinematic_chain_mode,
            contact_detection_method: self.contact_detection_method,
            wrist_behind_body_threshold: self.wrist_behind_body_threshold,
        }
    }

    pub fn velocity_threshold(&self) -> f64 {
        self.velocity_threshold
    }

    pub fn contact_angle_min(&self) -> f64 {
        self.contact_angle_min
    }

    pub fn use_adaptive_velocity(&self) -> bool {
        self.use_adaptive_velocity
    }

    pub fn adaptive_velocity_percent(&self) -> f64 {
        self.adaptive_velocity_percent
    }

    pub fn contact_frame_offset(&self) -> usize {
        self.contact_frame_offset
    }

    pub fn follow_through_offset(&self) -> f64 {
        self.follow_through_offset
    }

    pub fn forward_swing_search_window(&self) -> usize {
        self.forward_swing_search_window
    }

    pub fn min_valid_frames(&self) -> usize {
        self.min_valid_frames
    }

    pub fn kinematic_chain_mode(&self) -> bool {
        self.kinematic_chain_mode
    }

    pub fn contact_detection_method(&self) -> ContactDetectionMethod {
        self.contact_detection_method
    }

    pub fn wrist_behind_body_threshold(&self) -> f64 {
        self.wrist_behind_body_threshold
    }
}

/// Collects overrides and validates them all at once in [`build`](Self::build).
/// Values outside their documented range are rejected, never clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfigBuilder {
    velocity_threshold: f64,
    contact_angle_min: f64,
    use_adaptive_velocity: bool,
    adaptive_velocity_percent: f64,
    contact_frame_offset: i64,
    follow_through_offset: f64,
    forward_swing_search_window: i64,
    min_valid_frames: i64,
    kinematic_chain_mode: bool,
    contact_detection_method: ContactDetectionMethod,
    wrist_behind_body_threshold: f64,
}

impl Default for AnalyzerConfigBuilder {
    fn default() -> Self {
        AnalyzerConfig::builder()
    }
}

impl AnalyzerConfigBuilder {
    pub fn with_velocity_threshold(mut self, threshold: f64) -> Self {
        self.velocity_threshold = threshold;
        self
    }

    pub fn with_contact_angle_min(mut self, degrees: f64) -> Self {
        self.contact_angle_min = degrees;
        self
    }

    pub fn with_adaptive_velocity(mut self, enabled: bool) -> Self {
        self.use_adaptive_velocity = enabled;
        self
    }

    pub fn with_adaptive_velocity_percent(mut self, percent: f64) -> Self {
        self.adaptive_velocity_percent = percent;
        self
    }

    pub fn with_contact_frame_offset(mut self, frames: i64) -> Self {
        self.contact_frame_offset = frames;
        self
    }

    pub fn with_follow_through_offset(mut self, offset: f64) -> Self {
        self.follow_through_offset = offset;
        self
    }

    pub fn with_forward_swing_search_window(mut self, frames: i64) -> Self {
        self.forward_swing_search_window = frames;
        self
    }

    pub fn with_min_valid_frames(mut self, frames: i64) -> Self {
        self.min_valid_frames = frames;
        self
    }

    pub fn with_kinematic_chain_mode(mut self, enabled: bool) -> Self {
        self.kinematic_chain_mode = enabled;
        self
    }

    pub fn with_contact_detection_method(mut self, method: ContactDetectionMethod) -> Self {
        self.contact_detection_method = method;
        self
    }

    pub fn with_wrist_behind_body_threshold(mut self, threshold: f64) -> Self {
        self.wrist_behind_body_threshold = threshold;
        self
    }

    /// Validate configuration parameters
    pub fn build(self) -> Result<AnalyzerConfig, ConfigError> {
        if !self.velocity_threshold.is_finite() || self.velocity_threshold < 0.0 {
            return Err(ConfigError::VelocityThreshold(self.velocity_threshold));
        }

        if !(0.0..=180.0).contains(&self.contact_angle_min) {
            return Err(ConfigError::ContactAngleMin(self.contact_angle_min));
        }

        if !(self.adaptive_velocity_percent > 0.0 && self.adaptive_velocity_percent < 1.0) {
            return Err(ConfigError::AdaptiveVelocityPercent(
                self.adaptive_velocity_percent,
            ));
        }

        if !(0.0..=1.0).contains(&self.follow_through_offset) {
            return Err(ConfigError::FollowThroughOffset(self.follow_through_offset));
        }

        if !(0.0..1.0).contains(&self.wrist_behind_body_threshold) {
            return Err(ConfigError::WristBehindBodyThreshold(
                self.wrist_behind_body_threshold,
            ));
        }

        let contact_frame_offset = usize::try_from(self.contact_frame_offset)
            .map_err(|_| ConfigError::ContactFrameOffset(self.contact_frame_offset))?;

        let forward_swing_search_window = usize::try_from(self.forward_swing_search_window)
            .ok()
            .filter(|w| *w >= 1)
            .ok_or(ConfigError::ForwardSwingSearchWindow(
                self.forward_swing_search_window,
            ))?;

        let min_valid_frames = usize::try_from(self.min_valid_frames)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(ConfigError::MinValidFrames(self.min_valid_frames))?;

        Ok(AnalyzerConfig {
            velocity_threshold: self.velocity_threshold,
            contact_angle_min: self.contact_angle_min,
            use_adaptive_velocity: self.use_adaptive_velocity,
            adaptive_velocity_percent: self.adaptive_velocity_percent,
            contact_frame_offset,
            follow_through_offset: self.follow_through_offset,
            forward_swing_search_window,
            min_valid_frames,
            kinematic_chain_mode: self.kinematic_chain_mode,
            contact_detection_method: self.contact_detection_method,
            wrist_behind_body_threshold: self.wrist_behind_body_threshold,
        })
    }
}
