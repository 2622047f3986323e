use ::config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::Level;

use crate::error::{ConfigError, InputError};
use crate::pipeline::services::analysis::{AnalyzerConfig, ContactDetectionMethod};

/// Prefix for environment overrides, e.g. `SWING_ANALYZER__VELOCITY_THRESHOLD`.
const ENV_PREFIX: &str = "SWING";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    pub analyzer: AnalyzerSettings,
    pub batch: BatchSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            analyzer: AnalyzerSettings::default(),
            batch: BatchSettings::default(),
        }
    }
}

/// Analyzer overrides applied on top of a named preset. Unset fields keep the
/// preset's value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    pub preset: String,
    pub velocity_threshold: Option<f64>,
    pub contact_angle_min: Option<f64>,
    pub use_adaptive_velocity: Option<bool>,
    pub adaptive_velocity_percent: Option<f64>,
    pub contact_frame_offset: Option<i64>,
    pub follow_through_offset: Option<f64>,
    pub forward_swing_search_window: Option<i64>,
    pub min_valid_frames: Option<i64>,
    pub kinematic_chain_mode: Option<bool>,
    pub contact_detection_method: Option<ContactDetectionMethod>,
    pub wrist_behind_body_threshold: Option<f64>,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            preset: "standard".to_string(),
            velocity_threshold: None,
            contact_angle_min: None,
            use_adaptive_velocity: None,
            adaptive_velocity_percent: None,
            contact_frame_offset: None,
            follow_through_offset: None,
            forward_swing_search_window: None,
            min_valid_frames: None,
            kinematic_chain_mode: None,
            contact_detection_method: None,
            wrist_behind_body_threshold: None,
        }
    }
}

impl AnalyzerSettings {
    /// Resolve the preset, apply overrides and validate the result.
    pub fn to_config(&self) -> Result<AnalyzerConfig, ConfigError> {
        let mut builder = AnalyzerConfig::preset(&self.preset)?.to_builder();

        if let Some(value) = self.velocity_threshold {
            builder = builder.with_velocity_threshold(value);
        }
        if let Some(value) = self.contact_angle_min {
            builder = builder.with_contact_angle_min(value);
        }
        if let Some(value) = self.use_adaptive_velocity {
            builder = builder.with_adaptive_velocity(value);
        }
        if let Some(value) = self.adaptive_velocity_percent {
            builder = builder.with_adaptive_velocity_percent(value);
        }
        if let Some(value) = self.contact_frame_offset {
            builder = builder.with_contact_frame_offset(value);
        }
        if let Some(value) = self.follow_through_offset {
            builder = builder.with_follow_through_offset(value);
        }
        if let Some(value) = self.forward_swing_search_window {
            builder = builder.with_forward_swing_search_window(value);
        }
        if let Some(value) = self.min_valid_frames {
            builder = builder.with_min_valid_frames(value);
        }
        if let Some(value) = self.kinematic_chain_mode {
            builder = builder.with_kinematic_chain_mode(value);
        }
        if let Some(value) = self.contact_detection_method {
            builder = builder.with_contact_detection_method(value);
        }
        if let Some(value) = self.wrist_behind_body_threshold {
            builder = builder.with_wrist_behind_body_threshold(value);
        }

        builder.build()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Analyses allowed on the blocking pool at once.
    pub max_concurrent: usize,
    /// Per-video limit; unset means no limit.
    pub timeout_secs: Option<u64>,
    pub include_timeline: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            timeout_secs: None,
            include_timeline: false,
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file, then `SWING_` environment
    /// variables. Later sources win.
    pub fn load(path: Option<&Path>) -> Result<Self, InputError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn max_level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.log_level).map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}
