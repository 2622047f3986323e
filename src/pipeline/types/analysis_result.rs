use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::ResultError;
use crate::pipeline::types::{
    EngineMetrics, KineticChainMetrics, PeakMeasurement, PhaseReason, PhaseResult, SwingPhase,
    TempoMetrics,
};

/// Complete output of one swing analysis.
///
/// Every mutation goes through a validating setter; once the analyzer hands
/// the value out it is only read and serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    phases: IndexMap<SwingPhase, PhaseResult>,
    engine: EngineMetrics,
    tempo: TempoMetrics,
    kinetic_chain: KineticChainMetrics,
    video_quality: Option<Value>,
    tracking_quality: Option<Value>,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisResult {
    pub fn new() -> Self {
        let phases = SwingPhase::ALL
            .into_iter()
            .map(|phase| (phase, PhaseResult::missed(phase, PhaseReason::NotAnalyzed)))
            .collect();

        Self {
            phases,
            engine: EngineMetrics::default(),
            tempo: TempoMetrics::default(),
            kinetic_chain: KineticChainMetrics::default(),
            video_quality: None,
            tracking_quality: None,
        }
    }

    pub fn set_phase(&mut self, result: PhaseResult) -> Result<(), ResultError> {
        result.check_consistency()?;
        check_confidence("phase confidence", result.confidence())?;
        if let Some(timestamp) = result.timestamp() {
            check_finite("phase timestamp", timestamp)?;
        }
        self.phases.insert(result.phase(), result);
        Ok(())
    }

    pub fn set_engine_metrics(&mut self, engine: EngineMetrics) -> Result<(), ResultError> {
        check_peak("hip_shoulder_separation", engine.hip_shoulder_separation.as_ref())?;
        check_peak("max_shoulder_rotation", engine.max_shoulder_rotation.as_ref())?;
        check_peak("max_hip_rotation", engine.max_hip_rotation.as_ref())?;
        self.engine = engine;
        Ok(())
    }

    pub fn set_tempo_metrics(&mut self, tempo: TempoMetrics) -> Result<(), ResultError> {
        check_duration("backswing_duration", tempo.backswing_duration)?;
        check_duration("forward_swing_duration", tempo.forward_swing_duration)?;
        check_duration("swing_rhythm_ratio", tempo.swing_rhythm_ratio)?;
        self.tempo = tempo;
        Ok(())
    }

    pub fn set_kinetic_chain_metrics(
        &mut self,
        kinetic_chain: KineticChainMetrics,
    ) -> Result<(), ResultError> {
        if let Some(sequence) = kinetic_chain.peak_velocity_sequence.as_ref() {
            check_peak("peak_velocity_sequence.hip", Some(&sequence.hip))?;
            check_peak("peak_velocity_sequence.shoulder", Some(&sequence.shoulder))?;
            check_peak("peak_velocity_sequence.elbow", Some(&sequence.elbow))?;
            check_peak("peak_velocity_sequence.wrist", Some(&sequence.wrist))?;
        }
        if let Some(lag) = kinetic_chain.chain_lag.as_ref() {
            check_finite("chain_lag.hip_to_shoulder", lag.hip_to_shoulder)?;
            check_finite("chain_lag.shoulder_to_elbow", lag.shoulder_to_elbow)?;
            check_finite("chain_lag.elbow_to_wrist", lag.elbow_to_wrist)?;
        }
        if let Some(confidence) = kinetic_chain.confidence {
            check_confidence("kinetic_chain confidence", confidence)?;
        }
        self.kinetic_chain = kinetic_chain;
        Ok(())
    }

    pub fn set_video_quality(&mut self, quality: Value) -> Result<(), ResultError> {
        check_mapping("video_quality", &quality)?;
        self.video_quality = Some(quality);
        Ok(())
    }

    pub fn set_tracking_quality(&mut self, quality: Value) -> Result<(), ResultError> {
        check_mapping("tracking_quality", &quality)?;
        self.tracking_quality = Some(quality);
        Ok(())
    }

    pub fn phase(&self, phase: SwingPhase) -> Option<&PhaseResult> {
        self.phases.get(&phase)
    }

    pub fn phases(&self) -> impl Iterator<Item = &PhaseResult> {
        self.phases.values()
    }

    pub fn engine(&self) -> &EngineMetrics {
        &self.engine
    }

    pub fn tempo(&self) -> &TempoMetrics {
        &self.tempo
    }

    pub fn kinetic_chain(&self) -> &KineticChainMetrics {
        &self.kinetic_chain
    }

    pub fn video_quality(&self) -> Option<&Value> {
        self.video_quality.as_ref()
    }

    pub fn tracking_quality(&self) -> Option<&Value> {
        self.tracking_quality.as_ref()
    }

    pub fn phases_detected_count(&self) -> usize {
        self.phases.values().filter(|p| p.is_detected()).count()
    }

    /// Mean confidence over the detected phases only, 0.0 when none were.
    pub fn overall_confidence(&self) -> f64 {
        let detected: Vec<f64> = self
            .phases
            .values()
            .filter(|p| p.is_detected())
            .map(|p| p.confidence())
            .collect();

        if detected.is_empty() {
            return 0.0;
        }
        detected.iter().sum::<f64>() / detected.len() as f64
    }

    /// One line per phase, built only from reason codes and confidences.
    pub fn summary(&self) -> String {
        let mut lines = Vec::with_capacity(self.phases.len() + 1);
        for result in self.phases.values() {
            let name = result.phase().display_name();
            match result.detection() {
                Some(detection) => lines.push(format!(
                    "{}: detected at frame {} ({:.2}s), confidence {:.0}%",
                    name,
                    detection.frame,
                    detection.timestamp,
                    result.confidence() * 100.0
                )),
                None => lines.push(format!(
                    "{}: not detected, {} ({})",
                    name,
                    result.reason().describe(),
                    result.reason()
                )),
            }
        }
        lines.push(format!(
            "{}/{} phases detected, mean confidence {:.2}",
            self.phases_detected_count(),
            SwingPhase::ALL.len(),
            self.overall_confidence()
        ));
        lines.join("\n")
    }

    pub fn to_value(&self) -> Result<Value, ResultError> {
        serde_json::to_value(self).map_err(|e| ResultError::Encode(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, ResultError> {
        serde_json::to_string_pretty(self).map_err(|e| ResultError::Encode(e.to_string()))
    }

    /// Rebuilds a result from its nested key-value form, re-running every
    /// setter check.
    pub fn from_value(value: Value) -> Result<Self, ResultError> {
        let decoded: AnalysisResult =
            serde_json::from_value(value).map_err(|e| ResultError::Decode(e.to_string()))?;

        let mut result = AnalysisResult::new();
        for phase in SwingPhase::ALL {
            let phase_result = decoded
                .phases
                .get(&phase)
                .copied()
                .ok_or(ResultError::MissingPhase(phase.as_str()))?;
            result.set_phase(phase_result)?;
        }
        result.set_engine_metrics(decoded.engine)?;
        result.set_tempo_metrics(decoded.tempo)?;
        result.set_kinetic_chain_metrics(decoded.kinetic_chain)?;
        if let Some(quality) = decoded.video_quality {
            result.set_video_quality(quality)?;
        }
        if let Some(quality) = decoded.tracking_quality {
            result.set_tracking_quality(quality)?;
        }
        Ok(result)
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisResult(phases_detected={}/{}, overall_confidence={:.2})",
            self.phases_detected_count(),
            SwingPhase::ALL.len(),
            self.overall_confidence()
        )
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ResultError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ResultError::NonFinite { field, value })
    }
}

fn check_confidence(field: &'static str, value: f64) -> Result<(), ResultError> {
    check_finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ResultError::ConfidenceOutOfRange { field, value })
    }
}

fn check_duration(field: &'static str, value: Option<f64>) -> Result<(), ResultError> {
    let Some(value) = value else {
        return Ok(());
    };
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(ResultError::Negative { field, value });
    }
    Ok(())
}

fn check_peak(field: &'static str, peak: Option<&PeakMeasurement>) -> Result<(), ResultError> {
    if let Some(peak) = peak {
        check_finite(field, peak.value)?;
        check_finite(field, peak.timestamp)?;
    }
    Ok(())
}

fn check_mapping(field: &'static str, value: &Value) -> Result<(), ResultError> {
    let kind = match value {
        Value::Object(_) => return Ok(()),
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
    };
    Err(ResultError::NotAMapping { field, kind })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{
        ChainLag, ContactAttributes, ContactMethodUsed, PeakVelocitySequence, PhaseAttributes,
        PhaseDetection,
    };
    use serde_json::json;

    fn peak(value: f64, frame: u32) -> PeakMeasurement {
        PeakMeasurement {
            value,
            frame,
            timestamp: frame as f64 / 30.0,
        }
    }

    /// Detected up to contact, with the follow-through missing.
    fn populated() -> AnalysisResult {
        let mut result = AnalysisResult::new();
        let phases = [
            PhaseResult::found(
                SwingPhase::UnitTurn,
                0.8,
                PhaseDetection {
                    frame: 39,
                    timestamp: 1.3,
                    attributes: PhaseAttributes::UnitTurn {
                        wrist_offset: 0.08,
                        hip_rotation: -22.0,
                        shoulder_rotation: -40.5,
                    },
                },
            ),
            PhaseResult::found(
                SwingPhase::Backswing,
                0.88,
                PhaseDetection {
                    frame: 45,
                    timestamp: 1.5,
                    attributes: PhaseAttributes::Backswing {
                        wrist_x: 0.31,
                        depth: 0.12,
                    },
                },
            ),
            PhaseResult::found(
                SwingPhase::ForwardSwing,
                0.7,
                PhaseDetection {
                    frame: 90,
                    timestamp: 3.0,
                    attributes: PhaseAttributes::ForwardSwing {
                        wrist_velocity: 0.6,
                        hip_angular_velocity: 48.0,
                    },
                },
            ),
            PhaseResult::found(
                SwingPhase::Contact,
                0.95,
                PhaseDetection {
                    frame: 102,
                    timestamp: 3.4,
                    attributes: PhaseAttributes::Contact(ContactAttributes {
                        method: ContactMethodUsed::KinematicChain,
                        elbow_angle: 165.3,
                        wrist_velocity: 0.82,
                        peak_frame: 99,
                        peak_velocity: 0.91,
                        velocity_score: 0.9,
                        angle_score: 1.0,
                        chain: None,
                    }),
                },
            ),
            PhaseResult::missed(
                SwingPhase::FollowThrough,
                PhaseReason::WristNeverCrossedBodyCenter,
            ),
        ];
        for phase in phases {
            result.set_phase(phase).unwrap();
        }
        result
            .set_engine_metrics(EngineMetrics {
                hip_shoulder_separation: Some(peak(35.2, 67)),
                max_shoulder_rotation: Some(peak(-42.1, 67)),
                max_hip_rotation: Some(peak(-55.3, 65)),
            })
            .unwrap();
        result
            .set_tempo_metrics(TempoMetrics {
                backswing_duration: Some(1.7),
                forward_swing_duration: Some(0.4),
                swing_rhythm_ratio: Some(4.25),
            })
            .unwrap();
        result
            .set_kinetic_chain_metrics(KineticChainMetrics {
                peak_velocity_sequence: Some(PeakVelocitySequence {
                    hip: peak(245.3, 65),
                    shoulder: peak(312.1, 67),
                    elbow: peak(425.7, 99),
                    wrist: peak(612.4, 102),
                }),
                chain_lag: Some(ChainLag {
                    hip_to_shoulder: 0.06,
                    shoulder_to_elbow: 1.07,
                    elbow_to_wrist: 0.1,
                }),
                confidence: Some(0.92),
            })
            .unwrap();
        result
            .set_video_quality(json!({"overall_quality": "good", "frame_rate": {"fps": 60}}))
            .unwrap();
        result
            .set_tracking_quality(json!({"detection_rate": 0.95, "average_confidence": 0.82}))
            .unwrap();
        result
    }

    #[test]
    fn new_result_has_all_phases_undetected() {
        let result = AnalysisResult::new();
        assert_eq!(result.phases().count(), 5);
        assert_eq!(result.phases_detected_count(), 0);
        assert_eq!(result.overall_confidence(), 0.0);
    }

    #[test]
    fn overall_confidence_averages_detected_phases_only() {
        let result = populated();
        assert_eq!(result.phases_detected_count(), 4);
        assert!((result.overall_confidence() - (0.8 + 0.88 + 0.7 + 0.95) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let mut result = AnalysisResult::new();
        let mut chain = KineticChainMetrics::default();
        chain.confidence = Some(1.5);
        assert!(matches!(
            result.set_kinetic_chain_metrics(chain),
            Err(ResultError::ConfidenceOutOfRange { .. })
        ));

        chain.confidence = Some(f64::NAN);
        assert!(matches!(
            result.set_kinetic_chain_metrics(chain),
            Err(ResultError::NonFinite { .. })
        ));
    }

    #[test]
    fn rejects_negative_durations() {
        let mut result = AnalysisResult::new();
        let tempo = TempoMetrics {
            backswing_duration: Some(-0.1),
            ..TempoMetrics::default()
        };
        assert!(matches!(
            result.set_tempo_metrics(tempo),
            Err(ResultError::Negative { field: "backswing_duration", .. })
        ));
    }

    #[test]
    fn rejects_non_mapping_quality_bundles() {
        let mut result = AnalysisResult::new();
        assert_eq!(
            result.set_video_quality(json!([1, 2])),
            Err(ResultError::NotAMapping {
                field: "video_quality",
                kind: "array"
            })
        );
        assert!(result.set_tracking_quality(json!("good")).is_err());
        assert!(result.video_quality().is_none());
    }

    #[test]
    fn top_level_keys_are_fixed() {
        let value = populated().to_value().unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "phases",
                "engine",
                "tempo",
                "kinetic_chain",
                "video_quality",
                "tracking_quality"
            ]
        );
        let phase_keys: Vec<&str> = value["phases"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            phase_keys,
            vec!["unit_turn", "backswing", "forward_swing", "contact", "follow_through"]
        );
        assert_eq!(
            value["phases"]["follow_through"]["reason"],
            "wrist_never_crossed_body_center"
        );
        assert!(value["tempo"].get("swing_rhythm_ratio").is_some());
    }

    #[test]
    fn serialized_form_reads_back_exactly() {
        let original = populated();
        let restored = AnalysisResult::from_value(original.to_value().unwrap()).unwrap();
        assert_eq!(original, restored);

        let text = original.to_json_pretty().unwrap();
        let reparsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(AnalysisResult::from_value(reparsed).unwrap(), original);
    }

    #[test]
    fn decoding_rejects_invalid_confidence() {
        let mut value = populated().to_value().unwrap();
        value["phases"]["contact"]["confidence"] = json!(1.7);
        assert!(matches!(
            AnalysisResult::from_value(value),
            Err(ResultError::ConfidenceOutOfRange { .. })
        ));
    }

    #[test]
    fn decoding_rejects_detected_phase_without_frame() {
        let mut value = populated().to_value().unwrap();
        value["phases"]["contact"]["detection"] = Value::Null;
        assert!(matches!(
            AnalysisResult::from_value(value),
            Err(ResultError::Decode(_))
        ));

        let mut value = populated().to_value().unwrap();
        value["phases"]["backswing"]["detected"] = json!(false);
        assert!(AnalysisResult::from_value(value).is_err());
    }

    #[test]
    fn summary_explains_missing_phases() {
        let summary = populated().summary();
        assert!(summary.contains("Follow-through: not detected"));
        assert!(summary.contains("wrist_never_crossed_body_center"));
        assert!(summary.contains("Contact: detected at frame 102"));
        assert!(summary.contains("4/5 phases detected"));
    }
}
