//! Frame-by-frame phase labels for overlays and reports.
//!
//! Labels are replayed from the detected phase boundaries. When a boundary
//! was never detected the frames after the last known boundary keep their
//! label but carry the missing phase and its reason.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pipeline::types::{AnalysisResult, PhaseReason, SwingPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseLabel {
    Analyzing,
    ReadyPosition,
    Backswing,
    Loading,
    ForwardSwing,
    Contact,
    FollowThrough,
    Finish,
}

impl PhaseLabel {
    /// Overlay text.
    pub fn caption(&self) -> &'static str {
        match self {
            PhaseLabel::Analyzing => "Analyzing...",
            PhaseLabel::ReadyPosition => "Ready Position",
            PhaseLabel::Backswing => "BACKSWING",
            PhaseLabel::Loading => "LOADING",
            PhaseLabel::ForwardSwing => "FORWARD SWING",
            PhaseLabel::Contact => "*** CONTACT ***",
            PhaseLabel::FollowThrough => "FOLLOW THROUGH",
            PhaseLabel::Finish => "FINISH",
        }
    }
}

impl fmt::Display for PhaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.caption())
    }
}

/// The first undetected phase boundary a frame depends on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedPhase {
    pub phase: SwingPhase,
    pub reason: PhaseReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameAnnotation {
    pub frame: u32,
    pub label: PhaseLabel,
    /// Confidence of the phase that opened this label.
    pub confidence: f64,
    pub unresolved: Option<UnresolvedPhase>,
}

/// A run of consecutive frames sharing one annotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineSegment {
    pub label: PhaseLabel,
    pub start_frame: u32,
    pub end_frame: u32,
    pub confidence: f64,
    pub unresolved: Option<UnresolvedPhase>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseTimeline {
    frames: Vec<FrameAnnotation>,
}

/// Label a frame enters at each boundary after the unit turn.
const TRANSITIONS: [(SwingPhase, PhaseLabel); 4] = [
    (SwingPhase::Backswing, PhaseLabel::Loading),
    (SwingPhase::ForwardSwing, PhaseLabel::ForwardSwing),
    (SwingPhase::Contact, PhaseLabel::Contact),
    (SwingPhase::FollowThrough, PhaseLabel::Finish),
];

impl PhaseTimeline {
    /// Annotate frames `1..=total_frames`.
    pub fn build(result: &AnalysisResult, total_frames: u32) -> Self {
        let frames = (1..=total_frames)
            .map(|frame| annotate(result, frame))
            .collect();
        Self { frames }
    }

    pub fn frames(&self) -> &[FrameAnnotation] {
        &self.frames
    }

    pub fn get(&self, frame: u32) -> Option<&FrameAnnotation> {
        frame
            .checked_sub(1)
            .and_then(|index| self.frames.get(index as usize))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Collapse consecutive identical annotations into ranges.
    pub fn segments(&self) -> Vec<TimelineSegment> {
        let mut segments: Vec<TimelineSegment> = Vec::new();
        for annotation in &self.frames {
            match segments.last_mut() {
                Some(last)
                    if last.label == annotation.label
                        && last.confidence == annotation.confidence
                        && last.unresolved == annotation.unresolved =>
                {
                    last.end_frame = annotation.frame;
                }
                _ => segments.push(TimelineSegment {
                    label: annotation.label,
                    start_frame: annotation.frame,
                    end_frame: annotation.frame,
                    confidence: annotation.confidence,
                    unresolved: annotation.unresolved,
                }),
            }
        }
        segments
    }
}

fn annotate(result: &AnalysisResult, frame: u32) -> FrameAnnotation {
    let unresolved = |phase: SwingPhase| {
        let reason = result
            .phase(phase)
            .map_or(PhaseReason::NotAnalyzed, |p| p.reason());
        Some(UnresolvedPhase { phase, reason })
    };

    let unit_turn = result.phase(SwingPhase::UnitTurn).filter(|p| p.is_detected());
    let Some((start, confidence)) = unit_turn.and_then(|p| p.frame().map(|f| (f, p.confidence())))
    else {
        return FrameAnnotation {
            frame,
            label: PhaseLabel::Analyzing,
            confidence: 0.0,
            unresolved: unresolved(SwingPhase::UnitTurn),
        };
    };

    let mut annotation = FrameAnnotation {
        frame,
        label: if frame < start {
            PhaseLabel::ReadyPosition
        } else {
            PhaseLabel::Backswing
        },
        confidence,
        unresolved: None,
    };
    if frame < start {
        return annotation;
    }

    for (phase, label) in TRANSITIONS {
        let boundary = result
            .phase(phase)
            .filter(|p| p.is_detected())
            .and_then(|p| p.frame().map(|f| (f, p.confidence())));

        let Some((at, confidence)) = boundary else {
            annotation.unresolved = unresolved(phase);
            return annotation;
        };
        if frame < at {
            return annotation;
        }

        annotation.confidence = confidence;
        annotation.label = match label {
            PhaseLabel::Contact if frame > at => PhaseLabel::FollowThrough,
            other => other,
        };
        if annotation.label == PhaseLabel::Contact {
            return annotation;
        }
    }

    annotation
}
