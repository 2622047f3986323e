use crate::pipeline::types::{AnalysisResult, SwingPhase, TempoMetrics};

/// Durations between detected phase boundaries. Anything that depends on an
/// undetected phase stays absent.
pub fn compute_tempo_metrics(result: &AnalysisResult) -> TempoMetrics {
    let timestamp = |phase| result.phase(phase).and_then(|p| p.timestamp());

    let unit_turn = timestamp(SwingPhase::UnitTurn);
    let forward_swing = timestamp(SwingPhase::ForwardSwing);
    let contact = timestamp(SwingPhase::Contact);

    let backswing_duration = unit_turn.zip(forward_swing).map(|(start, end)| end - start);
    let forward_swing_duration = forward_swing.zip(contact).map(|(start, end)| end - start);
    let swing_rhythm_ratio = backswing_duration
        .zip(forward_swing_duration)
        .filter(|(_, forward)| *forward > 0.0)
        .map(|(back, forward)| back / forward);

    TempoMetrics {
        backswing_duration,
        forward_swing_duration,
        swing_rhythm_ratio,
    }
}
