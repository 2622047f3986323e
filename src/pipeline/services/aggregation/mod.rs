//! Whole-swing metrics derived after the phase chain has run.

pub mod engine;
pub mod kinetic_chain;
pub mod tempo;

pub use engine::compute_engine_metrics;
pub use kinetic_chain::{compute_kinetic_chain_metrics, ordering_confidence};
pub use tempo::compute_tempo_metrics;
