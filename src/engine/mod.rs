//! Hazard evaluation engine and its initialization gate.

mod evaluator;
mod gate;

pub use evaluator::{HazardEvaluator, HAZARD_LABEL_KEYS};
pub use gate::EngineGate;
