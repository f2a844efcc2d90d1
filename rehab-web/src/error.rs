//! Engine errors
//!
//! Only construction, reset and configuration can fail. Per-frame data
//! quality problems are absorbed inside `RepEngine::update`.

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown exercise type {0:?} (expected squat, straight_leg_raise or elbow_flexion)")]
    UnknownExercise(String),
    #[error("unknown body side {0:?} (expected left or right)")]
    UnknownSide(String),
    #[error("unknown difficulty {0:?} (expected easy, normal or hard)")]
    UnknownDifficulty(String),
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
    #[error("malformed landmark frame: expected {expected} values, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },
    #[error("failed to parse engine configuration")]
    Config(#[from] serde_json::Error),
}

impl From<EngineError> for JsValue {
    fn from(err: EngineError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
