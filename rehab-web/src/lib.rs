//! Rehab Web - pose-driven exercise rep counting
//!
//! Entry point for WASM module. Only contains:
//! - Module declarations
//! - Console logging for the bridge
//! - The start hook

use wasm_bindgen::prelude::*;

// ============================================================================
// CONSOLE LOGGING
// ============================================================================

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => ($crate::log(&format_args!($($t)*).to_string()))
}

// ============================================================================
// MODULES
// ============================================================================

mod bridge;
mod error;
pub mod engine;
pub mod pose;

#[cfg(test)]
mod scenario_tests;

// Re-export wasm_bindgen functions for JS access
pub use bridge::{
    configure_engine, get_rep_count, get_session_summary, get_tracking_quality, is_full_body_visible,
    reset_exercise, set_audio_enabled, set_difficulty, set_paused, start_exercise, stop_exercise,
    update_pose, FlatLandmarkFeed, SpeechAnnouncer,
};
pub use engine::{
    DifficultyLevel, EngineConfig, ExerciseType, RepEngine, RepEvent, RepOutput, SessionSummary,
};
pub use error::EngineError;
pub use pose::{LandmarkFrame, LandmarkProvider, Side};

// ============================================================================
// WASM ENTRY POINTS
// ============================================================================

/// Called automatically when WASM module loads
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
    bridge::install_console_logging();
    console_log!("Rehab engine loaded");
}
