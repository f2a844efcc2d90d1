//! Bridge module - JS ↔ Rust communication
//!
//! All #[wasm_bindgen] entry points live here.
//! Re-exports only in mod.rs, logic in submodules.

mod audio;
mod engine_bridge;
mod landmarks;
mod logging;

pub use audio::SpeechAnnouncer;
pub use engine_bridge::{
    configure_engine,
    get_rep_count,
    get_session_summary,
    get_tracking_quality,
    is_full_body_visible,
    reset_exercise,
    set_audio_enabled,
    set_difficulty,
    set_paused,
    start_exercise,
    stop_exercise,
    update_pose,
};
pub use landmarks::FlatLandmarkFeed;
pub use logging::install_console_logging;
