//! Rep engine storage and JS entry points
//!
//! One engine per page. JS calls `start_exercise` once the camera is
//! streaming, then `update_pose` for every pose-model result.

use std::cell::RefCell;
use wasm_bindgen::prelude::*;

use super::audio::SpeechAnnouncer;
use super::landmarks::FlatLandmarkFeed;
use crate::engine::{DifficultyLevel, EngineConfig, FeedbackSink, RepEngine, RepOutput};
use crate::error::EngineError;
use crate::pose::{LandmarkFrame, LandmarkProvider};

/// Bridge-side state (WASM is single-threaded)
struct EngineSlot {
    engine: Option<RepEngine>,
    /// Applied on the next `start_exercise`
    config: EngineConfig,
    difficulty: DifficultyLevel,
    audio_enabled: bool,
    feed: FlatLandmarkFeed,
    announcer: SpeechAnnouncer,
}

impl Default for EngineSlot {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            feed: FlatLandmarkFeed::new(config.confidence_floor),
            engine: None,
            config,
            difficulty: DifficultyLevel::default(),
            audio_enabled: true,
            announcer: SpeechAnnouncer::new(),
        }
    }
}

thread_local! {
    static ENGINE: RefCell<EngineSlot> = RefCell::new(EngineSlot::default());
}

fn not_started() -> JsValue {
    JsValue::from_str("no exercise started; call start_exercise first")
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| EngineError::from(e).into())
}

/// Create a fresh engine for `exercise` ("squat", "straight_leg_raise",
/// "elbow_flexion") on `side` ("left" / "right")
#[wasm_bindgen]
pub fn start_exercise(exercise: &str, side: &str) -> Result<(), JsValue> {
    ENGINE.with(|slot_cell| -> Result<(), JsValue> {
        let mut slot = slot_cell.borrow_mut();
        let mut engine = RepEngine::from_names(exercise, side, slot.config.clone())?;
        engine.set_difficulty(slot.difficulty);
        engine.set_audio_enabled(slot.audio_enabled);

        let floor = slot.config.confidence_floor;
        slot.feed.set_confidence_floor(floor);
        slot.feed.init()?;
        slot.announcer.reset();
        slot.engine = Some(engine);

        console_log!("Exercise started: {} ({})", exercise, side);
        Ok(())
    })
}

/// Replace the engine configuration (partial JSON allowed).
/// Takes effect on the next `start_exercise`.
#[wasm_bindgen]
pub fn configure_engine(json: &str) -> Result<(), JsValue> {
    let config = EngineConfig::from_json(json)?;
    ENGINE.with(|slot_cell| {
        slot_cell.borrow_mut().config = config;
    });
    console_log!("Engine configuration updated");
    Ok(())
}

/// Feed one pose result: flat Float32Array of 132 values
/// (33 landmarks × x, y, z, visibility). Returns the `RepOutput` as JSON.
#[wasm_bindgen]
pub fn update_pose(data: &[f32], timestamp_ms: f64) -> Result<String, JsValue> {
    ENGINE.with(|slot_cell| -> Result<String, JsValue> {
        let slot = &mut *slot_cell.borrow_mut();
        let engine = slot.engine.as_mut().ok_or_else(not_started)?;

        // A frame the feed rejects still advances tracking-loss feedback
        let frame = slot
            .feed
            .process(data, timestamp_ms)
            .unwrap_or_else(|| LandmarkFrame::untracked(timestamp_ms));

        let output: RepOutput = engine.update_with_sink(&frame, &mut slot.announcer);
        to_json(&output)
    })
}

/// Back to idle with zero reps; configuration is kept
#[wasm_bindgen]
pub fn reset_exercise() {
    ENGINE.with(|slot_cell| {
        let slot = &mut *slot_cell.borrow_mut();
        if let Some(engine) = slot.engine.as_mut() {
            engine.reset();
        }
        slot.announcer.reset();
    });
}

/// "easy", "normal" or "hard"
#[wasm_bindgen]
pub fn set_difficulty(level: &str) -> Result<(), JsValue> {
    let difficulty: DifficultyLevel = level.parse()?;
    ENGINE.with(|slot_cell| {
        let mut slot = slot_cell.borrow_mut();
        slot.difficulty = difficulty;
        if let Some(engine) = slot.engine.as_mut() {
            engine.set_difficulty(difficulty);
        }
    });
    console_log!("Difficulty set to {}", difficulty.as_str());
    Ok(())
}

#[wasm_bindgen]
pub fn set_paused(paused: bool) {
    ENGINE.with(|slot_cell| {
        if let Some(engine) = slot_cell.borrow_mut().engine.as_mut() {
            engine.set_paused(paused);
        }
    });
}

#[wasm_bindgen]
pub fn set_audio_enabled(enabled: bool) {
    ENGINE.with(|slot_cell| {
        let slot = &mut *slot_cell.borrow_mut();
        slot.audio_enabled = enabled;
        slot.announcer.set_enabled(enabled);
        if let Some(engine) = slot.engine.as_mut() {
            engine.set_audio_enabled(enabled);
        }
    });
}

#[wasm_bindgen]
pub fn get_rep_count() -> u32 {
    ENGINE.with(|slot_cell| {
        slot_cell.borrow().engine.as_ref().map_or(0, |e| e.rep_count())
    })
}

/// JSON `SessionSummary` for the UI to persist
#[wasm_bindgen]
pub fn get_session_summary() -> Result<String, JsValue> {
    ENGINE.with(|slot_cell| -> Result<String, JsValue> {
        let slot = slot_cell.borrow();
        let engine = slot.engine.as_ref().ok_or_else(not_started)?;
        to_json(&engine.summary())
    })
}

/// 0-100 quality of the last landmark array
#[wasm_bindgen]
pub fn get_tracking_quality() -> u8 {
    ENGINE.with(|slot_cell| slot_cell.borrow().feed.tracking_quality())
}

/// Whether the UI should attempt rep counting at all
#[wasm_bindgen]
pub fn is_full_body_visible() -> bool {
    ENGINE.with(|slot_cell| slot_cell.borrow().feed.is_full_body_visible())
}

/// Stop the feed and drop the engine (camera closed)
#[wasm_bindgen]
pub fn stop_exercise() {
    ENGINE.with(|slot_cell| {
        let slot = &mut *slot_cell.borrow_mut();
        slot.feed.destroy();
        slot.announcer.reset();
        slot.engine = None;
    });
}
