//! Spoken rep announcements via the Web Speech API

use wasm_bindgen::JsValue;
use web_sys::{SpeechSynthesis, SpeechSynthesisUtterance};

use crate::engine::FeedbackSink;

/// Utterance rate; slightly quicker than default so the cue ends before the next rep
const SPEECH_RATE: f32 = 1.1;

pub struct SpeechAnnouncer {
    enabled: bool,
    last_spoken: u32,
}

impl SpeechAnnouncer {
    pub fn new() -> Self {
        Self { enabled: true, last_spoken: 0 }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn synth() -> Result<SpeechSynthesis, JsValue> {
        web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))?
            .speech_synthesis()
    }

    fn speak(text: &str) -> Result<(), JsValue> {
        let synth = Self::synth()?;
        let utterance = SpeechSynthesisUtterance::new_with_text(text)?;
        utterance.set_rate(SPEECH_RATE);
        // Drop any stale cue so announcements never queue up behind each other
        synth.cancel();
        synth.speak(&utterance);
        Ok(())
    }
}

impl Default for SpeechAnnouncer {
    fn default() -> Self {
        Self::new()
    }
}

/// "Rep 3, score 85"
pub fn announcement_text(rep_count: u32, form_score: f32) -> String {
    format!("Rep {}, score {}", rep_count, form_score.clamp(0.0, 100.0).round() as u32)
}

impl FeedbackSink for SpeechAnnouncer {
    fn announce_rep(&mut self, rep_count: u32, form_score: f32) {
        if !self.enabled || rep_count <= self.last_spoken {
            return;
        }
        self.last_spoken = rep_count;
        if let Err(err) = Self::speak(&announcement_text(rep_count, form_score)) {
            web_sys::console::warn_1(&err);
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            if let Ok(synth) = Self::synth() {
                synth.cancel();
            }
        }
    }

    fn reset(&mut self) {
        self.last_spoken = 0;
    }
}
