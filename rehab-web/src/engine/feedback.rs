//! Feedback emitter - coaching text and rep announcements
//!
//! Pure: it decides *what* to say and hands the caller a description.
//! The caller (or `RepEngine::update_with_sink`) performs the audio.

use serde::Serialize;

use super::config::FeedbackConfig;
use super::exercise::ExerciseType;
use super::rep_machine::RepPhase;
use super::scoring::{FormClass, FormIssue, RepScore, TempoIssue};

pub const LOST_TRACKING_TEXT: &str = "Improve tracking: make sure your whole body is in view";
pub const GET_READY_TEXT: &str = "Get ready...";

/// Audio device contract (implemented outside the engine)
pub trait FeedbackSink {
    fn announce_rep(&mut self, rep_count: u32, form_score: f32);
    fn set_enabled(&mut self, enabled: bool);
    fn reset(&mut self);
}

/// One audio cue, emitted at most once per rep count
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepAnnouncement {
    pub rep_count: u32,
    pub form_score: f32,
}

/// Everything the emitter needs to know about the current frame
pub struct FeedbackInput<'a> {
    pub timestamp_ms: f64,
    /// Tracked angle was readable this frame
    pub angle_valid: bool,
    pub tracking_quality: u8,
    pub phase: RepPhase,
    pub rep_count: u32,
    /// Score of the rep completed on this frame
    pub completed: Option<&'a RepScore>,
    /// Spotlight message when a fault is above the display threshold
    pub spotlight_message: Option<&'static str>,
}

pub struct FeedbackFrame {
    pub text: String,
    /// True only on the frame the text changed
    pub changed: bool,
    pub announcement: Option<RepAnnouncement>,
}

pub struct FeedbackEmitter {
    config: FeedbackConfig,
    exercise: ExerciseType,
    audio_enabled: bool,
    last_announced: u32,
    last_text: String,
    /// Post-rep message and the time it was raised
    held: Option<(String, f64)>,
    skipped_frames: u32,
}

impl FeedbackEmitter {
    pub fn new(config: FeedbackConfig, exercise: ExerciseType) -> Self {
        Self {
            config,
            exercise,
            audio_enabled: true,
            last_announced: 0,
            last_text: String::new(),
            held: None,
            skipped_frames: 0,
        }
    }

    /// Toggle audio without touching any other state
    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.audio_enabled = enabled;
    }

    /// Announce `rep_count` once. Later calls with the same count are no-ops.
    pub fn announce(&mut self, rep_count: u32, form_score: f32) -> Option<RepAnnouncement> {
        if rep_count <= self.last_announced {
            return None;
        }
        self.last_announced = rep_count;
        if self.audio_enabled {
            Some(RepAnnouncement { rep_count, form_score })
        } else {
            None
        }
    }

    pub fn compose(&mut self, input: &FeedbackInput) -> FeedbackFrame {
        if input.angle_valid {
            self.skipped_frames = 0;
        } else {
            self.skipped_frames = self.skipped_frames.saturating_add(1);
        }

        let mut announcement = None;
        let text = if let Some(score) = input.completed {
            announcement = self.announce(input.rep_count, score.form_score);
            let text = self.rep_text(score);
            self.held = Some((text.clone(), input.timestamp_ms));
            text
        } else if let Some(text) = self.held_text(input.timestamp_ms) {
            text
        } else if self.tracking_lost(input) {
            LOST_TRACKING_TEXT.to_string()
        } else if let Some(message) = input.spotlight_message.filter(|m| !m.is_empty()) {
            message.to_string()
        } else {
            self.phase_text(input.phase, input.rep_count).to_string()
        };

        let changed = text != self.last_text;
        if changed {
            self.last_text.clone_from(&text);
        }

        FeedbackFrame { text, changed, announcement }
    }

    /// Held post-rep text, if still inside the hold window
    fn held_text(&mut self, now_ms: f64) -> Option<String> {
        let (text, raised_ms) = self.held.as_ref()?;
        let elapsed = now_ms - raised_ms;
        if (0.0..self.config.hold_ms).contains(&elapsed) {
            Some(text.clone())
        } else {
            self.held = None;
            None
        }
    }

    fn tracking_lost(&self, input: &FeedbackInput) -> bool {
        self.skipped_frames >= self.config.lost_tracking_frames
            || input.tracking_quality < self.config.min_tracking_quality
    }

    fn rep_text(&self, score: &RepScore) -> String {
        match score.class {
            FormClass::Good => match score.tempo_issue {
                Some(TempoIssue::TooFast) => format!("Good {}! A little slower next time", self.exercise.display_name()),
                _ => format!("Good {}!", self.exercise.display_name()),
            },
            FormClass::Fair | FormClass::Improve => {
                if let Some(issue) = score.issue {
                    self.issue_text(issue).to_string()
                } else if let Some(tempo) = score.tempo_issue {
                    tempo_text(tempo).to_string()
                } else {
                    "Nice rep, keep it controlled".to_string()
                }
            }
        }
    }

    fn issue_text(&self, issue: FormIssue) -> &'static str {
        match issue {
            FormIssue::ShallowRange => self.exercise.depth_cue(),
            FormIssue::TrunkDrift => "Keep your back straight",
            FormIssue::UnevenTempo => "Move at an even pace",
        }
    }

    fn phase_text(&self, phase: RepPhase, rep_count: u32) -> &'static str {
        match phase {
            RepPhase::Idle if rep_count == 0 => GET_READY_TEXT,
            RepPhase::Idle => "Ready for the next rep",
            RepPhase::Ascending => self.exercise.depth_cue(),
            RepPhase::Holding => "Good range, now return slowly",
            RepPhase::Descending => "Back to the start position",
        }
    }

    /// Forget announcements and held text. Audio preference survives.
    pub fn reset(&mut self) {
        self.last_announced = 0;
        self.last_text.clear();
        self.held = None;
        self.skipped_frames = 0;
    }

    pub fn rebind(&mut self, exercise: ExerciseType) {
        self.exercise = exercise;
        self.reset();
    }
}

fn tempo_text(issue: TempoIssue) -> &'static str {
    match issue {
        TempoIssue::TooFast => "Slow down",
        TempoIssue::TooSlow => "Keep a steady pace",
    }
}
