//! Rep engine facade - one instance per displayed exercise
//!
//! Ties angle extraction, the rep state machine, scoring, ROM tracking,
//! the error spotlight and feedback together behind a single per-frame
//! `update()`. `update()` is total: every frame yields a `RepOutput`.

use serde::Serialize;

use super::angles::{extract_angle, trunk_angle};
use super::config::EngineConfig;
use super::exercise::{DifficultyLevel, ExerciseType};
use super::feedback::{FeedbackEmitter, FeedbackInput, FeedbackSink, RepAnnouncement};
use super::filter::AngleFilter;
use super::rep_machine::{RepPhase, RepStateMachine, RepThresholds};
use super::rom::{PersonalizedRom, RomTracker};
use super::scoring::{FormClass, RepScorer};
use super::spotlight::{ErrorSpotlight, SpotlightDetector};
use crate::error::EngineError;
use crate::pose::{tracking_quality, LandmarkFrame, Side};

pub const PAUSED_TEXT: &str = "Paused";

/// One completed rep, immutable once emitted
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepEvent {
    pub rep_index: u32,
    pub max_angle: f32,
    pub min_angle: f32,
    pub form_score: f32,
    pub tempo_score: f32,
    pub form_class: FormClass,
    pub duration_ms: f64,
}

/// Everything the UI needs for this frame
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepOutput {
    pub feedback: String,
    pub feedback_changed: bool,
    pub current_angle: Option<f32>,
    pub error_spotlight: Option<ErrorSpotlight>,
    #[serde(rename = "personalizedROM")]
    pub personalized_rom: Option<PersonalizedRom>,
    pub rep_count: u32,
    /// Most recent completed rep (stays set until reset)
    pub last_rep: Option<RepEvent>,
    /// True only on the frame `last_rep` was produced
    pub rep_completed: bool,
    pub phase: RepPhase,
    pub tracking_quality: u8,
    pub announcement: Option<RepAnnouncement>,
    pub paused: bool,
}

/// Running session totals (no per-rep log is kept here)
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub exercise: ExerciseType,
    pub side: Side,
    pub difficulty: DifficultyLevel,
    pub rep_count: u32,
    pub best_rom: Option<f32>,
    pub mean_form_score: Option<f32>,
    pub mean_tempo_score: Option<f32>,
}

pub struct RepEngine {
    config: EngineConfig,
    exercise: ExerciseType,
    side: Side,
    difficulty: DifficultyLevel,
    paused: bool,

    machine: RepStateMachine,
    filter: Option<AngleFilter>,
    scorer: RepScorer,
    rom: RomTracker,
    spotlight: SpotlightDetector,
    feedback: FeedbackEmitter,

    last_angle: Option<f32>,
    last_rep: Option<RepEvent>,
    last_timestamp_ms: Option<f64>,
    form_sum: f32,
    tempo_sum: f32,
}

impl RepEngine {
    /// Validate the configuration and build an engine for one exercise and side
    pub fn new(exercise: ExerciseType, side: Side, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let difficulty = DifficultyLevel::default();
        let thresholds = config.thresholds(exercise);
        Ok(Self {
            machine: RepStateMachine::new(RepThresholds::for_exercise(&config, exercise)),
            filter: config.smoothing.map(AngleFilter::new),
            scorer: RepScorer::new(config.scoring.clone(), config.tempo.clone()),
            rom: RomTracker::new(
                config.rom.clone(),
                exercise,
                side,
                thresholds.default_target_rom_deg,
                difficulty,
            ),
            spotlight: SpotlightDetector::new(config.spotlight.clone(), exercise, side, config.confidence_floor),
            feedback: FeedbackEmitter::new(config.feedback.clone(), exercise),
            config,
            exercise,
            side,
            difficulty,
            paused: false,
            last_angle: None,
            last_rep: None,
            last_timestamp_ms: None,
            form_sum: 0.0,
            tempo_sum: 0.0,
        })
    }

    /// Parse exercise and side names coming from the UI
    pub fn from_names(exercise: &str, side: &str, config: EngineConfig) -> Result<Self, EngineError> {
        Self::new(exercise.parse()?, side.parse()?, config)
    }

    pub fn exercise(&self) -> ExerciseType {
        self.exercise
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn difficulty(&self) -> DifficultyLevel {
        self.difficulty
    }

    pub fn phase(&self) -> RepPhase {
        self.machine.phase()
    }

    pub fn rep_count(&self) -> u32 {
        self.machine.rep_count()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read-only view of the state machine (extrema, history)
    pub fn machine(&self) -> &RepStateMachine {
        &self.machine
    }

    pub fn personalized_rom(&self) -> PersonalizedRom {
        self.rom.snapshot(self.in_progress_rom())
    }

    /// Process one frame
    pub fn update(&mut self, frame: &LandmarkFrame) -> RepOutput {
        if self.paused {
            return self.paused_output();
        }

        let now = frame.timestamp_ms;
        if let Some(prev) = self.last_timestamp_ms {
            if now < prev {
                tracing::warn!(prev, now, "non-monotonic frame timestamp; tempo for this rep is clamped");
            }
        }
        self.last_timestamp_ms = Some(now);

        let quality = tracking_quality(frame);
        let floor = self.config.confidence_floor;

        // Low-confidence frames hold the machine where it is
        let angle = extract_angle(frame, self.exercise, self.side, floor).map(|raw| match self.filter.as_mut() {
            Some(filter) => filter.filter(now, raw),
            None => raw,
        });

        let mut completed_score = None;
        if let Some(angle) = angle {
            self.last_angle = Some(angle);
            let trunk = trunk_angle(frame, floor);
            if let Some(rep) = self.machine.update(angle, now, trunk) {
                let score = self.scorer.score(&rep, self.rom.target_rom(), self.difficulty);
                self.rom.record(rep.rom());

                self.form_sum += score.form_score;
                self.tempo_sum += score.tempo_score;
                self.last_rep = Some(RepEvent {
                    rep_index: rep.rep_index,
                    max_angle: rep.max_angle,
                    min_angle: rep.min_angle,
                    form_score: score.form_score,
                    tempo_score: score.tempo_score,
                    form_class: score.class,
                    duration_ms: rep.duration_ms,
                });
                completed_score = Some(score);
            }
        }

        let spotlight = self.spotlight.update(frame);
        let threshold = self.config.spotlight.display_threshold;
        let spotlight_message = spotlight
            .as_ref()
            .filter(|s| s.error_magnitude > threshold)
            .map(|s| s.message);

        let feedback = self.feedback.compose(&FeedbackInput {
            timestamp_ms: now,
            angle_valid: angle.is_some(),
            tracking_quality: quality,
            phase: self.machine.phase(),
            rep_count: self.machine.rep_count(),
            completed: completed_score.as_ref(),
            spotlight_message,
        });

        RepOutput {
            feedback: feedback.text,
            feedback_changed: feedback.changed,
            current_angle: angle,
            error_spotlight: spotlight,
            personalized_rom: Some(self.personalized_rom()),
            rep_count: self.machine.rep_count(),
            last_rep: self.last_rep,
            rep_completed: completed_score.is_some(),
            phase: self.machine.phase(),
            tracking_quality: quality,
            announcement: feedback.announcement,
            paused: false,
        }
    }

    /// `update` plus delivery of any rep announcement to the audio sink
    pub fn update_with_sink(&mut self, frame: &LandmarkFrame, sink: &mut dyn FeedbackSink) -> RepOutput {
        let output = self.update(frame);
        if let Some(a) = output.announcement {
            sink.announce_rep(a.rep_count, a.form_score);
        }
        output
    }

    /// Range covered so far in the current rep
    fn in_progress_rom(&self) -> f32 {
        match (self.machine.max_angle_in_rep(), self.machine.min_angle_in_rep()) {
            (Some(max), Some(min)) => max - min,
            _ => 0.0,
        }
    }

    /// State snapshot while paused; nothing is mutated
    fn paused_output(&self) -> RepOutput {
        RepOutput {
            feedback: PAUSED_TEXT.to_string(),
            feedback_changed: false,
            current_angle: self.last_angle,
            error_spotlight: None,
            personalized_rom: Some(self.personalized_rom()),
            rep_count: self.machine.rep_count(),
            last_rep: self.last_rep,
            rep_completed: false,
            phase: self.machine.phase(),
            tracking_quality: 0,
            announcement: None,
            paused: true,
        }
    }

    /// Pausing keeps every piece of state; resuming continues the same rep
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Takes effect on the next frame; completed reps keep their scores
    pub fn set_difficulty(&mut self, difficulty: DifficultyLevel) {
        self.difficulty = difficulty;
        self.rom.set_difficulty(difficulty);
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.feedback.set_audio_enabled(enabled);
    }

    /// Force idle and clear count, extrema, ROM best and feedback state
    pub fn reset(&mut self) {
        self.machine.reset();
        if let Some(filter) = self.filter.as_mut() {
            filter.reset();
        }
        self.rom.reset();
        self.spotlight.reset();
        self.feedback.reset();
        self.last_angle = None;
        self.last_rep = None;
        self.last_timestamp_ms = None;
        self.form_sum = 0.0;
        self.tempo_sum = 0.0;
    }

    /// Change exercise or side in place (reuses all buffers)
    pub fn switch_exercise(&mut self, exercise: ExerciseType, side: Side) -> Result<(), EngineError> {
        self.config.validate()?;

        self.exercise = exercise;
        self.side = side;
        self.machine.set_thresholds(RepThresholds::for_exercise(&self.config, exercise));
        self.rom.rebind(exercise, side, self.config.thresholds(exercise).default_target_rom_deg);
        self.spotlight.rebind(exercise, side);
        self.feedback.rebind(exercise);
        self.reset();
        Ok(())
    }

    pub fn summary(&self) -> SessionSummary {
        let reps = self.machine.rep_count();
        let mean = |sum: f32| if reps > 0 { Some(sum / reps as f32) } else { None };
        SessionSummary {
            exercise: self.exercise,
            side: self.side,
            difficulty: self.difficulty,
            rep_count: reps,
            best_rom: self.rom.best_achieved_rom(),
            mean_form_score: mean(self.form_sum),
            mean_tempo_score: mean(self.tempo_sum),
        }
    }
}
