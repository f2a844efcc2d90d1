//! Personalized range-of-motion tracker
//!
//! The target is a fraction of the patient's own best rep this session,
//! not a population average. Difficulty picks the fraction; it never
//! touches the recorded best.

use serde::Serialize;

use super::config::RomConfig;
use super::exercise::{DifficultyLevel, ExerciseType};
use crate::pose::Side;

/// ROM progress snapshot for the UI
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedRom {
    pub best_achieved_rom: Option<f32>,
    pub target_rom: f32,
    /// Range covered so far in the in-progress rep
    pub current_rom: f32,
    /// `current_rom / target_rom`, 1.0 = target reached
    pub progress: f32,
    pub difficulty: DifficultyLevel,
}

pub struct RomTracker {
    config: RomConfig,
    exercise: ExerciseType,
    side: Side,
    difficulty: DifficultyLevel,
    /// Used until the first rep lands
    default_target: f32,
    best: Option<f32>,
}

impl RomTracker {
    pub fn new(
        config: RomConfig,
        exercise: ExerciseType,
        side: Side,
        default_target: f32,
        difficulty: DifficultyLevel,
    ) -> Self {
        Self {
            config,
            exercise,
            side,
            difficulty,
            default_target,
            best: None,
        }
    }

    pub fn best_achieved_rom(&self) -> Option<f32> {
        self.best
    }

    /// ROM needed for full marks at the current difficulty
    pub fn target_rom(&self) -> f32 {
        let fraction = self.config.target_fraction.get(self.difficulty);
        self.best.unwrap_or(self.default_target) * fraction
    }

    /// Record a completed rep. Returns true on a new personal best.
    pub fn record(&mut self, rom: f32) -> bool {
        if !rom.is_finite() || rom <= 0.0 {
            return false;
        }
        match self.best {
            Some(best) if best >= rom => false,
            _ => {
                tracing::debug!(
                    exercise = self.exercise.as_str(),
                    side = self.side.as_str(),
                    rom,
                    "new best range of motion"
                );
                self.best = Some(rom);
                true
            }
        }
    }

    /// Changes how the target is derived; the recorded best is kept
    pub fn set_difficulty(&mut self, difficulty: DifficultyLevel) {
        self.difficulty = difficulty;
    }

    pub fn snapshot(&self, current_rom: f32) -> PersonalizedRom {
        let target_rom = self.target_rom();
        let current_rom = current_rom.max(0.0);
        PersonalizedRom {
            best_achieved_rom: self.best,
            target_rom,
            current_rom,
            progress: if target_rom > 0.0 { current_rom / target_rom } else { 0.0 },
            difficulty: self.difficulty,
        }
    }

    /// Rebind to a new exercise/side and forget the best
    pub fn rebind(&mut self, exercise: ExerciseType, side: Side, default_target: f32) {
        self.exercise = exercise;
        self.side = side;
        self.default_target = default_target;
        self.best = None;
    }

    pub fn reset(&mut self) {
        self.best = None;
    }
}
