//! Exercise and difficulty definitions
//!
//! Exercise type is decided once when a session starts and never
//! re-derived from display strings afterwards.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Supported rehabilitation exercises
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    Squat,
    StraightLegRaise,
    ElbowFlexion,
}

impl ExerciseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::Squat => "squat",
            ExerciseType::StraightLegRaise => "straight_leg_raise",
            ExerciseType::ElbowFlexion => "elbow_flexion",
        }
    }

    /// Short name used in spoken and written feedback
    pub fn display_name(&self) -> &'static str {
        match self {
            ExerciseType::Squat => "squat",
            ExerciseType::StraightLegRaise => "leg raise",
            ExerciseType::ElbowFlexion => "curl",
        }
    }

    /// Which way the tracked angle moves as the patient works
    pub fn direction(&self) -> WorkingDirection {
        match self {
            // Knee and elbow interior angles close during the effort
            ExerciseType::Squat | ExerciseType::ElbowFlexion => WorkingDirection::Decreasing,
            // Hip flexion opens from ~0° lying flat
            ExerciseType::StraightLegRaise => WorkingDirection::Increasing,
        }
    }

    /// Coaching cue when the rep did not reach the target range
    pub fn depth_cue(&self) -> &'static str {
        match self {
            ExerciseType::Squat => "Go deeper",
            ExerciseType::StraightLegRaise => "Raise your leg higher",
            ExerciseType::ElbowFlexion => "Curl all the way up",
        }
    }
}

impl std::str::FromStr for ExerciseType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "squat" => Ok(ExerciseType::Squat),
            "straight_leg_raise" | "slr" => Ok(ExerciseType::StraightLegRaise),
            "elbow_flexion" => Ok(ExerciseType::ElbowFlexion),
            _ => Err(EngineError::UnknownExercise(s.to_string())),
        }
    }
}

/// Sign convention for the tracked angle during the working half of a rep
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkingDirection {
    Decreasing,
    Increasing,
}

impl WorkingDirection {
    /// Signed distance travelled from `start` toward the working extreme.
    /// Positive means "into the rep", negative means past the rest position.
    pub fn excursion(&self, start: f32, angle: f32) -> f32 {
        match self {
            WorkingDirection::Decreasing => start - angle,
            WorkingDirection::Increasing => angle - start,
        }
    }
}

/// Patient-selectable difficulty
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "easy",
            DifficultyLevel::Normal => "normal",
            DifficultyLevel::Hard => "hard",
        }
    }
}

impl std::str::FromStr for DifficultyLevel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(DifficultyLevel::Easy),
            "normal" | "medium" => Ok(DifficultyLevel::Normal),
            "hard" => Ok(DifficultyLevel::Hard),
            _ => Err(EngineError::UnknownDifficulty(s.to_string())),
        }
    }
}
