//! Engine configuration
//!
//! Every tuned constant lives here so clinicians can recalibrate without a
//! rebuild. The JS side may send a partial JSON object; missing fields fall
//! back to the defaults below.

use serde::{Deserialize, Serialize};

use super::exercise::{DifficultyLevel, ExerciseType};
use crate::error::EngineError;

/// One value per difficulty level
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyTable<T> {
    pub easy: T,
    pub normal: T,
    pub hard: T,
}

impl<T: Copy> DifficultyTable<T> {
    pub fn get(&self, level: DifficultyLevel) -> T {
        match level {
            DifficultyLevel::Easy => self.easy,
            DifficultyLevel::Normal => self.normal,
            DifficultyLevel::Hard => self.hard,
        }
    }
}

/// Angle thresholds for one exercise
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExerciseThresholds {
    /// Rest position ("up" for squats, "down" for curls and leg raises)
    pub start_deg: f32,
    /// Angle that must be crossed for the rep to count
    pub bottom_deg: f32,
    /// Target ROM used until the patient has completed a rep
    pub default_target_rom_deg: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToleranceProfile {
    /// Fraction of target ROM the patient may fall short by without penalty
    pub rom_shortfall: f32,
    /// Trunk drift allowed during a rep before it costs points
    pub trunk_drift_deg: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Points lost per unit of ROM fraction below the depth floor
    pub rom_penalty_scale: f32,
    pub rom_penalty_cap: f32,
    pub trunk_penalty_per_deg: f32,
    pub trunk_penalty_cap: f32,
    /// Allowed |descent - return| / total time imbalance
    pub asymmetry_tolerance: f32,
    pub asymmetry_penalty_scale: f32,
    pub asymmetry_penalty_cap: f32,
    pub tolerances: DifficultyTable<ToleranceProfile>,
    /// formScore strictly above this is "good"
    pub good_above: f32,
    /// formScore at or above this is "fair"
    pub fair_from: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            rom_penalty_scale: 120.0,
            rom_penalty_cap: 60.0,
            trunk_penalty_per_deg: 2.0,
            trunk_penalty_cap: 30.0,
            asymmetry_tolerance: 0.35,
            asymmetry_penalty_scale: 60.0,
            asymmetry_penalty_cap: 20.0,
            tolerances: DifficultyTable {
                easy: ToleranceProfile { rom_shortfall: 0.25, trunk_drift_deg: 20.0 },
                normal: ToleranceProfile { rom_shortfall: 0.15, trunk_drift_deg: 15.0 },
                hard: ToleranceProfile { rom_shortfall: 0.05, trunk_drift_deg: 10.0 },
            },
            good_above: 80.0,
            fair_from: 60.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    /// Faster than this is momentum, not control
    pub min_safe_ms: f64,
    /// Slower than this suggests a stall or lost tracking
    pub max_expected_ms: f64,
    pub fast_penalty_scale: f32,
    pub slow_penalty_scale: f32,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            min_safe_ms: 1000.0,
            max_expected_ms: 8000.0,
            fast_penalty_scale: 100.0,
            slow_penalty_scale: 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RomConfig {
    /// Fraction of best-achieved ROM required for full marks
    pub target_fraction: DifficultyTable<f32>,
}

impl Default for RomConfig {
    fn default() -> Self {
        Self {
            target_fraction: DifficultyTable { easy: 0.8, normal: 0.9, hard: 1.0 },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotlightConfig {
    /// Magnitudes at or below this are "no error"
    pub display_threshold: f32,
    /// Frames a new candidate must persist before the highlight moves
    pub debounce_frames: u32,
    pub squat_trunk_lean_deg: f32,
    pub curl_trunk_lean_deg: f32,
    /// 1 - knee spread / ankle spread
    pub knee_valgus_ratio: f32,
    /// Ankle spread below this means a side view, valgus is not measurable
    pub min_frontal_spread: f32,
    /// Hip height difference relative to torso length
    pub hip_level_ratio: f32,
    pub knee_bend_deg: f32,
    pub other_leg_bend_deg: f32,
    pub upper_arm_drift_deg: f32,
}

impl Default for SpotlightConfig {
    fn default() -> Self {
        Self {
            display_threshold: 0.3,
            debounce_frames: 4,
            squat_trunk_lean_deg: 45.0,
            curl_trunk_lean_deg: 12.0,
            knee_valgus_ratio: 0.25,
            min_frontal_spread: 0.06,
            hip_level_ratio: 0.08,
            knee_bend_deg: 15.0,
            other_leg_bend_deg: 20.0,
            upper_arm_drift_deg: 25.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// How long a post-rep message stays up before live cues resume
    pub hold_ms: f64,
    /// Consecutive skipped frames before asking the patient to reposition
    pub lost_tracking_frames: u32,
    pub min_tracking_quality: u8,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            hold_ms: 1500.0,
            lost_tracking_frames: 10,
            min_tracking_quality: 50,
        }
    }
}

/// One-euro filter parameters for the tracked angle
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    pub min_cutoff: f32,
    pub beta: f32,
    pub d_cutoff: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { min_cutoff: 2.0, beta: 0.3, d_cutoff: 1.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Landmarks below this visibility are ignored
    pub confidence_floor: f32,
    /// Jitter absorbed around the rest position
    pub noise_margin_deg: f32,
    /// Extra depth past `bottom_deg` required for a rep to count
    pub min_depth_margin_deg: f32,
    pub squat: ExerciseThresholds,
    pub straight_leg_raise: ExerciseThresholds,
    pub elbow_flexion: ExerciseThresholds,
    pub scoring: ScoringConfig,
    pub tempo: TempoConfig,
    pub rom: RomConfig,
    pub spotlight: SpotlightConfig,
    pub feedback: FeedbackConfig,
    /// `None` feeds raw angles straight into the rep state machine
    pub smoothing: Option<SmoothingConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.5,
            noise_margin_deg: 3.0,
            min_depth_margin_deg: 10.0,
            squat: ExerciseThresholds {
                start_deg: 160.0,
                bottom_deg: 120.0,
                default_target_rom_deg: 60.0,
            },
            straight_leg_raise: ExerciseThresholds {
                start_deg: 10.0,
                bottom_deg: 35.0,
                default_target_rom_deg: 30.0,
            },
            elbow_flexion: ExerciseThresholds {
                start_deg: 150.0,
                bottom_deg: 80.0,
                default_target_rom_deg: 70.0,
            },
            scoring: ScoringConfig::default(),
            tempo: TempoConfig::default(),
            rom: RomConfig::default(),
            spotlight: SpotlightConfig::default(),
            feedback: FeedbackConfig::default(),
            smoothing: Some(SmoothingConfig::default()),
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON configuration and validate it
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn thresholds(&self, exercise: ExerciseType) -> &ExerciseThresholds {
        match exercise {
            ExerciseType::Squat => &self.squat,
            ExerciseType::StraightLegRaise => &self.straight_leg_raise,
            ExerciseType::ElbowFlexion => &self.elbow_flexion,
        }
    }

    /// Reject configurations that would produce silently wrong reps
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: String| Err(EngineError::InvalidConfig(msg));

        if !(self.confidence_floor > 0.0 && self.confidence_floor <= 1.0) {
            return invalid(format!("confidence_floor {} must be in (0, 1]", self.confidence_floor));
        }
        if !(self.noise_margin_deg >= 0.0) || !(self.min_depth_margin_deg >= 0.0) {
            return invalid("hysteresis margins must be non-negative".to_string());
        }

        for exercise in [ExerciseType::Squat, ExerciseType::StraightLegRaise, ExerciseType::ElbowFlexion] {
            let t = self.thresholds(exercise);
            let depth = exercise.direction().excursion(t.start_deg, t.bottom_deg);
            if !(depth > self.noise_margin_deg) {
                return invalid(format!(
                    "{}: bottom_deg {} must lie more than the noise margin beyond start_deg {} in the working direction",
                    exercise.as_str(), t.bottom_deg, t.start_deg
                ));
            }
            if !(t.default_target_rom_deg > 0.0) {
                return invalid(format!("{}: default_target_rom_deg must be positive", exercise.as_str()));
            }
        }

        if !(self.tempo.min_safe_ms > 0.0 && self.tempo.min_safe_ms < self.tempo.max_expected_ms) {
            return invalid("tempo.min_safe_ms must be positive and below tempo.max_expected_ms".to_string());
        }
        if !(0.0..=1.0).contains(&self.spotlight.display_threshold) {
            return invalid("spotlight.display_threshold must be in [0, 1]".to_string());
        }
        if self.scoring.fair_from > self.scoring.good_above {
            return invalid("scoring.fair_from must not exceed scoring.good_above".to_string());
        }
        for level in [DifficultyLevel::Easy, DifficultyLevel::Normal, DifficultyLevel::Hard] {
            if !(self.rom.target_fraction.get(level) > 0.0) {
                return invalid(format!("rom.target_fraction.{} must be positive", level.as_str()));
            }
        }
        if let Some(s) = &self.smoothing {
            if !(s.min_cutoff > 0.0 && s.d_cutoff > 0.0 && s.beta >= 0.0) {
                return invalid("smoothing cutoffs must be positive".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "noise_margin_deg": 4.0, "smoothing": null }"#).unwrap();
        assert_eq!(config.noise_margin_deg, 4.0);
        assert_eq!(config.min_depth_margin_deg, 10.0);
        assert!(config.smoothing.is_none());
        assert_eq!(config.squat.start_deg, 160.0);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = EngineConfig::default();
        config.squat.bottom_deg = 170.0;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_json_is_config_error() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_difficulty_table_lookup() {
        let rom = RomConfig::default();
        assert!(rom.target_fraction.get(DifficultyLevel::Easy) < rom.target_fraction.get(DifficultyLevel::Hard));
    }
}
