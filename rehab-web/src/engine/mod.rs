//! Engine module - rep detection, scoring and feedback
//!
//! Re-exports only. All logic in submodules.

mod angles;
mod config;
mod exercise;
mod facade;
mod feedback;
mod filter;
mod history;
mod rep_machine;
mod rom;
mod scoring;
mod spotlight;

pub use angles::{angle_between, extract_angle, joint_angle, joint_triple, trunk_angle};
pub use config::{
    DifficultyTable, EngineConfig, ExerciseThresholds, FeedbackConfig, RomConfig, ScoringConfig,
    SmoothingConfig, SpotlightConfig, TempoConfig, ToleranceProfile,
};
pub use exercise::{DifficultyLevel, ExerciseType, WorkingDirection};
pub use facade::{RepEngine, RepEvent, RepOutput, SessionSummary, PAUSED_TEXT};
pub use feedback::{FeedbackSink, RepAnnouncement, GET_READY_TEXT, LOST_TRACKING_TEXT};
pub use filter::AngleFilter;
pub use history::{AngleHistory, AngleSample, HISTORY_CAPACITY};
pub use rep_machine::{CompletedRep, RepPhase, RepStateMachine, RepThresholds};
pub use rom::{PersonalizedRom, RomTracker};
pub use scoring::{FormClass, FormIssue, RepScore, RepScorer, TempoIssue};
pub use spotlight::{ErrorSpotlight, LimbSegment, SpotlightDetector};
