//! Rep state machine with hysteresis
//!
//! Cycle: idle → ascending → holding → descending → idle.
//! "Ascending" means moving away from rest in the working direction, so
//! the names hold for both closing (squat, curl) and opening (leg raise)
//! joints. A rep counts only on the return to rest, and only if the
//! deepest point cleared the bottom threshold by the minimum-depth margin.

use serde::Serialize;

use super::config::EngineConfig;
use super::exercise::{ExerciseType, WorkingDirection};
use super::history::{AngleHistory, AngleSample};

/// State-machine cursor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepPhase {
    #[default]
    Idle,
    Ascending,
    Holding,
    Descending,
}

impl RepPhase {
    pub fn name(&self) -> &'static str {
        match self {
            RepPhase::Idle => "IDLE",
            RepPhase::Ascending => "ASCENDING",
            RepPhase::Holding => "HOLDING",
            RepPhase::Descending => "DESCENDING",
        }
    }
}

/// Thresholds resolved for one exercise
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RepThresholds {
    pub start_deg: f32,
    pub bottom_deg: f32,
    pub noise_margin_deg: f32,
    pub min_depth_margin_deg: f32,
    pub direction: WorkingDirection,
}

impl RepThresholds {
    pub fn for_exercise(config: &EngineConfig, exercise: ExerciseType) -> Self {
        let t = config.thresholds(exercise);
        Self {
            start_deg: t.start_deg,
            bottom_deg: t.bottom_deg,
            noise_margin_deg: config.noise_margin_deg,
            min_depth_margin_deg: config.min_depth_margin_deg,
            direction: exercise.direction(),
        }
    }

    /// Signed travel from rest toward the working extreme
    pub fn excursion(&self, angle: f32) -> f32 {
        self.direction.excursion(self.start_deg, angle)
    }

    /// Travel needed to reach the bottom threshold
    pub fn depth(&self) -> f32 {
        self.excursion(self.bottom_deg)
    }

    /// Travel needed for the rep to count
    pub fn counting_depth(&self) -> f32 {
        self.depth() + self.min_depth_margin_deg
    }
}

/// Raw measurements of one counted rep, handed to the scorer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletedRep {
    pub rep_index: u32,
    pub max_angle: f32,
    pub min_angle: f32,
    pub duration_ms: f64,
    /// Rest → deepest point
    pub outbound_ms: f64,
    /// Deepest point → rest
    pub return_ms: f64,
    /// Largest trunk-angle change from the rep's starting posture
    pub max_trunk_drift_deg: f32,
}

impl CompletedRep {
    /// Achieved range of motion in degrees
    pub fn rom(&self) -> f32 {
        self.max_angle - self.min_angle
    }
}

pub struct RepStateMachine {
    thresholds: RepThresholds,
    phase: RepPhase,
    rep_count: u32,

    /// Samples of the in-progress rep (rest sample first)
    history: AngleHistory,

    // Per-rep extrema, cleared on return to idle
    min_angle: Option<f32>,
    max_angle: Option<f32>,
    peak_excursion: f32,
    peak_ms: f64,
    started_ms: f64,

    // Trunk posture
    trunk_reference: Option<f32>,
    max_trunk_drift: f32,

    /// Last sample seen while idle, becomes the first sample of the next rep
    rest: Option<(AngleSample, Option<f32>)>,
}

impl RepStateMachine {
    pub fn new(thresholds: RepThresholds) -> Self {
        Self {
            thresholds,
            phase: RepPhase::Idle,
            rep_count: 0,
            history: AngleHistory::new(),
            min_angle: None,
            max_angle: None,
            peak_excursion: 0.0,
            peak_ms: 0.0,
            started_ms: 0.0,
            trunk_reference: None,
            max_trunk_drift: 0.0,
            rest: None,
        }
    }

    pub fn phase(&self) -> RepPhase {
        self.phase
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn min_angle_in_rep(&self) -> Option<f32> {
        self.min_angle
    }

    pub fn max_angle_in_rep(&self) -> Option<f32> {
        self.max_angle
    }

    /// Deepest travel reached in the current rep (0 when idle)
    pub fn peak_excursion(&self) -> f32 {
        self.peak_excursion
    }

    /// Samples held for the in-progress rep
    pub fn history(&self) -> &AngleHistory {
        &self.history
    }

    /// Feed one valid angle sample. Returns the rep if this sample completed one.
    ///
    /// `trunk_deg` is the optional trunk-lean signal used for drift scoring.
    pub fn update(&mut self, angle: f32, timestamp_ms: f64, trunk_deg: Option<f32>) -> Option<CompletedRep> {
        let sample = AngleSample { angle, timestamp_ms };
        let excursion = self.thresholds.excursion(angle);
        let noise = self.thresholds.noise_margin_deg;

        if self.phase == RepPhase::Idle {
            if excursion > noise {
                self.begin_rep(sample, trunk_deg);
            } else {
                self.rest = Some((sample, trunk_deg));
            }
            return None;
        }

        let new_peak = self.track(sample, excursion, trunk_deg);

        match self.phase {
            RepPhase::Ascending => {
                if excursion >= self.thresholds.depth() {
                    self.phase = RepPhase::Holding;
                } else if excursion <= noise {
                    tracing::debug!(
                        peak = self.peak_excursion,
                        "movement returned to rest before reaching bottom threshold"
                    );
                    self.end_rep(sample, trunk_deg);
                }
            }
            RepPhase::Holding => {
                if excursion < self.peak_excursion - noise {
                    self.phase = RepPhase::Descending;
                }
            }
            RepPhase::Descending => {
                if excursion <= noise {
                    return self.finish(sample, trunk_deg);
                } else if new_peak {
                    self.phase = RepPhase::Holding;
                }
            }
            RepPhase::Idle => {}
        }

        None
    }

    /// Leave idle: seed the rep with the last rest sample
    fn begin_rep(&mut self, sample: AngleSample, trunk_deg: Option<f32>) {
        self.history.clear();
        // A rest sample from before a clock restart would make the timing negative
        let (rest, rest_trunk) = self
            .rest
            .filter(|(rest, _)| rest.timestamp_ms <= sample.timestamp_ms)
            .unwrap_or((sample, trunk_deg));

        self.history.push(rest);
        self.started_ms = rest.timestamp_ms;
        self.min_angle = Some(rest.angle);
        self.max_angle = Some(rest.angle);
        self.peak_excursion = self.thresholds.excursion(rest.angle).max(0.0);
        self.peak_ms = rest.timestamp_ms;
        self.trunk_reference = rest_trunk.or(trunk_deg);
        self.max_trunk_drift = 0.0;

        self.phase = RepPhase::Ascending;
        self.track(sample, self.thresholds.excursion(sample.angle), trunk_deg);
    }

    /// Record a sample inside a rep. Returns true if it set a new peak.
    fn track(&mut self, sample: AngleSample, excursion: f32, trunk_deg: Option<f32>) -> bool {
        self.history.push(sample);
        self.min_angle = Some(self.min_angle.map_or(sample.angle, |m| m.min(sample.angle)));
        self.max_angle = Some(self.max_angle.map_or(sample.angle, |m| m.max(sample.angle)));

        match (self.trunk_reference, trunk_deg) {
            (Some(reference), Some(trunk)) => {
                self.max_trunk_drift = self.max_trunk_drift.max((trunk - reference).abs());
            }
            (None, Some(trunk)) => self.trunk_reference = Some(trunk),
            _ => {}
        }

        if excursion > self.peak_excursion {
            self.peak_excursion = excursion;
            self.peak_ms = sample.timestamp_ms;
            true
        } else {
            false
        }
    }

    /// Back at rest: count the rep if it was deep enough
    fn finish(&mut self, sample: AngleSample, trunk_deg: Option<f32>) -> Option<CompletedRep> {
        let counted = self.peak_excursion >= self.thresholds.counting_depth();
        let rep = if counted {
            self.rep_count += 1;
            let ended_ms = sample.timestamp_ms;
            let rep = CompletedRep {
                rep_index: self.rep_count,
                max_angle: self.max_angle.unwrap_or(sample.angle),
                min_angle: self.min_angle.unwrap_or(sample.angle),
                duration_ms: self.history.span_ms().max(ended_ms - self.started_ms),
                outbound_ms: (self.peak_ms - self.started_ms).max(0.0),
                return_ms: (ended_ms - self.peak_ms).max(0.0),
                max_trunk_drift_deg: self.max_trunk_drift,
            };
            tracing::debug!(rep = rep.rep_index, rom = rep.rom(), duration_ms = rep.duration_ms, "rep completed");
            Some(rep)
        } else {
            tracing::debug!(
                peak = self.peak_excursion,
                required = self.thresholds.counting_depth(),
                "shallow rep ignored"
            );
            None
        };

        self.end_rep(sample, trunk_deg);
        rep
    }

    /// Return to idle and clear per-rep state
    fn end_rep(&mut self, sample: AngleSample, trunk_deg: Option<f32>) {
        self.phase = RepPhase::Idle;
        self.history.clear();
        self.min_angle = None;
        self.max_angle = None;
        self.peak_excursion = 0.0;
        self.trunk_reference = None;
        self.max_trunk_drift = 0.0;
        self.rest = Some((sample, trunk_deg));
    }

    /// Force idle and zero the counter
    pub fn reset(&mut self) {
        self.phase = RepPhase::Idle;
        self.rep_count = 0;
        self.history.clear();
        self.min_angle = None;
        self.max_angle = None;
        self.peak_excursion = 0.0;
        self.peak_ms = 0.0;
        self.started_ms = 0.0;
        self.trunk_reference = None;
        self.max_trunk_drift = 0.0;
        self.rest = None;
    }

    /// Swap thresholds (exercise change). Callers reset alongside.
    pub fn set_thresholds(&mut self, thresholds: RepThresholds) {
        self.thresholds = thresholds;
    }
}
