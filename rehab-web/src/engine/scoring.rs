//! Form and tempo scoring
//!
//! Runs once per counted rep. Both scores start at 100 and lose points
//! for each fault; neither ever leaves [0, 100].

use serde::Serialize;

use super::config::{ScoringConfig, TempoConfig};
use super::exercise::DifficultyLevel;
use super::rep_machine::CompletedRep;

/// Bucket used for coaching text and UI colour
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormClass {
    Good,
    Fair,
    Improve,
}

/// Largest single contributor to a lost form point
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormIssue {
    ShallowRange,
    TrunkDrift,
    UnevenTempo,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TempoIssue {
    TooFast,
    TooSlow,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RepScore {
    pub form_score: f32,
    pub tempo_score: f32,
    pub class: FormClass,
    pub issue: Option<FormIssue>,
    pub tempo_issue: Option<TempoIssue>,
}

pub struct RepScorer {
    scoring: ScoringConfig,
    tempo: TempoConfig,
}

impl RepScorer {
    pub fn new(scoring: ScoringConfig, tempo: TempoConfig) -> Self {
        Self { scoring, tempo }
    }

    /// Score a completed rep against the current ROM target
    pub fn score(&self, rep: &CompletedRep, target_rom: f32, difficulty: DifficultyLevel) -> RepScore {
        let tolerance = self.scoring.tolerances.get(difficulty);

        // ROM shortfall below the depth floor, proportional
        let rom_penalty = if target_rom > 0.0 {
            let ratio = rep.rom() / target_rom;
            let floor = 1.0 - tolerance.rom_shortfall;
            ((floor - ratio).max(0.0) * self.scoring.rom_penalty_scale).min(self.scoring.rom_penalty_cap)
        } else {
            0.0
        };

        let trunk_penalty = ((rep.max_trunk_drift_deg - tolerance.trunk_drift_deg).max(0.0)
            * self.scoring.trunk_penalty_per_deg)
            .min(self.scoring.trunk_penalty_cap);

        let asymmetry_penalty = {
            let total = rep.outbound_ms + rep.return_ms;
            if total > 0.0 {
                let asymmetry = ((rep.outbound_ms - rep.return_ms).abs() / total) as f32;
                ((asymmetry - self.scoring.asymmetry_tolerance).max(0.0) * self.scoring.asymmetry_penalty_scale)
                    .min(self.scoring.asymmetry_penalty_cap)
            } else {
                0.0
            }
        };

        let form_score = (100.0 - rom_penalty - trunk_penalty - asymmetry_penalty).clamp(0.0, 100.0);

        let issue = [
            (FormIssue::ShallowRange, rom_penalty),
            (FormIssue::TrunkDrift, trunk_penalty),
            (FormIssue::UnevenTempo, asymmetry_penalty),
        ]
        .into_iter()
        .filter(|(_, penalty)| *penalty > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(issue, _)| issue);

        let (tempo_score, tempo_issue) = self.tempo_score(rep.duration_ms);

        RepScore {
            form_score,
            tempo_score,
            class: self.classify(form_score),
            issue,
            tempo_issue,
        }
    }

    /// Penalize momentum-driven reps and stalls
    pub fn tempo_score(&self, duration_ms: f64) -> (f32, Option<TempoIssue>) {
        let t = &self.tempo;
        let duration_ms = duration_ms.max(0.0);

        let (penalty, issue) = if duration_ms < t.min_safe_ms {
            let short = ((t.min_safe_ms - duration_ms) / t.min_safe_ms) as f32;
            (short * t.fast_penalty_scale, Some(TempoIssue::TooFast))
        } else if duration_ms > t.max_expected_ms {
            let long = ((duration_ms - t.max_expected_ms) / t.max_expected_ms) as f32;
            (long * t.slow_penalty_scale, Some(TempoIssue::TooSlow))
        } else {
            (0.0, None)
        };

        ((100.0 - penalty).clamp(0.0, 100.0), issue)
    }

    pub fn classify(&self, form_score: f32) -> FormClass {
        if form_score > self.scoring.good_above {
            FormClass::Good
        } else if form_score >= self.scoring.fair_from {
            FormClass::Fair
        } else {
            FormClass::Improve
        }
    }
}

impl Default for RepScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default(), TempoConfig::default())
    }
}
