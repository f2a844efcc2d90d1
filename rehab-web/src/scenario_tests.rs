//! End-to-end rep counting over synthetic pose sequences

use crate::engine::{
    DifficultyLevel, EngineConfig, ExerciseType, FeedbackSink, RepEngine, RepEvent, RepOutput, RepPhase,
    LOST_TRACKING_TEXT, PAUSED_TEXT,
};
use crate::pose::test_support::PoseBuilder;
use crate::pose::{LandmarkFrame, Side, LEFT_KNEE};

const FRAME_MS: f64 = 1000.0 / 30.0;

/// Counts announcements instead of speaking them
#[derive(Default)]
struct RecordingSink {
    calls: Vec<(u32, f32)>,
}

impl FeedbackSink for RecordingSink {
    fn announce_rep(&mut self, rep_count: u32, form_score: f32) {
        self.calls.push((rep_count, form_score));
    }

    fn set_enabled(&mut self, _enabled: bool) {}

    fn reset(&mut self) {
        self.calls.clear();
    }
}

/// Squat thresholds {start 170, bottom 100, noise 3, depth margin 10}, raw angles
fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.squat.start_deg = 170.0;
    config.squat.bottom_deg = 100.0;
    config.noise_margin_deg = 3.0;
    config.min_depth_margin_deg = 10.0;
    config.smoothing = None;
    config
}

struct Session {
    engine: RepEngine,
    sink: RecordingSink,
    t: f64,
}

impl Session {
    fn squat(config: EngineConfig) -> Self {
        Self {
            engine: RepEngine::new(ExerciseType::Squat, Side::Left, config).unwrap(),
            sink: RecordingSink::default(),
            t: 0.0,
        }
    }

    fn frame(&mut self, frame: LandmarkFrame) -> RepOutput {
        let out = self.engine.update_with_sink(&frame, &mut self.sink);
        self.t += FRAME_MS;
        out
    }

    fn knee(&mut self, angle: f32) -> RepOutput {
        let frame = PoseBuilder::standing().with_knee_angle(angle).build(self.t);
        self.frame(frame)
    }

    fn knees(&mut self, angles: impl IntoIterator<Item = f32>) -> Vec<RepOutput> {
        angles.into_iter().map(|a| self.knee(a)).collect()
    }

    /// Rest, down to `bottom`, back up, rest. 4° per frame.
    fn squat_rep(&mut self, bottom: f32) -> Vec<RepOutput> {
        let steps = ((170.0 - bottom) / 4.0).round() as usize;
        let mut angles = vec![170.0; 5];
        angles.extend(ramp(170.0, bottom, steps));
        angles.extend(ramp(bottom, 170.0, steps));
        angles.extend([170.0; 5]);
        self.knees(angles)
    }
}

/// `steps` values from just after `from` up to and including `to`
fn ramp(from: f32, to: f32, steps: usize) -> Vec<f32> {
    (1..=steps)
        .map(|i| from + (to - from) * i as f32 / steps as f32)
        .collect()
}

fn completed(outputs: &[RepOutput]) -> Vec<RepEvent> {
    outputs
        .iter()
        .filter(|o| o.rep_completed)
        .filter_map(|o| o.last_rep)
        .collect()
}

/// Small deterministic jitter in [-2, 2]
struct Jitter(u32);

impl Jitter {
    fn next(&mut self) -> f32 {
        self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        ((self.0 >> 16) % 5) as f32 - 2.0
    }
}

#[test]
fn test_clean_squat_end_to_end() {
    // 3 s at 30 fps: 15 rest, 30 down to 95, 30 back up, 15 rest
    let mut session = Session::squat(EngineConfig::default());
    let mut angles = vec![170.0; 15];
    angles.extend(ramp(170.0, 95.0, 30));
    angles.extend(ramp(95.0, 170.0, 30));
    angles.extend([170.0; 15]);
    assert_eq!(angles.len(), 90);

    let outputs = session.knees(angles);
    let last = outputs.last().unwrap();

    assert_eq!(last.rep_count, 1);
    assert_eq!(last.phase, RepPhase::Idle);
    let rep = last.last_rep.unwrap();
    assert!(rep.form_score >= 80.0, "form score {}", rep.form_score);
    assert!(rep.min_angle < 100.0);

    assert_eq!(completed(&outputs).len(), 1);
    assert_eq!(session.sink.calls.len(), 1);
    assert_eq!(session.sink.calls[0].0, 1);
    assert!(outputs.iter().all(|o| o.tracking_quality == 90));
}

#[test]
fn test_jitter_near_rest_counts_once() {
    let mut session = Session::squat(test_config());
    let mut jitter = Jitter(7);

    let rest: Vec<f32> = (0..10).map(|i| if i % 2 == 0 { 168.0 } else { 172.0 }).collect();
    let mut angles = rest.clone();
    angles.extend(ramp(170.0, 85.0, 20).into_iter().map(|a| a + jitter.next()));
    angles.extend(ramp(85.0, 170.0, 20).into_iter().map(|a| a + jitter.next()));
    angles.extend(rest);

    let outputs = session.knees(angles);
    assert_eq!(outputs.last().unwrap().rep_count, 1);
    assert_eq!(completed(&outputs).len(), 1);
}

#[test]
fn test_shallow_rep_not_counted() {
    let mut session = Session::squat(test_config());
    let outputs = session.squat_rep(120.0);

    assert!(outputs.iter().all(|o| o.rep_count == 0));
    assert!(outputs.iter().all(|o| o.phase != RepPhase::Holding));
    assert_eq!(outputs.last().unwrap().phase, RepPhase::Idle);
    assert!(session.sink.calls.is_empty());
}

#[test]
fn test_rep_count_is_monotonic() {
    let mut session = Session::squat(test_config());
    let mut jitter = Jitter(42);
    let mut previous = 0;

    for _ in 0..3 {
        let mut angles = vec![170.0; 6];
        angles.extend(ramp(170.0, 80.0, 24));
        angles.extend(ramp(80.0, 170.0, 24));
        angles.extend([170.0; 6]);

        for angle in angles {
            let out = session.knee(angle + jitter.next());
            assert!(out.rep_count >= previous);
            previous = out.rep_count;
        }
    }

    assert_eq!(previous, 3);
    assert_eq!(session.engine.summary().rep_count, 3);
}

#[test]
fn test_double_reset_equals_single_reset() {
    let mut once = Session::squat(test_config());
    let mut twice = Session::squat(test_config());
    once.squat_rep(80.0);
    twice.squat_rep(80.0);

    once.engine.reset();
    twice.engine.reset();
    twice.engine.reset();

    assert_eq!(twice.engine.rep_count(), 0);
    assert_eq!(twice.engine.phase(), RepPhase::Idle);
    assert!(twice.engine.personalized_rom().best_achieved_rom.is_none());
    assert_eq!(once.engine.summary(), twice.engine.summary());

    let a = once.knee(170.0);
    let b = twice.knee(170.0);
    assert_eq!(a, b);
    assert_eq!(a.rep_count, 0);
    assert!(a.last_rep.is_none());
}

#[test]
fn test_pause_mid_hold_resumes_same_rep() {
    let mut session = Session::squat(test_config());
    let mut angles = vec![170.0; 5];
    angles.extend(ramp(170.0, 90.0, 20));
    angles.extend([90.0; 3]);
    session.knees(angles);
    assert_eq!(session.engine.phase(), RepPhase::Holding);

    session.engine.set_paused(true);
    // Standing frames while paused must not end the rep
    for out in session.knees([170.0; 20]) {
        assert!(out.paused);
        assert_eq!(out.feedback, PAUSED_TEXT);
        assert_eq!(out.phase, RepPhase::Holding);
        assert_eq!(out.rep_count, 0);
        assert!(out.announcement.is_none());
    }
    assert_eq!(session.engine.machine().min_angle_in_rep().map(f32::round), Some(90.0));

    session.engine.set_paused(false);
    let outputs = session.knees(ramp(90.0, 170.0, 20));
    let last = outputs.last().unwrap();
    assert!(!last.paused);
    assert_eq!(last.rep_count, 1);
    let rep = last.last_rep.unwrap();
    assert_eq!(rep.rep_index, 1);
    assert!((rep.min_angle - 90.0).abs() < 0.01);
    assert!((rep.max_angle - 170.0).abs() < 0.01);
}

#[test]
fn test_difficulty_change_keeps_earlier_scores() {
    let mut session = Session::squat(test_config());
    let mut events = Vec::new();

    // Three deep reps (ROM 100) set the best
    for _ in 0..3 {
        events.extend(completed(&session.squat_rep(70.0)));
    }
    assert_eq!(events.len(), 3);
    let mean_before = session.engine.summary().mean_form_score.unwrap();

    session.engine.set_difficulty(DifficultyLevel::Hard);
    assert_eq!(session.engine.summary().mean_form_score.unwrap(), mean_before);

    // Two reps at ROM 84: fine on normal (target 90), short on hard (target 100)
    for _ in 0..2 {
        events.extend(completed(&session.squat_rep(86.0)));
    }
    assert_eq!(events.len(), 5);

    for rep in &events[..3] {
        assert!((rep.form_score - 100.0).abs() < 0.01, "early rep rescored: {}", rep.form_score);
    }
    // (0.95 - 0.84) * 120 penalty
    for rep in &events[3..] {
        assert!((rep.form_score - 86.8).abs() < 0.1, "hard rep scored {}", rep.form_score);
    }

    let expected_mean = events.iter().map(|e| e.form_score).sum::<f32>() / 5.0;
    let summary = session.engine.summary();
    assert_eq!(summary.difficulty, DifficultyLevel::Hard);
    assert!((summary.mean_form_score.unwrap() - expected_mean).abs() < 0.01);
    assert!((summary.best_rom.unwrap() - 100.0).abs() < 0.01);
}

#[test]
fn test_low_confidence_frames_are_skipped() {
    let mut session = Session::squat(test_config());
    let mut angles = vec![170.0; 5];
    angles.extend(ramp(170.0, 110.0, 15));
    session.knees(angles);

    let min_before = session.engine.machine().min_angle_in_rep();
    let max_before = session.engine.machine().max_angle_in_rep();
    let phase_before = session.engine.phase();

    // Knee drops out; the geometry would read 20° if it were trusted
    for i in 0..10 {
        let frame = PoseBuilder::standing()
            .with_knee_angle(20.0)
            .with_landmark_visibility(LEFT_KNEE, 0.1)
            .build(session.t);
        let out = session.frame(frame);
        assert!(out.current_angle.is_none());
        assert_eq!(out.phase, phase_before);
        if i == 9 {
            assert_eq!(out.feedback, LOST_TRACKING_TEXT);
        }
    }
    assert_eq!(session.engine.machine().min_angle_in_rep(), min_before);
    assert_eq!(session.engine.machine().max_angle_in_rep(), max_before);

    let mut angles = ramp(110.0, 80.0, 10);
    angles.extend(ramp(80.0, 170.0, 20));
    let outputs = session.knees(angles);
    let rep = outputs.last().unwrap().last_rep.unwrap();
    assert_eq!(outputs.last().unwrap().rep_count, 1);
    assert!((rep.min_angle - 80.0).abs() < 0.01);
    assert!((rep.max_angle - 170.0).abs() < 0.01);
}

#[test]
fn test_muted_reps_are_not_replayed() {
    let mut session = Session::squat(test_config());
    session.engine.set_audio_enabled(false);
    let first = session.squat_rep(80.0);
    assert_eq!(first.last().unwrap().rep_count, 1);
    assert!(first.iter().all(|o| o.announcement.is_none()));
    assert!(session.sink.calls.is_empty());

    session.engine.set_audio_enabled(true);
    // Idle frames after re-enabling do not announce rep 1 late
    session.knees([170.0; 10]);
    assert!(session.sink.calls.is_empty());

    session.squat_rep(80.0);
    session.knees([170.0; 30]);
    assert_eq!(session.sink.calls.len(), 1);
    assert_eq!(session.sink.calls[0].0, 2);
}

#[test]
fn test_feedback_changed_fires_once_per_text() {
    let mut session = Session::squat(test_config());
    let outputs = session.squat_rep(80.0);

    for pair in outputs.windows(2) {
        assert_eq!(pair[1].feedback_changed, pair[1].feedback != pair[0].feedback);
    }
    let rep_frame = outputs.iter().find(|o| o.rep_completed).unwrap();
    assert!(rep_frame.feedback_changed);
    assert_eq!(rep_frame.feedback, "Good squat!");
}

#[test]
fn test_switch_exercise_to_curl() {
    let mut session = Session::squat(test_config());
    session.squat_rep(80.0);
    assert_eq!(session.engine.rep_count(), 1);

    session
        .engine
        .switch_exercise(ExerciseType::ElbowFlexion, Side::Right)
        .unwrap();
    assert_eq!(session.engine.rep_count(), 0);
    assert_eq!(session.engine.exercise(), ExerciseType::ElbowFlexion);
    assert!(session.engine.personalized_rom().best_achieved_rom.is_none());

    // Default elbow thresholds {150, 80}
    let mut angles = vec![170.0; 5];
    angles.extend(ramp(170.0, 60.0, 22));
    angles.extend(ramp(60.0, 170.0, 22));
    angles.extend([170.0; 5]);
    let outputs: Vec<RepOutput> = angles
        .into_iter()
        .map(|a| {
            let frame = PoseBuilder::standing().with_elbow_angle(a).build(session.t);
            session.frame(frame)
        })
        .collect();

    let last = outputs.last().unwrap();
    assert_eq!(last.rep_count, 1);
    assert_eq!(last.feedback, "Good curl!");
    // Squat rep 1, then curl rep 1 after the switch
    assert_eq!(session.sink.calls.len(), 2);
    assert_eq!(session.sink.calls[1].0, 1);
}

#[test]
fn test_clock_restart_keeps_counting() {
    let mut session = Session::squat(EngineConfig::default());
    session.knees([170.0; 300]);

    // Camera clock restarts at zero mid-session
    session.t = 0.0;
    let mut angles = vec![170.0; 10];
    angles.extend(ramp(170.0, 90.0, 30));
    angles.extend(ramp(90.0, 170.0, 30));
    angles.extend([170.0; 10]);
    let outputs = session.knees(angles);

    let last = outputs.last().unwrap();
    assert_eq!(last.rep_count, 1);
    assert!((last.current_angle.unwrap() - 170.0).abs() < 1.0);
    let rep = last.last_rep.unwrap();
    assert!(rep.min_angle < 100.0);
    assert!(rep.duration_ms > 1000.0);
}

#[test]
fn test_nan_landmark_does_not_poison_smoothing() {
    let mut session = Session::squat(EngineConfig::default());
    session.knees([170.0; 5]);

    let mut builder = PoseBuilder::standing().with_knee_angle(170.0);
    builder.landmarks[LEFT_KNEE].x = f32::NAN;
    let out = session.frame(builder.build(session.t));
    assert!(out.current_angle.is_none());

    let mut angles = vec![170.0; 15];
    angles.extend(ramp(170.0, 95.0, 30));
    angles.extend(ramp(95.0, 170.0, 30));
    angles.extend([170.0; 15]);
    let outputs = session.knees(angles);

    assert!(outputs.iter().all(|o| o.current_angle.map_or(false, f32::is_finite)));
    assert_eq!(outputs.last().unwrap().rep_count, 1);
}
