//! Error spotlight - which body segment to highlight right now
//!
//! Evaluated every frame, independent of rep phase. Each exercise has a
//! few fault signals with an acceptable band; the worst out-of-band signal
//! wins. The highlighted segment only moves after the new winner has held
//! for `debounce_frames`, so the overlay never flickers between limbs.

use nalgebra::Vector2;
use serde::Serialize;

use super::angles::{angle_between, joint_angle, trunk_angle, vertical_up};
use super::config::SpotlightConfig;
use super::exercise::ExerciseType;
use crate::pose::{
    LandmarkFrame, Side,
    LEFT_SHOULDER, RIGHT_SHOULDER, LEFT_ELBOW, RIGHT_ELBOW,
    LEFT_HIP, RIGHT_HIP, LEFT_KNEE, RIGHT_KNEE, LEFT_ANKLE, RIGHT_ANKLE,
};

// ============================================================================
// SEGMENTS
// ============================================================================

const TRUNK: [usize; 4] = [LEFT_SHOULDER, RIGHT_SHOULDER, LEFT_HIP, RIGHT_HIP];
const LEFT_HIP_ONLY: [usize; 1] = [LEFT_HIP];
const RIGHT_HIP_ONLY: [usize; 1] = [RIGHT_HIP];
const LEFT_LEG: [usize; 3] = [LEFT_HIP, LEFT_KNEE, LEFT_ANKLE];
const RIGHT_LEG: [usize; 3] = [RIGHT_HIP, RIGHT_KNEE, RIGHT_ANKLE];
const LEFT_THIGH: [usize; 2] = [LEFT_HIP, LEFT_KNEE];
const RIGHT_THIGH: [usize; 2] = [RIGHT_HIP, RIGHT_KNEE];
const LEFT_UPPER_ARM: [usize; 2] = [LEFT_SHOULDER, LEFT_ELBOW];
const RIGHT_UPPER_ARM: [usize; 2] = [RIGHT_SHOULDER, RIGHT_ELBOW];

/// Named landmark subset the UI highlights
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimbSegment {
    Trunk,
    /// The higher hip of a tilted pelvis
    Hip(Side),
    Knee(Side),
    Thigh(Side),
    UpperArm(Side),
}

impl LimbSegment {
    pub fn landmarks(&self) -> &'static [usize] {
        match self {
            LimbSegment::Trunk => &TRUNK,
            LimbSegment::Hip(Side::Left) => &LEFT_HIP_ONLY,
            LimbSegment::Hip(Side::Right) => &RIGHT_HIP_ONLY,
            LimbSegment::Knee(Side::Left) => &LEFT_LEG,
            LimbSegment::Knee(Side::Right) => &RIGHT_LEG,
            LimbSegment::Thigh(Side::Left) => &LEFT_THIGH,
            LimbSegment::Thigh(Side::Right) => &RIGHT_THIGH,
            LimbSegment::UpperArm(Side::Left) => &LEFT_UPPER_ARM,
            LimbSegment::UpperArm(Side::Right) => &RIGHT_UPPER_ARM,
        }
    }
}

/// Per-frame highlight for the UI
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSpotlight {
    pub limb_segment: LimbSegment,
    pub landmarks: &'static [usize],
    /// 0-1, soft-clamped deviation outside the acceptable band
    pub error_magnitude: f32,
    /// Unit vector (image space) the flagged landmark should move along
    pub correction_direction: [f32; 2],
    pub message: &'static str,
}

// ============================================================================
// FAULT SIGNALS
// ============================================================================

#[derive(Clone, Copy, Debug)]
struct Fault {
    segment: LimbSegment,
    magnitude: f32,
    direction: Vector2<f32>,
    message: &'static str,
}

/// Excess over the band, normalized by the band and soft-clamped to [0, 1)
fn soft_magnitude(value: f32, band: f32) -> f32 {
    if band <= 0.0 {
        return 0.0;
    }
    ((value - band).max(0.0) / band).tanh()
}

fn unit_or_zero(v: Vector2<f32>) -> Vector2<f32> {
    v.try_normalize(1.0e-6).unwrap_or_else(Vector2::zeros)
}

/// At most three fault signals per exercise, no allocation
type Faults = [Option<Fault>; 3];

pub struct SpotlightDetector {
    config: SpotlightConfig,
    exercise: ExerciseType,
    side: Side,
    confidence_floor: f32,

    /// Segment currently highlighted
    active: Option<LimbSegment>,
    /// Challenger and how many consecutive frames it has won
    pending: Option<Option<LimbSegment>>,
    pending_frames: u32,
}

impl SpotlightDetector {
    pub fn new(config: SpotlightConfig, exercise: ExerciseType, side: Side, confidence_floor: f32) -> Self {
        Self {
            config,
            exercise,
            side,
            confidence_floor,
            active: None,
            pending: None,
            pending_frames: 0,
        }
    }

    pub fn active_segment(&self) -> Option<LimbSegment> {
        self.active
    }

    /// Evaluate one frame. `Some` while a segment is highlighted.
    pub fn update(&mut self, frame: &LandmarkFrame) -> Option<ErrorSpotlight> {
        let faults = self.evaluate(frame);

        let winner = faults
            .iter()
            .flatten()
            .filter(|f| f.magnitude > self.config.display_threshold)
            .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
            .map(|f| f.segment);

        self.debounce(winner);

        let active = self.active?;
        let reading = faults.iter().flatten().find(|f| f.segment == active);
        Some(match reading {
            Some(fault) => ErrorSpotlight {
                limb_segment: active,
                landmarks: active.landmarks(),
                error_magnitude: fault.magnitude,
                correction_direction: [fault.direction.x, fault.direction.y],
                message: fault.message,
            },
            None => ErrorSpotlight {
                limb_segment: active,
                landmarks: active.landmarks(),
                error_magnitude: 0.0,
                correction_direction: [0.0, 0.0],
                message: "",
            },
        })
    }

    fn debounce(&mut self, winner: Option<LimbSegment>) {
        if winner == self.active {
            self.pending = None;
            self.pending_frames = 0;
            return;
        }

        if self.pending == Some(winner) {
            self.pending_frames += 1;
        } else {
            self.pending = Some(winner);
            self.pending_frames = 1;
        }

        if self.pending_frames >= self.config.debounce_frames.max(1) {
            self.active = winner;
            self.pending = None;
            self.pending_frames = 0;
        }
    }

    pub fn reset(&mut self) {
        self.active = None;
        self.pending = None;
        self.pending_frames = 0;
    }

    /// Rebind to a new exercise/side (always followed by a reset)
    pub fn rebind(&mut self, exercise: ExerciseType, side: Side) {
        self.exercise = exercise;
        self.side = side;
        self.reset();
    }

    fn evaluate(&self, frame: &LandmarkFrame) -> Faults {
        match self.exercise {
            ExerciseType::Squat => [
                self.trunk_lean(frame, self.config.squat_trunk_lean_deg, "Keep your chest up"),
                self.knee_valgus(frame),
                self.hip_level(frame),
            ],
            ExerciseType::StraightLegRaise => [
                self.knee_bend(frame),
                self.other_leg_lift(frame),
                self.hip_level(frame),
            ],
            ExerciseType::ElbowFlexion => [
                self.upper_arm_drift(frame),
                self.trunk_lean(frame, self.config.curl_trunk_lean_deg, "Keep your body still"),
                None,
            ],
        }
    }

    fn confident(&self, frame: &LandmarkFrame, indices: &[usize]) -> bool {
        frame.all_confident(indices, self.confidence_floor)
    }

    /// Shoulders drifting off the vertical above the hips
    fn trunk_lean(&self, frame: &LandmarkFrame, band: f32, message: &'static str) -> Option<Fault> {
        let lean = trunk_angle(frame, self.confidence_floor)?;
        let shoulders = frame.midpoint(LEFT_SHOULDER, RIGHT_SHOULDER);
        let hips = frame.midpoint(LEFT_HIP, RIGHT_HIP);
        let torso = (shoulders - hips).norm();
        let ideal = hips + vertical_up() * torso;

        Some(Fault {
            segment: LimbSegment::Trunk,
            magnitude: soft_magnitude(lean, band),
            direction: unit_or_zero(ideal - shoulders),
            message,
        })
    }

    /// Knees collapsing inward relative to the ankles (frontal view only)
    fn knee_valgus(&self, frame: &LandmarkFrame) -> Option<Fault> {
        let legs = [LEFT_KNEE, RIGHT_KNEE, LEFT_ANKLE, RIGHT_ANKLE];
        if !self.confident(frame, &legs) {
            return None;
        }

        let ankle_spread = (frame.get(LEFT_ANKLE).x - frame.get(RIGHT_ANKLE).x).abs();
        if ankle_spread < self.config.min_frontal_spread {
            return None;
        }
        let knee_spread = (frame.get(LEFT_KNEE).x - frame.get(RIGHT_KNEE).x).abs();
        let collapse = 1.0 - knee_spread / ankle_spread;

        let knee = frame.get(self.side.knee());
        let ankle = frame.get(self.side.ankle());
        Some(Fault {
            segment: LimbSegment::Knee(self.side),
            magnitude: soft_magnitude(collapse, self.config.knee_valgus_ratio),
            direction: unit_or_zero(Vector2::new(ankle.x - knee.x, 0.0)),
            message: "Push your knees out",
        })
    }

    /// Pelvis tilting: hip heights differ relative to torso length.
    /// Flags the higher hip (smaller y); its correction is straight down.
    fn hip_level(&self, frame: &LandmarkFrame) -> Option<Fault> {
        if !self.confident(frame, &TRUNK) {
            return None;
        }

        let torso = (frame.midpoint(LEFT_SHOULDER, RIGHT_SHOULDER) - frame.midpoint(LEFT_HIP, RIGHT_HIP)).norm();
        if torso < 1.0e-4 {
            return None;
        }
        let dy = frame.get(LEFT_HIP).y - frame.get(RIGHT_HIP).y;

        let higher = if dy > 0.0 { Side::Right } else { Side::Left };
        let direction = if dy.abs() < 1.0e-6 { Vector2::zeros() } else { Vector2::new(0.0, 1.0) };
        Some(Fault {
            segment: LimbSegment::Hip(higher),
            magnitude: soft_magnitude(dy.abs() / torso, self.config.hip_level_ratio),
            direction,
            message: "Keep your hips level",
        })
    }

    /// Working knee bending during a straight-leg raise
    fn knee_bend(&self, frame: &LandmarkFrame) -> Option<Fault> {
        let leg = [self.side.hip(), self.side.knee(), self.side.ankle()];
        if !self.confident(frame, &leg) {
            return None;
        }

        let [hip, knee, ankle] = leg.map(|i| frame.get(i).point());
        let bend = 180.0 - joint_angle(hip, knee, ankle)?;

        // Closest point on the hip-ankle line is where a straight knee would sit
        let axis = ankle - hip;
        let t = if axis.norm_squared() > 0.0 { (knee - hip).dot(&axis) / axis.norm_squared() } else { 0.0 };
        let on_line = hip + axis * t.clamp(0.0, 1.0);

        Some(Fault {
            segment: LimbSegment::Knee(self.side),
            magnitude: soft_magnitude(bend, self.config.knee_bend_deg),
            direction: unit_or_zero(on_line - knee),
            message: "Keep your knee straight",
        })
    }

    /// Resting leg lifting off the floor to help the working leg
    fn other_leg_lift(&self, frame: &LandmarkFrame) -> Option<Fault> {
        let other = self.side.opposite();
        let chain = [other.shoulder(), other.hip(), other.knee()];
        if !self.confident(frame, &chain) {
            return None;
        }

        let [shoulder, hip, knee] = chain.map(|i| frame.get(i).point());
        let flexion = 180.0 - joint_angle(shoulder, hip, knee)?;

        // Flat leg continues the shoulder → hip line
        let ideal = hip + unit_or_zero(hip - shoulder) * (knee - hip).norm();
        Some(Fault {
            segment: LimbSegment::Thigh(other),
            magnitude: soft_magnitude(flexion, self.config.other_leg_bend_deg),
            direction: unit_or_zero(ideal - knee),
            message: "Keep the other leg flat",
        })
    }

    /// Elbow swinging away from the side during curls
    fn upper_arm_drift(&self, frame: &LandmarkFrame) -> Option<Fault> {
        let arm = [self.side.shoulder(), self.side.elbow()];
        if !self.confident(frame, &arm) {
            return None;
        }

        let shoulder = frame.get(self.side.shoulder()).point();
        let elbow = frame.get(self.side.elbow()).point();
        let down = -vertical_up();
        let drift = angle_between(elbow - shoulder, down)?;
        let ideal = shoulder + down * (elbow - shoulder).norm();

        Some(Fault {
            segment: LimbSegment::UpperArm(self.side),
            magnitude: soft_magnitude(drift, self.config.upper_arm_drift_deg),
            direction: unit_or_zero(ideal - elbow),
            message: "Keep your elbow at your side",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::test_support::PoseBuilder;

    fn squat_detector() -> SpotlightDetector {
        SpotlightDetector::new(SpotlightConfig::default(), ExerciseType::Squat, Side::Left, 0.5)
    }

    #[test]
    fn test_clean_pose_has_no_spotlight() {
        let mut d = squat_detector();
        let frame = PoseBuilder::standing().with_knee_angle(100.0).build(0.0);
        for _ in 0..10 {
            assert!(d.update(&frame).is_none());
        }
    }

    #[test]
    fn test_forward_lean_flags_trunk_after_debounce() {
        let mut d = squat_detector();
        let frame = PoseBuilder::standing().with_trunk_lean(75.0).build(0.0);

        for _ in 0..3 {
            assert!(d.update(&frame).is_none());
        }
        let spot = d.update(&frame).unwrap();
        assert_eq!(spot.limb_segment, LimbSegment::Trunk);
        assert!(spot.error_magnitude > 0.3 && spot.error_magnitude <= 1.0);
        assert_eq!(spot.message, "Keep your chest up");

        // Leaning toward +x, so correction points back toward -x and up
        let [dx, dy] = spot.correction_direction;
        assert!(dx < 0.0);
        assert!(dy < 0.0);
        assert!(((dx * dx + dy * dy).sqrt() - 1.0).abs() < 1.0e-3);
    }

    #[test]
    fn test_single_bad_frame_does_not_flicker() {
        let mut d = squat_detector();
        let clean = PoseBuilder::standing().build(0.0);
        let leaning = PoseBuilder::standing().with_trunk_lean(80.0).build(0.0);

        for i in 0..20 {
            let frame = if i % 3 == 0 { &leaning } else { &clean };
            assert!(d.update(frame).is_none());
        }
    }

    #[test]
    fn test_highlight_clears_after_debounce() {
        let mut d = squat_detector();
        let clean = PoseBuilder::standing().build(0.0);
        let leaning = PoseBuilder::standing().with_trunk_lean(80.0).build(0.0);
        for _ in 0..4 {
            d.update(&leaning);
        }
        assert_eq!(d.active_segment(), Some(LimbSegment::Trunk));

        for _ in 0..3 {
            assert!(d.update(&clean).is_some());
        }
        assert!(d.update(&clean).is_none());
    }

    #[test]
    fn test_hip_tilt() {
        let mut d = squat_detector();
        let mut builder = PoseBuilder::standing();
        builder.landmarks[LEFT_HIP].y -= 0.06;
        let frame = builder.build(0.0);
        let mut spot = None;
        for _ in 0..4 {
            spot = d.update(&frame);
        }
        let spot = spot.unwrap();
        assert_eq!(spot.limb_segment, LimbSegment::Hip(Side::Left));
        assert_eq!(spot.landmarks, &[LEFT_HIP]);
        assert_eq!(spot.correction_direction, [0.0, 1.0]);
    }

    #[test]
    fn test_hip_tilt_flags_right_when_right_is_higher() {
        let mut d = squat_detector();
        let mut builder = PoseBuilder::standing();
        builder.landmarks[RIGHT_HIP].y -= 0.06;
        let frame = builder.build(0.0);
        let mut spot = None;
        for _ in 0..4 {
            spot = d.update(&frame);
        }
        let spot = spot.unwrap();
        assert_eq!(spot.limb_segment, LimbSegment::Hip(Side::Right));
        assert_eq!(spot.landmarks, &[RIGHT_HIP]);
    }

    #[test]
    fn test_curl_elbow_drift() {
        let mut d = SpotlightDetector::new(SpotlightConfig::default(), ExerciseType::ElbowFlexion, Side::Right, 0.5);
        let mut builder = PoseBuilder::standing();
        // Swing the right elbow forward by ~45°
        builder.landmarks[RIGHT_ELBOW].x += 0.085;
        builder.landmarks[RIGHT_ELBOW].y -= 0.035;
        let frame = builder.build(0.0);
        let mut spot = None;
        for _ in 0..4 {
            spot = d.update(&frame);
        }
        let spot = spot.unwrap();
        assert_eq!(spot.limb_segment, LimbSegment::UpperArm(Side::Right));
        assert!(spot.correction_direction[0] < 0.0);
    }

    #[test]
    fn test_unreadable_frame_yields_nothing() {
        let mut d = squat_detector();
        let frame = PoseBuilder::standing().with_visibility(0.1).build(0.0);
        for _ in 0..6 {
            assert!(d.update(&frame).is_none());
        }
    }

    #[test]
    fn test_soft_magnitude() {
        assert_eq!(soft_magnitude(10.0, 15.0), 0.0);
        assert!((soft_magnitude(30.0, 15.0) - 1.0f32.tanh()).abs() < 1.0e-6);
        assert!(soft_magnitude(1.0e6, 15.0) <= 1.0);
    }
}
