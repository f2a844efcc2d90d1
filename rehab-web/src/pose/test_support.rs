//! Synthetic skeletons for tests
//!
//! Side-view standing pose with both legs (and both arms) moved together,
//! so frontal-plane checks such as knee spread stay neutral.

use super::landmark::*;

const THIGH: f32 = 0.17;
const SHANK: f32 = 0.17;
const UPPER_ARM: f32 = 0.12;
const FOREARM: f32 = 0.12;

pub struct PoseBuilder {
    pub landmarks: [Landmark; LANDMARK_COUNT],
}

impl PoseBuilder {
    /// Upright pose, arms hanging straight, every landmark at visibility 0.9
    pub fn standing() -> Self {
        let mut landmarks = [Landmark::new(0.5, 0.5, 0.0, 0.9); LANDMARK_COUNT];
        let mut set = |i: usize, x: f32, y: f32| landmarks[i] = Landmark::new(x, y, 0.0, 0.9);

        set(NOSE, 0.50, 0.20);
        set(LEFT_SHOULDER, 0.46, 0.30);
        set(RIGHT_SHOULDER, 0.54, 0.30);
        set(LEFT_ELBOW, 0.46, 0.30 + UPPER_ARM);
        set(RIGHT_ELBOW, 0.54, 0.30 + UPPER_ARM);
        set(LEFT_WRIST, 0.46, 0.30 + UPPER_ARM + FOREARM);
        set(RIGHT_WRIST, 0.54, 0.30 + UPPER_ARM + FOREARM);
        set(LEFT_HIP, 0.46, 0.55);
        set(RIGHT_HIP, 0.54, 0.55);
        set(LEFT_KNEE, 0.46, 0.55 + THIGH);
        set(RIGHT_KNEE, 0.54, 0.55 + THIGH);
        set(LEFT_ANKLE, 0.46, 0.55 + THIGH + SHANK);
        set(RIGHT_ANKLE, 0.54, 0.55 + THIGH + SHANK);

        Self { landmarks }
    }

    /// Place both ankles so the hip-knee-ankle interior angle equals `degrees`
    pub fn with_knee_angle(mut self, degrees: f32) -> Self {
        let theta = degrees.to_radians();
        for side in [Side::Left, Side::Right] {
            let knee = self.landmarks[side.knee()];
            let ankle = &mut self.landmarks[side.ankle()];
            ankle.x = knee.x + SHANK * theta.sin();
            ankle.y = knee.y - SHANK * theta.cos();
        }
        self
    }

    /// Place both wrists so the shoulder-elbow-wrist interior angle equals `degrees`
    pub fn with_elbow_angle(mut self, degrees: f32) -> Self {
        let theta = degrees.to_radians();
        for side in [Side::Left, Side::Right] {
            let elbow = self.landmarks[side.elbow()];
            let wrist = &mut self.landmarks[side.wrist()];
            wrist.x = elbow.x + FOREARM * theta.sin();
            wrist.y = elbow.y - FOREARM * theta.cos();
        }
        self
    }

    /// Tilt the torso forward: shoulders rotate about the hip midpoint
    pub fn with_trunk_lean(mut self, degrees: f32) -> Self {
        let theta = degrees.to_radians();
        let torso = 0.25;
        for side in [Side::Left, Side::Right] {
            let hip = self.landmarks[side.hip()];
            let shoulder = &mut self.landmarks[side.shoulder()];
            shoulder.x = hip.x + torso * theta.sin();
            shoulder.y = hip.y - torso * theta.cos();
        }
        self
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        for lm in self.landmarks.iter_mut() {
            lm.visibility = visibility;
        }
        self
    }

    pub fn with_landmark_visibility(mut self, index: usize, visibility: f32) -> Self {
        self.landmarks[index].visibility = visibility;
        self
    }

    pub fn build(&self, timestamp_ms: f64) -> LandmarkFrame {
        LandmarkFrame::new(self.landmarks, timestamp_ms)
    }
}
