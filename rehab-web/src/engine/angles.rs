//! Joint angle extraction using dot product
//!
//! Every angle is the interior angle at the middle point of a three-point
//! chain, computed on the 2D (x, y) projection. Depth is deliberately
//! ignored: MediaPipe z is too noisy to help at this scale.

use nalgebra::Vector2;

use super::exercise::ExerciseType;
use crate::pose::{
    LandmarkFrame, Side,
    LEFT_HIP, RIGHT_HIP, LEFT_SHOULDER, RIGHT_SHOULDER,
};

/// Vectors shorter than this are treated as collapsed joints
const MIN_SEGMENT_LENGTH: f32 = 0.0001;

/// Image-space "up" (y grows downward)
pub fn vertical_up() -> Vector2<f32> {
    Vector2::new(0.0, -1.0)
}

/// Angle between two vectors in degrees, `None` if either is degenerate
///
/// Uses dot product formula: cos(θ) = (v1 · v2) / (|v1| × |v2|)
pub fn angle_between(v1: Vector2<f32>, v2: Vector2<f32>) -> Option<f32> {
    let mag1 = v1.norm();
    let mag2 = v2.norm();
    if !(mag1 >= MIN_SEGMENT_LENGTH && mag2 >= MIN_SEGMENT_LENGTH) || !mag1.is_finite() || !mag2.is_finite() {
        return None;
    }

    let cos_angle = (v1.dot(&v2) / (mag1 * mag2)).clamp(-1.0, 1.0);
    let degrees = cos_angle.acos().to_degrees();
    degrees.is_finite().then_some(degrees)
}

/// Interior angle at `vertex` in degrees
///
/// - 180° = fully straight
/// - 90° = right angle
pub fn joint_angle(a: Vector2<f32>, vertex: Vector2<f32>, c: Vector2<f32>) -> Option<f32> {
    angle_between(a - vertex, c - vertex)
}

/// Landmark triple whose middle point is the tracked joint
pub fn joint_triple(exercise: ExerciseType, side: Side) -> [usize; 3] {
    match exercise {
        ExerciseType::Squat => [side.hip(), side.knee(), side.ankle()],
        ExerciseType::StraightLegRaise => [side.shoulder(), side.hip(), side.knee()],
        ExerciseType::ElbowFlexion => [side.shoulder(), side.elbow(), side.wrist()],
    }
}

/// Clinically tracked angle for one exercise and side
///
/// - squat: knee interior angle (hip-knee-ankle), ~175° standing
/// - straight leg raise: hip flexion, 180° minus the shoulder-hip-knee angle, ~0° lying flat
/// - elbow flexion: elbow interior angle (shoulder-elbow-wrist), ~170° arm hanging
///
/// Returns `None` when any of the three landmarks is below `confidence_floor`.
pub fn extract_angle(
    frame: &LandmarkFrame,
    exercise: ExerciseType,
    side: Side,
    confidence_floor: f32,
) -> Option<f32> {
    let triple = joint_triple(exercise, side);
    if !frame.all_confident(&triple, confidence_floor) {
        return None;
    }

    let [a, b, c] = triple.map(|i| frame.get(i).point());
    let interior = joint_angle(a, b, c)?;

    match exercise {
        ExerciseType::StraightLegRaise => Some(180.0 - interior),
        ExerciseType::Squat | ExerciseType::ElbowFlexion => Some(interior),
    }
}

/// Trunk lean: angle of the hip-midpoint → shoulder-midpoint line from vertical
pub fn trunk_angle(frame: &LandmarkFrame, confidence_floor: f32) -> Option<f32> {
    let torso = [LEFT_SHOULDER, RIGHT_SHOULDER, LEFT_HIP, RIGHT_HIP];
    if !frame.all_confident(&torso, confidence_floor) {
        return None;
    }

    let shoulders = frame.midpoint(LEFT_SHOULDER, RIGHT_SHOULDER);
    let hips = frame.midpoint(LEFT_HIP, RIGHT_HIP);
    angle_between(shoulders - hips, vertical_up())
}
