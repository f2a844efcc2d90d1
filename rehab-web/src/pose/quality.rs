//! Tracking quality heuristics
//!
//! Cheap whole-frame checks the UI uses to decide whether rep counting
//! should be attempted at all. Depth (z) is ignored for angles but used
//! here to reject skeletons the model has hallucinated off-camera.

use super::landmark::{LandmarkFrame, CORE_JOINTS};

/// |z| beyond this is treated as an implausible (off-body) estimate
pub const MAX_PLAUSIBLE_DEPTH: f32 = 1.5;

/// Mean visibility of the core joints, scaled to 0-100
pub fn tracking_quality(frame: &LandmarkFrame) -> u8 {
    let sum: f32 = CORE_JOINTS
        .iter()
        .map(|&i| frame.get(i).visibility.clamp(0.0, 1.0))
        .sum();
    let mean = sum / CORE_JOINTS.len() as f32;
    (mean * 100.0).round() as u8
}

/// Every core joint is confident, inside the image and at a plausible depth
pub fn is_full_body_visible(frame: &LandmarkFrame, confidence_floor: f32) -> bool {
    CORE_JOINTS.iter().all(|&i| {
        let lm = frame.get(i);
        lm.is_confident(confidence_floor)
            && (0.0..=1.0).contains(&lm.x)
            && (0.0..=1.0).contains(&lm.y)
            && lm.z.abs() <= MAX_PLAUSIBLE_DEPTH
    })
}
