//! Pose module - landmark frames and the provider contract
//!
//! Re-exports only. All logic in submodules.

mod landmark;
mod provider;
mod quality;

#[cfg(test)]
pub(crate) mod test_support;

pub use landmark::{
    Landmark, LandmarkFrame, Side,
    LANDMARK_COUNT, VALUES_PER_LANDMARK, CORE_JOINTS,
    NOSE, LEFT_SHOULDER, RIGHT_SHOULDER,
    LEFT_ELBOW, RIGHT_ELBOW,
    LEFT_WRIST, RIGHT_WRIST,
    LEFT_HIP, RIGHT_HIP,
    LEFT_KNEE, RIGHT_KNEE,
    LEFT_ANKLE, RIGHT_ANKLE,
};
pub use provider::LandmarkProvider;
pub use quality::{tracking_quality, is_full_body_visible, MAX_PLAUSIBLE_DEPTH};
