//! Landmark frame - 33 MediaPipe Pose keypoints plus capture time
//!
//! Indices follow the MediaPipe Pose topology. Every module reads
//! landmarks through these constants, never through raw numbers.

use nalgebra::Vector2;
use serde::Serialize;

use crate::error::EngineError;

// ============================================================================
// LANDMARK INDICES (MediaPipe Pose - 33 total)
// ============================================================================

pub const LANDMARK_COUNT: usize = 33;

/// Values per landmark in the flat array pushed from JavaScript: x, y, z, visibility
pub const VALUES_PER_LANDMARK: usize = 4;

pub const NOSE: usize = 0;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;

/// Joints that must be tracked for any of the supported exercises
pub const CORE_JOINTS: [usize; 12] = [
    LEFT_SHOULDER, RIGHT_SHOULDER,
    LEFT_ELBOW, RIGHT_ELBOW,
    LEFT_WRIST, RIGHT_WRIST,
    LEFT_HIP, RIGHT_HIP,
    LEFT_KNEE, RIGHT_KNEE,
    LEFT_ANKLE, RIGHT_ANKLE,
];

// ============================================================================
// BODY SIDE
// ============================================================================

/// Which limb is being exercised
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn shoulder(&self) -> usize {
        match self {
            Side::Left => LEFT_SHOULDER,
            Side::Right => RIGHT_SHOULDER,
        }
    }

    pub fn elbow(&self) -> usize {
        match self {
            Side::Left => LEFT_ELBOW,
            Side::Right => RIGHT_ELBOW,
        }
    }

    pub fn wrist(&self) -> usize {
        match self {
            Side::Left => LEFT_WRIST,
            Side::Right => RIGHT_WRIST,
        }
    }

    pub fn hip(&self) -> usize {
        match self {
            Side::Left => LEFT_HIP,
            Side::Right => RIGHT_HIP,
        }
    }

    pub fn knee(&self) -> usize {
        match self {
            Side::Left => LEFT_KNEE,
            Side::Right => RIGHT_KNEE,
        }
    }

    pub fn ankle(&self) -> usize {
        match self {
            Side::Left => LEFT_ANKLE,
            Side::Right => RIGHT_ANKLE,
        }
    }
}

impl std::str::FromStr for Side {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Side::Left),
            "right" | "r" => Ok(Side::Right),
            _ => Err(EngineError::UnknownSide(s.to_string())),
        }
    }
}

// ============================================================================
// LANDMARK DATA STRUCTURES
// ============================================================================

/// A single tracked keypoint (normalized image coordinates)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,          // 0-1 normalized
    pub y: f32,          // 0-1 normalized, grows downward
    pub z: f32,          // Relative depth, hip-centred
    pub visibility: f32, // 0-1 confidence
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    /// 2D projection used for every angle computation
    pub fn point(&self) -> Vector2<f32> {
        Vector2::new(self.x, self.y)
    }

    /// Visible enough and with usable image coordinates
    pub fn is_confident(&self, floor: f32) -> bool {
        self.visibility >= floor && self.x.is_finite() && self.y.is_finite()
    }
}

/// One video frame worth of landmarks. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkFrame {
    pub landmarks: [Landmark; LANDMARK_COUNT],
    pub timestamp_ms: f64,
}

impl LandmarkFrame {
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT], timestamp_ms: f64) -> Self {
        Self { landmarks, timestamp_ms }
    }

    /// Build a frame from the flat array JavaScript sends
    /// (33 landmarks × [x, y, z, visibility] = 132 values)
    pub fn from_flat(data: &[f32], timestamp_ms: f64) -> Result<Self, EngineError> {
        let expected = LANDMARK_COUNT * VALUES_PER_LANDMARK;
        if data.len() != expected {
            return Err(EngineError::MalformedFrame { expected, actual: data.len() });
        }

        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (landmark, chunk) in landmarks.iter_mut().zip(data.chunks_exact(VALUES_PER_LANDMARK)) {
            *landmark = Landmark::new(chunk[0], chunk[1], chunk[2], chunk[3]);
        }

        Ok(Self::new(landmarks, timestamp_ms))
    }

    /// Frame with no confident landmark. The engine treats it as a skipped frame.
    pub fn untracked(timestamp_ms: f64) -> Self {
        Self::new([Landmark::default(); LANDMARK_COUNT], timestamp_ms)
    }

    pub fn get(&self, index: usize) -> &Landmark {
        &self.landmarks[index]
    }

    /// Midpoint of two landmarks in the 2D projection
    pub fn midpoint(&self, a: usize, b: usize) -> Vector2<f32> {
        (self.landmarks[a].point() + self.landmarks[b].point()) * 0.5
    }

    /// True when every listed landmark meets the confidence floor
    pub fn all_confident(&self, indices: &[usize], floor: f32) -> bool {
        indices.iter().all(|&i| self.landmarks[i].is_confident(floor))
    }
}
