//! Landmark feed from JavaScript
//!
//! JS runs the pose model and pushes a flat Float32Array every frame
//! (33 landmarks × [x, y, z, visibility]). This feed turns it into a
//! `LandmarkFrame` and keeps the per-frame tracking heuristics.

use crate::error::EngineError;
use crate::pose::{is_full_body_visible, tracking_quality, LandmarkFrame, LandmarkProvider};

pub struct FlatLandmarkFeed {
    confidence_floor: f32,
    last_quality: u8,
    full_body: bool,
    malformed_frames: u32,
    active: bool,
}

impl FlatLandmarkFeed {
    pub fn new(confidence_floor: f32) -> Self {
        Self {
            confidence_floor,
            last_quality: 0,
            full_body: false,
            malformed_frames: 0,
            active: false,
        }
    }

    pub fn set_confidence_floor(&mut self, floor: f32) {
        self.confidence_floor = floor;
    }

    pub fn malformed_frames(&self) -> u32 {
        self.malformed_frames
    }

    /// Parse one array and update the tracking heuristics (no logging)
    pub fn parse(&mut self, data: &[f32], timestamp_ms: f64) -> Result<LandmarkFrame, EngineError> {
        match LandmarkFrame::from_flat(data, timestamp_ms) {
            Ok(frame) => {
                self.last_quality = tracking_quality(&frame);
                self.full_body = is_full_body_visible(&frame, self.confidence_floor);
                Ok(frame)
            }
            Err(err) => {
                self.malformed_frames = self.malformed_frames.saturating_add(1);
                self.last_quality = 0;
                self.full_body = false;
                Err(err)
            }
        }
    }
}

impl Default for FlatLandmarkFeed {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl LandmarkProvider for FlatLandmarkFeed {
    type Input = [f32];
    type Error = EngineError;

    fn init(&mut self) -> Result<(), EngineError> {
        self.active = true;
        self.last_quality = 0;
        self.full_body = false;
        Ok(())
    }

    fn process(&mut self, input: &[f32], timestamp_ms: f64) -> Option<LandmarkFrame> {
        if !self.active {
            return None;
        }
        match self.parse(input, timestamp_ms) {
            Ok(frame) => Some(frame),
            Err(err) => {
                web_sys::console::warn_1(&format!("Skipping landmark frame: {}", err).into());
                None
            }
        }
    }

    fn tracking_quality(&self) -> u8 {
        self.last_quality
    }

    fn is_full_body_visible(&self) -> bool {
        self.full_body
    }

    fn destroy(&mut self) {
        self.active = false;
        self.last_quality = 0;
        self.full_body = false;
    }
}
