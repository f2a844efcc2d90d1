//! Landmark provider contract
//!
//! The pose model itself runs outside this crate. Anything that can turn
//! a camera frame into a `LandmarkFrame` implements this trait.

use super::landmark::LandmarkFrame;

pub trait LandmarkProvider {
    /// Raw per-frame input (video frame handle, flat array, ...)
    type Input: ?Sized;
    type Error;

    fn init(&mut self) -> Result<(), Self::Error>;

    /// `None` means "skip this frame", never a hard error
    fn process(&mut self, input: &Self::Input, timestamp_ms: f64) -> Option<LandmarkFrame>;

    /// 0-100 quality of the most recent frame
    fn tracking_quality(&self) -> u8;

    fn is_full_body_visible(&self) -> bool;

    fn destroy(&mut self);
}
