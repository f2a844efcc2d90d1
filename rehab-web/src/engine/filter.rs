//! One Euro Filter - adaptive low-pass filter for the tracked angle
//!
//! Smooth while the joint is still (hides landmark jitter), responsive
//! while it moves (keeps the bottom of the rep from being shaved off).

use std::f32::consts::PI;

use super::config::SmoothingConfig;

/// Adaptive low-pass filter over a scalar angle in degrees
#[derive(Clone, Debug)]
pub struct AngleFilter {
    /// Cutoff (Hz) while the joint is still
    min_cutoff: f32,
    /// How fast the cutoff opens up with angular speed
    beta: f32,
    /// Cutoff (Hz) for the speed estimate
    d_cutoff: f32,

    x_prev: f32,
    dx_prev: f32,
    t_prev_ms: f64,
    initialized: bool,
}

impl AngleFilter {
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            min_cutoff: config.min_cutoff,
            beta: config.beta,
            d_cutoff: config.d_cutoff,
            x_prev: 0.0,
            dx_prev: 0.0,
            t_prev_ms: 0.0,
            initialized: false,
        }
    }

    /// Exponential weight for `cutoff` Hz over a `t_e` second step
    fn smoothing_factor(t_e: f32, cutoff: f32) -> f32 {
        let r = 2.0 * PI * cutoff * t_e;
        r / (r + 1.0)
    }

    /// Filter one angle sample taken at `t_ms`
    ///
    /// A non-increasing timestamp returns the previous output unchanged and
    /// becomes the new time base, so a restarted clock resumes filtering on
    /// the next frame.
    pub fn filter(&mut self, t_ms: f64, x: f32) -> f32 {
        if !self.initialized {
            self.x_prev = x;
            self.t_prev_ms = t_ms;
            self.initialized = true;
            return x;
        }

        let t_e = ((t_ms - self.t_prev_ms) / 1000.0) as f32;
        if t_e <= 0.0 {
            self.t_prev_ms = t_ms;
            return self.x_prev;
        }

        // Angular speed (deg/s), itself low-passed
        let a_d = Self::smoothing_factor(t_e, self.d_cutoff);
        let dx = (x - self.x_prev) / t_e;
        let dx_hat = a_d * dx + (1.0 - a_d) * self.dx_prev;

        let cutoff = self.min_cutoff + self.beta * dx_hat.abs();
        let a = Self::smoothing_factor(t_e, cutoff);

        let x_hat = a * x + (1.0 - a) * self.x_prev;

        self.x_prev = x_hat;
        self.dx_prev = dx_hat;
        self.t_prev_ms = t_ms;

        x_hat
    }

    /// The next sample passes through unfiltered
    pub fn reset(&mut self) {
        self.initialized = false;
        self.dx_prev = 0.0;
    }
}

impl Default for AngleFilter {
    fn default() -> Self {
        Self::new(SmoothingConfig::default())
    }
}
