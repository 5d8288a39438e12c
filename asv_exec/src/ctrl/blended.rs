//! Blended cross-track and heading controller
//!
//! Steers on a weighted blend of the heading error and the cross-track distance (with an integral
//! on the latter), following Hitz et al.'s line-following law:
//!
//! ```text
//! out = k_heading * h + sinc(h) * (-k_cross * xtd + k_integral * total * dt)
//! ```
//!
//! where `total` is the time integral of the cross-track distance.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Instant;

use super::{clamp_output, time_step, BlendedParams};
use util::maths::sinc;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BlendedController {
    /// Heading error gain
    k_heading: f64,

    /// Cross-track distance gain
    k_cross: f64,

    /// Cross-track integral gain
    k_integral: f64,

    /// Fixed time step, if `None` the wall clock is used
    period: Option<f64>,

    /// Integral of the cross-track distance
    total_error: f64,

    prev_time: Option<Instant>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl BlendedController {
    pub fn new(k_heading: f64, k_cross: f64, k_integral: f64) -> Self {
        Self::from_params(&BlendedParams {
            k_heading,
            k_cross,
            k_integral,
            period_s: None,
        })
    }

    pub fn from_params(params: &BlendedParams) -> Self {
        Self {
            k_heading: params.k_heading,
            k_cross: params.k_cross,
            k_integral: params.k_integral,
            period: params.period_s,
            total_error: 0.0,
            prev_time: None,
        }
    }

    pub fn start(&mut self) {
        self.prev_time = None;
    }

    /// Get the rudder output for the given cross-track distance and heading error (radians).
    ///
    /// The throttle is accepted so that the controller can be scheduled on speed, but the current
    /// law does not use it.
    pub fn get(&mut self, xtd: f64, heading_error_rad: f64, _throttle: f64) -> f64 {
        let now = Instant::now();
        let dt = time_step(self.period, self.prev_time, now).unwrap_or(0.0);
        self.prev_time = Some(now);

        self.total_error += xtd * dt;

        clamp_output(
            self.k_heading * heading_error_rad
                + sinc(heading_error_rad)
                    * (-self.k_cross * xtd + self.k_integral * self.total_error * dt),
        )
    }

    pub fn total_error(&self) -> f64 {
        self.total_error
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fixed(k_heading: f64, k_cross: f64, k_integral: f64) -> BlendedController {
        BlendedController::from_params(&BlendedParams {
            k_heading,
            k_cross,
            k_integral,
            period_s: Some(1.0),
        })
    }

    #[test]
    fn test_zero_heading_error() {
        let mut ctrl = fixed(10.0, 2.0, 0.0);

        // sinc(0) takes its limit of 1
        let out = ctrl.get(3.0, 0.0, 50.0);
        assert!(out.is_finite());
        assert!((out + 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_heading_term() {
        let mut ctrl = fixed(10.0, 0.0, 0.0);

        assert!((ctrl.get(0.0, 0.5, 50.0) - 5.0).abs() < 1e-12);
        assert!((ctrl.get(0.0, -0.5, 50.0) + 5.0).abs() < 1e-12);
        assert_eq!(ctrl.get(0.0, 100.0, 50.0), 100.0);
    }

    #[test]
    fn test_integral_accumulation() {
        let mut ctrl = fixed(0.0, 0.0, 1.0);

        // Each update adds xtd * dt with no double counting of the previous error
        ctrl.get(2.0, 0.0, 50.0);
        assert!((ctrl.total_error() - 2.0).abs() < 1e-12);
        ctrl.get(2.0, 0.0, 50.0);
        assert!((ctrl.total_error() - 4.0).abs() < 1e-12);
        let out = ctrl.get(-1.0, 0.0, 50.0);
        assert!((ctrl.total_error() - 3.0).abs() < 1e-12);
        assert!((out - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_wall_clock_first_update() {
        let mut ctrl = BlendedController::new(0.0, 0.0, 1.0);

        assert_eq!(ctrl.get(5.0, 0.0, 50.0), 0.0);
        assert_eq!(ctrl.total_error(), 0.0);
    }
}
