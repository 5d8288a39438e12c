//! PID controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Instant;

use super::{clamp_output, time_step, PidParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Fixed time step, if `None` the wall clock is used
    period: Option<f64>,

    setpoint: f64,

    /// Bounds on the scaled integral term `k_i * total_error`
    integral_min: f64,
    integral_max: f64,

    /// The unscaled integral accumulation
    total_error: f64,

    position_error: f64,
    velocity_error: f64,

    position_tolerance: f64,
    velocity_tolerance: f64,

    /// Previous instant that an input was passed in
    prev_time: Option<Instant>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains and default limits, timed by the wall clock.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self::from_params(&PidParams {
            k_p,
            k_i,
            k_d,
            ..Default::default()
        })
    }

    pub fn from_params(params: &PidParams) -> Self {
        Self {
            k_p: params.k_p,
            k_i: params.k_i,
            k_d: params.k_d,
            period: params.period_s,
            setpoint: params.setpoint,
            integral_min: params.integral_min,
            integral_max: params.integral_max,
            total_error: 0.0,
            position_error: 0.0,
            velocity_error: 0.0,
            position_tolerance: params.position_tolerance,
            velocity_tolerance: params.velocity_tolerance,
            prev_time: None,
        }
    }

    /// Forget the previous update time, so the next update has no time step.
    pub fn start(&mut self) {
        self.prev_time = None;
    }

    /// Get the output of the controller for the given process variable.
    ///
    /// On an update with no time step (the first after `start` without a fixed period) neither
    /// the integral nor the derivative are updated.
    pub fn get(&mut self, process_variable: f64) -> f64 {
        let now = Instant::now();
        let dt = time_step(self.period, self.prev_time, now);

        let prev_error = self.position_error;
        self.position_error = self.setpoint - process_variable;

        match dt {
            Some(t) => {
                self.velocity_error = (self.position_error - prev_error) / t;

                if self.k_i != 0.0 {
                    self.total_error = util::maths::clamp(
                        &(self.total_error + self.position_error * t),
                        &(self.integral_min / self.k_i),
                        &(self.integral_max / self.k_i),
                    );
                }
            }
            None => self.velocity_error = 0.0,
        }

        self.prev_time = Some(now);

        // The accumulator is never read with a zero integral gain
        let integral_term = match self.k_i != 0.0 {
            true => self.k_i * self.total_error,
            false => 0.0,
        };

        clamp_output(
            self.k_p * self.position_error + integral_term + self.k_d * self.velocity_error,
        )
    }

    /// True if both the position and velocity errors are within tolerance.
    pub fn at_setpoint(&self) -> bool {
        self.position_error.abs() < self.position_tolerance
            && self.velocity_error.abs() < self.velocity_tolerance
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn total_error(&self) -> f64 {
        self.total_error
    }

    pub fn position_error(&self) -> f64 {
        self.position_error
    }

    pub fn velocity_error(&self) -> f64 {
        self.velocity_error
    }
}
