//! Controller parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::{check_roles, Controller, CtrlError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the pilot's controllers
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Throttle controller, either `Trivial` or `Pid`
    pub throttle: ControllerParams,

    /// Rudder controller, either `Pid` or `Blended`
    pub rudder: ControllerParams,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PidParams {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Fixed time step in seconds. If not set the time between updates is measured.
    #[serde(default)]
    pub period_s: Option<f64>,

    #[serde(default)]
    pub setpoint: f64,

    /// Minimum of the scaled integral term
    #[serde(default = "default_integral_min")]
    pub integral_min: f64,

    /// Maximum of the scaled integral term
    #[serde(default = "default_integral_max")]
    pub integral_max: f64,

    #[serde(default = "default_position_tolerance")]
    pub position_tolerance: f64,

    #[serde(default = "default_velocity_tolerance")]
    pub velocity_tolerance: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BlendedParams {
    /// Heading error gain
    pub k_heading: f64,

    /// Cross-track distance gain
    pub k_cross: f64,

    /// Cross-track integral gain
    pub k_integral: f64,

    /// Fixed time step in seconds. If not set the time between updates is measured.
    #[serde(default)]
    pub period_s: Option<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Parameters for a single controller, tagged by `kind`.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "kind")]
pub enum ControllerParams {
    Trivial { output: f64 },
    Pid(PidParams),
    Blended(BlendedParams),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Build the throttle and rudder controllers, checking each kind suits its role.
    pub fn build(&self) -> Result<(Controller, Controller), CtrlError> {
        let throttle = Controller::from_params(&self.throttle);
        let rudder = Controller::from_params(&self.rudder);

        check_roles(&throttle, &rudder)?;

        Ok((throttle, rudder))
    }
}

impl Default for PidParams {
    fn default() -> Self {
        Self {
            k_p: 0.0,
            k_i: 0.0,
            k_d: 0.0,
            period_s: None,
            setpoint: 0.0,
            integral_min: default_integral_min(),
            integral_max: default_integral_max(),
            position_tolerance: default_position_tolerance(),
            velocity_tolerance: default_velocity_tolerance(),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn default_integral_min() -> f64 {
    -1.0
}

fn default_integral_max() -> f64 {
    1.0
}

fn default_position_tolerance() -> f64 {
    0.05
}

fn default_velocity_tolerance() -> f64 {
    std::f64::INFINITY
}
