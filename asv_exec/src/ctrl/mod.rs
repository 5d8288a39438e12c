//! # Controllers module
//!
//! Feedback controllers used by the pilot to turn navigation errors into helm outputs. Each
//! controller kind takes a fixed number of inputs per call:
//!
//! | Kind      | Inputs                                               |
//! |-----------|------------------------------------------------------|
//! | `Trivial` | none                                                 |
//! | `Pid`     | process variable                                     |
//! | `Blended` | cross-track distance, heading error (rad), throttle  |
//!
//! All outputs are clamped to `[-100, 100]`. Controllers carry accumulated error between calls and
//! are owned by a single pilot, they must not be shared between loops.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod blended;
mod params;
mod pid;
mod trivial;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use blended::BlendedController;
pub use params::{BlendedParams, ControllerParams, Params, PidParams};
pub use pid::PidController;
pub use trivial::TrivialController;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{fmt, time::Instant};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum magnitude of any controller output.
pub const OUTPUT_LIMIT: f64 = 100.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A feedback controller.
#[derive(Debug, Clone)]
pub enum Controller {
    Trivial(TrivialController),
    Pid(PidController),
    Blended(BlendedController),
}

/// The kind of a controller, without its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    Trivial,
    Pid,
    Blended,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CtrlError {
    #[error("{kind} controller requires {expected} input(s), found {found}")]
    InvalidArity {
        kind: ControllerKind,
        expected: usize,
        found: usize,
    },

    #[error("Controller input {0} is not finite")]
    NonFiniteInput(f64),

    #[error("Controller produced a non-finite output")]
    NonFiniteOutput,

    #[error("A {kind} controller cannot be used for the {role} output")]
    UnsupportedRole { kind: ControllerKind, role: String },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Controller {
    /// Build a controller from its parameters.
    pub fn from_params(params: &ControllerParams) -> Self {
        match params {
            ControllerParams::Trivial { output } => {
                Controller::Trivial(TrivialController::new(*output))
            }
            ControllerParams::Pid(p) => Controller::Pid(PidController::from_params(p)),
            ControllerParams::Blended(p) => {
                Controller::Blended(BlendedController::from_params(p))
            }
        }
    }

    /// Reset the time-dependent state of the controller. Gains and setpoints are kept.
    pub fn start(&mut self) {
        match self {
            Controller::Trivial(_) => (),
            Controller::Pid(c) => c.start(),
            Controller::Blended(c) => c.start(),
        }
    }

    /// Compute the next output of the controller.
    ///
    /// Fails if the number of inputs doesn't match [`Controller::arity`], or if any input is not
    /// finite.
    pub fn compute(&mut self, inputs: &[f64]) -> Result<f64, CtrlError> {
        if inputs.len() != self.arity() {
            return Err(CtrlError::InvalidArity {
                kind: self.kind(),
                expected: self.arity(),
                found: inputs.len(),
            });
        }

        if let Some(i) = inputs.iter().find(|i| !i.is_finite()) {
            return Err(CtrlError::NonFiniteInput(*i));
        }

        let out = match self {
            Controller::Trivial(c) => c.get(),
            Controller::Pid(c) => c.get(inputs[0]),
            Controller::Blended(c) => c.get(inputs[0], inputs[1], inputs[2]),
        };

        if out.is_finite() {
            Ok(out)
        } else {
            Err(CtrlError::NonFiniteOutput)
        }
    }

    /// Number of inputs the controller expects per call.
    pub fn arity(&self) -> usize {
        self.kind().arity()
    }

    pub fn kind(&self) -> ControllerKind {
        match self {
            Controller::Trivial(_) => ControllerKind::Trivial,
            Controller::Pid(_) => ControllerKind::Pid,
            Controller::Blended(_) => ControllerKind::Blended,
        }
    }
}

impl ControllerKind {
    pub fn arity(&self) -> usize {
        match self {
            ControllerKind::Trivial => 0,
            ControllerKind::Pid => 1,
            ControllerKind::Blended => 3,
        }
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerKind::Trivial => write!(f, "Trivial"),
            ControllerKind::Pid => write!(f, "PID"),
            ControllerKind::Blended => write!(f, "Blended"),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Time step for a controller update.
///
/// A fixed period always wins. Otherwise the wall clock time since `prev_time`, or `None` on the
/// first call after a start.
fn time_step(period: Option<f64>, prev_time: Option<Instant>, now: Instant) -> Option<f64> {
    match period {
        Some(p) => Some(p),
        None => prev_time.map(|t0| now.saturating_duration_since(t0).as_secs_f64()),
    }
    .filter(|dt| *dt > 0.0 && dt.is_finite())
}

/// Check the throttle and rudder controllers are of kinds which suit their roles.
///
/// The throttle may be `Trivial` or `Pid`, the rudder `Pid` or `Blended`.
pub fn check_roles(throttle: &Controller, rudder: &Controller) -> Result<(), CtrlError> {
    if throttle.kind() == ControllerKind::Blended {
        return Err(CtrlError::UnsupportedRole {
            kind: throttle.kind(),
            role: "throttle".into(),
        });
    }
    if rudder.kind() == ControllerKind::Trivial {
        return Err(CtrlError::UnsupportedRole {
            kind: rudder.kind(),
            role: "rudder".into(),
        });
    }

    Ok(())
}

fn clamp_output(out: f64) -> f64 {
    util::maths::clamp(&out, &-OUTPUT_LIMIT, &OUTPUT_LIMIT)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_arity() {
        let mut trivial = Controller::from_params(&ControllerParams::Trivial { output: 50.0 });
        let mut pid = Controller::Pid(PidController::new(1.0, 0.0, 0.0));
        let mut blended = Controller::Blended(BlendedController::new(1.0, 1.0, 0.0));

        assert_eq!(trivial.compute(&[]), Ok(50.0));
        assert_eq!(
            trivial.compute(&[1.0]),
            Err(CtrlError::InvalidArity {
                kind: ControllerKind::Trivial,
                expected: 0,
                found: 1
            })
        );

        assert!(pid.compute(&[1.0]).is_ok());
        assert!(matches!(
            pid.compute(&[]),
            Err(CtrlError::InvalidArity { expected: 1, found: 0, .. })
        ));
        assert!(matches!(
            pid.compute(&[1.0, 2.0]),
            Err(CtrlError::InvalidArity { expected: 1, found: 2, .. })
        ));

        assert!(blended.compute(&[1.0, 0.1, 50.0]).is_ok());
        assert!(matches!(
            blended.compute(&[1.0]),
            Err(CtrlError::InvalidArity { expected: 3, found: 1, .. })
        ));
    }

    #[test]
    fn test_non_finite_input() {
        let mut pid = Controller::Pid(PidController::new(1.0, 0.0, 0.0));

        assert!(matches!(
            pid.compute(&[std::f64::NAN]),
            Err(CtrlError::NonFiniteInput(_))
        ));
        assert_eq!(
            pid.compute(&[std::f64::INFINITY]),
            Err(CtrlError::NonFiniteInput(std::f64::INFINITY))
        );
    }

    #[test]
    fn test_time_step() {
        let now = Instant::now();

        assert_eq!(time_step(Some(0.5), None, now), Some(0.5));
        assert_eq!(time_step(None, None, now), None);
        assert_eq!(time_step(Some(0.0), None, now), None);
        assert_eq!(time_step(None, Some(now), now), None);
    }
}
