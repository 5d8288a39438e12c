//! # Simulated vessel
//!
//! A simple kinematic vessel which stands in for both the GPS receiver and the helm hardware. It
//! is used for testing and development rather than on the water. The model is:
//!
//! - Speed over ground is proportional to throttle, reaching `max_speed_ms` at full throttle.
//!   Negative throttle is treated as zero, the vessel doesn't reverse.
//! - Turn rate is proportional to rudder, reaching `max_turn_rate_degs` at full rudder. Positive
//!   rudder turns to starboard.
//! - The GPS reports a fix once `fix_delay_s` has passed since the vessel was created.
//!
//! The state is advanced lazily whenever it is read or a new demand arrives.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, error};
use serde::Deserialize;
use std::{
    sync::{Mutex, MutexGuard},
    time::Instant,
};

use comms_if::eqpt::helm::HelmCmd;
use util::maths::{clamp, rem_euclid};

use crate::{
    helm::{HelmError, HelmSink},
    nav::{destination, EarthRadius, LatLon},
    pilot::GpsProvider,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct SimParams {
    /// Starting position
    pub start: LatLon,

    /// Starting heading in degrees
    #[serde(default)]
    pub start_heading_deg: f64,

    /// Speed at full throttle
    pub max_speed_ms: f64,

    /// Turn rate at full rudder
    pub max_turn_rate_degs: f64,

    /// Time before the GPS reports a fix
    #[serde(default)]
    pub fix_delay_s: f64,
}

pub struct SimVessel {
    params: SimParams,
    created: Instant,
    state: Mutex<SimState>,
}

#[derive(Debug, Clone, Copy)]
struct SimState {
    position: LatLon,
    heading_deg: f64,
    helm: HelmCmd,
    last_update: Instant,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimVessel {
    pub fn new(params: SimParams) -> Self {
        let now = Instant::now();

        Self {
            state: Mutex::new(SimState {
                position: params.start,
                heading_deg: rem_euclid(params.start_heading_deg, 360.0),
                helm: HelmCmd::neutral(),
                last_update: now,
            }),
            created: now,
            params,
        }
    }

    /// Lock the state, advancing it to the current time.
    fn update(&self) -> Option<MutexGuard<SimState>> {
        let mut state = match self.state.lock() {
            Ok(s) => s,
            Err(_) => {
                error!("Simulated vessel state is poisoned");
                return None;
            }
        };

        let now = Instant::now();
        let dt = now.saturating_duration_since(state.last_update).as_secs_f64();
        self.propagate(&mut state, dt);
        state.last_update = now;

        Some(state)
    }

    /// Advance the state by `dt` seconds at the current demands.
    fn propagate(&self, state: &mut SimState, dt: f64) {
        let speed_ms = self.params.max_speed_ms * state.helm.throttle.max(0.0) / 100.0;
        let turn_rate_degs = self.params.max_turn_rate_degs * state.helm.rudder;

        // Move along the mean heading over the step
        let mid_heading_deg = state.heading_deg + 0.5 * turn_rate_degs * dt;
        state.position = destination(
            &state.position,
            mid_heading_deg.to_radians(),
            speed_ms * dt,
            EarthRadius::Meters,
        );
        state.heading_deg = rem_euclid(state.heading_deg + turn_rate_degs * dt, 360.0);
    }
}

impl GpsProvider for SimVessel {
    fn fix_valid(&self) -> bool {
        self.created.elapsed().as_secs_f64() >= self.params.fix_delay_s
    }

    fn coordinates(&self) -> LatLon {
        match self.update() {
            Some(s) => s.position,
            None => [std::f64::NAN; 2],
        }
    }

    fn heading(&self) -> f64 {
        match self.update() {
            Some(s) => s.heading_deg,
            None => std::f64::NAN,
        }
    }
}

impl HelmSink for SimVessel {
    fn actuate(&self, cmd: HelmCmd) -> Result<HelmCmd, HelmError> {
        let mut state = self
            .update()
            .ok_or_else(|| HelmError::SinkError("simulated vessel state is poisoned".into()))?;

        state.helm = HelmCmd::new(
            clamp(&cmd.throttle, &-100.0, &100.0),
            clamp(&cmd.rudder, &-1.0, &1.0),
        );

        debug!("Sim helm set to {}", state.helm);

        Ok(state.helm)
    }
}
