//! Pilot parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use std::time::Duration;

use crate::nav::EarthRadius;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct PilotParams {
    /// Period between pilot ticks
    pub period_ms: u64,

    /// Delay between checks for a GPS fix while waiting to start
    #[serde(default = "default_gps_retry_ms")]
    pub gps_retry_ms: u64,

    /// Units of waypoint tolerances and of the cross-track distance fed to the controllers
    #[serde(default)]
    pub distance_units: EarthRadius,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PilotParams {
    pub fn period(&self) -> Duration {
        util::time::millis(self.period_ms)
    }

    pub fn gps_retry(&self) -> Duration {
        util::time::millis(self.gps_retry_ms)
    }
}

impl Default for PilotParams {
    fn default() -> Self {
        Self {
            period_ms: 1000,
            gps_retry_ms: default_gps_retry_ms(),
            distance_units: EarthRadius::default(),
        }
    }
}

fn default_gps_retry_ms() -> u64 {
    5000
}
