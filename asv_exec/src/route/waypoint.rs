//! Waypoint value type

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use std::{fmt, str::FromStr};

use crate::nav::LatLon;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point on a route which the vessel must pass within `tolerance` of.
///
/// Waypoints are immutable once created. Two waypoints are equal if all of their fields are equal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    latitude: f64,
    longitude: f64,

    /// Arrival radius, in the pilot's distance units
    tolerance: f64,

    behaviour: ArrivalBehaviour,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What the pilot does once it arrives at a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ArrivalBehaviour {
    /// Advance to the next segment of the route
    #[serde(rename = "NEXT_WAYPOINT")]
    ContinueToNext,

    /// Stop and hold station
    #[serde(rename = "LOITER")]
    Loiter,
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("Unknown arrival behaviour {0:?}, expected NEXT_WAYPOINT or LOITER")]
pub struct UnknownBehaviour(pub String);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Waypoint {
    pub fn new(latitude: f64, longitude: f64, tolerance: f64, behaviour: ArrivalBehaviour) -> Self {
        Self {
            latitude,
            longitude,
            tolerance,
            behaviour,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn behaviour(&self) -> ArrivalBehaviour {
        self.behaviour
    }

    /// The waypoint's position as a `[latitude, longitude]` pair.
    pub fn coordinates(&self) -> LatLon {
        [self.latitude, self.longitude]
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.latitude, self.longitude, self.tolerance, self.behaviour
        )
    }
}

impl fmt::Display for ArrivalBehaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrivalBehaviour::ContinueToNext => write!(f, "NEXT_WAYPOINT"),
            ArrivalBehaviour::Loiter => write!(f, "LOITER"),
        }
    }
}

impl FromStr for ArrivalBehaviour {
    type Err = UnknownBehaviour;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "NEXT_WAYPOINT" => Ok(ArrivalBehaviour::ContinueToNext),
            "LOITER" => Ok(ArrivalBehaviour::Loiter),
            other => Err(UnknownBehaviour(other.into())),
        }
    }
}
