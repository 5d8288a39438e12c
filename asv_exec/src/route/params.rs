//! Route source parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use std::path::PathBuf;

use super::{load_route_file, two_point_route, ArrivalBehaviour, Route, RouteError};
use crate::nav::LatLon;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Where the pilot's route comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "source")]
pub enum RouteParams {
    /// A route file. Relative paths are resolved against the software root by the executable.
    File { path: PathBuf },

    /// A single segment between two fixed points.
    TwoPoint {
        start: LatLon,
        end: LatLon,
        tolerance: f64,

        #[serde(default = "default_terminal_behaviour")]
        terminal_behaviour: ArrivalBehaviour,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RouteParams {
    /// Build the route these parameters describe.
    pub fn build(&self) -> Result<Route, RouteError> {
        match self {
            RouteParams::File { path } => load_route_file(path),
            RouteParams::TwoPoint {
                start,
                end,
                tolerance,
                terminal_behaviour,
            } => two_point_route(*start, *end, *tolerance, *terminal_behaviour),
        }
    }
}

fn default_terminal_behaviour() -> ArrivalBehaviour {
    ArrivalBehaviour::Loiter
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_two_point_params() {
        let params: RouteParams = util::params::parse(
            r#"
            source = "TwoPoint"
            start = [45.0, -93.0]
            end = [45.01, -93.0]
            tolerance = 5.0
            "#,
        )
        .unwrap();

        let route = params.build().unwrap();
        assert_eq!(route.num_waypoints(), 2);
        assert_eq!(route.next_waypoint().behaviour(), ArrivalBehaviour::Loiter);
    }

    #[test]
    fn test_file_params() {
        let params: RouteParams = util::params::parse(
            r#"
            source = "File"
            path = "routes/does_not_exist.csv"
            "#,
        )
        .unwrap();

        assert!(matches!(params.build(), Err(RouteError::FileReadError(_))));
    }
}
