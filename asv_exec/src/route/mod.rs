//! # Route module
//!
//! A route is an ordered sequence of waypoints with a cursor over its segments. Segment `i` runs
//! from waypoint `i` (the previous waypoint) to waypoint `i + 1` (the next waypoint).
//!
//! The route is complete once the cursor sits on the final segment, i.e. the next waypoint is the
//! last one. Advancing beyond that is an error. The pilot owns the route exclusively and only
//! mutates it through [`Route::advance`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod parser;
mod waypoint;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::RouteParams;
pub use parser::{load_route_file, parse_route_str, two_point_route};
pub use waypoint::{ArrivalBehaviour, UnknownBehaviour, Waypoint};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    waypoints: Vec<Waypoint>,

    /// Index of the previous waypoint of the current segment
    current_index: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Position of the route's cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    /// Following the segment starting at the given waypoint index
    InProgress(usize),

    /// On the terminal segment
    Complete,
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("A route needs at least 2 waypoints, found {0}")]
    TooFewWaypoints(usize),

    #[error("Cannot advance past the terminal segment (index {0})")]
    RouteEnd(usize),

    #[error("Could not read route file: {0}")]
    FileReadError(std::io::Error),

    #[error("Could not read route: {0}")]
    CsvError(csv::Error),

    #[error("Route line {line}: {reason}")]
    ParseError { line: usize, reason: String },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Route {
    /// Create a new route starting on its first segment.
    pub fn new(waypoints: Vec<Waypoint>) -> Result<Self, RouteError> {
        if waypoints.len() < 2 {
            return Err(RouteError::TooFewWaypoints(waypoints.len()));
        }

        Ok(Self {
            waypoints,
            current_index: 0,
        })
    }

    /// The waypoint at the start of the current segment.
    pub fn previous_waypoint(&self) -> &Waypoint {
        &self.waypoints[self.current_index]
    }

    /// The waypoint at the end of the current segment, which the vessel is heading for.
    pub fn next_waypoint(&self) -> &Waypoint {
        &self.waypoints[self.current_index + 1]
    }

    /// True if the current segment is the last one.
    pub fn is_complete(&self) -> bool {
        self.current_index == self.terminal_index()
    }

    /// Move onto the next segment.
    ///
    /// Fails if the route is already complete.
    pub fn advance(&mut self) -> Result<(), RouteError> {
        if self.is_complete() {
            return Err(RouteError::RouteEnd(self.current_index));
        }

        self.current_index += 1;

        Ok(())
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn state(&self) -> RouteState {
        match self.is_complete() {
            true => RouteState::Complete,
            false => RouteState::InProgress(self.current_index),
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Number of waypoints, always at least 2.
    pub fn num_waypoints(&self) -> usize {
        self.waypoints.len()
    }

    fn terminal_index(&self) -> usize {
        self.waypoints.len() - 2
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn wp(lat: f64, lon: f64, behaviour: ArrivalBehaviour) -> Waypoint {
        Waypoint::new(lat, lon, 0.01, behaviour)
    }

    #[test]
    fn test_too_few_waypoints() {
        assert!(matches!(
            Route::new(vec![]),
            Err(RouteError::TooFewWaypoints(0))
        ));
        assert!(matches!(
            Route::new(vec![wp(45.0, -93.0, ArrivalBehaviour::Loiter)]),
            Err(RouteError::TooFewWaypoints(1))
        ));
    }

    #[test]
    fn test_advance_count() {
        for n in 2..8 {
            let wps = (0..n)
                .map(|i| wp(45.0 + i as f64, -93.0, ArrivalBehaviour::ContinueToNext))
                .collect();
            let mut route = Route::new(wps).unwrap();
            assert_eq!(route.num_waypoints(), n);

            let mut advances = 0;
            while !route.is_complete() {
                route.advance().unwrap();
                advances += 1;
            }

            assert_eq!(advances, n - 2);
            assert_eq!(route.state(), RouteState::Complete);
            assert!(matches!(route.advance(), Err(RouteError::RouteEnd(_))));

            // The failed advance leaves the cursor alone
            assert_eq!(route.current_index(), n - 2);
        }
    }

    #[test]
    fn test_three_waypoint_route() {
        let a = wp(45.0, -93.0, ArrivalBehaviour::ContinueToNext);
        let b = wp(46.0, -92.0, ArrivalBehaviour::ContinueToNext);
        let c = wp(47.0, -91.0, ArrivalBehaviour::Loiter);

        let mut route = Route::new(vec![a, b, c]).unwrap();
        assert_eq!(route.state(), RouteState::InProgress(0));
        assert_eq!(route.previous_waypoint(), &a);
        assert_eq!(route.next_waypoint(), &b);
        assert!(!route.is_complete());

        route.advance().unwrap();
        assert_eq!(route.previous_waypoint(), &b);
        assert_eq!(route.next_waypoint(), &c);

        // With 3 waypoints the terminal index is 1
        assert!(route.is_complete());
        assert!(route.advance().is_err());
    }

    #[test]
    fn test_two_waypoint_route_is_complete() {
        let route = Route::new(vec![
            wp(45.0, -93.0, ArrivalBehaviour::ContinueToNext),
            wp(46.0, -93.0, ArrivalBehaviour::Loiter),
        ])
        .unwrap();

        assert!(route.is_complete());
        assert_eq!(route.state(), RouteState::Complete);
    }
}
