//! Route sources: route files and two-point routes

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::{fs, path::Path};

use super::{ArrivalBehaviour, Route, RouteError, Waypoint};
use crate::nav::LatLon;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const COMMENT_CHAR: u8 = b'#';

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One record of a route file.
#[derive(Debug, Deserialize)]
struct RouteRecord {
    latitude: f64,
    longitude: f64,
    tolerance: f64,
    behaviour: ArrivalBehaviour,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a route from a file of `lat,long,tolerance,BEHAVIOUR` lines.
pub fn load_route_file<P: AsRef<Path>>(path: P) -> Result<Route, RouteError> {
    let route_str = fs::read_to_string(path).map_err(RouteError::FileReadError)?;

    parse_route_str(&route_str)
}

/// Parse a route from `lat,long,tolerance,BEHAVIOUR` lines.
///
/// There is no header. Blank lines and lines starting with `#` are skipped, and whitespace around
/// fields is ignored. Line numbers in errors start at 1.
pub fn parse_route_str(route_str: &str) -> Result<Route, RouteError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(COMMENT_CHAR))
        .trim(Trim::All)
        .flexible(false)
        .from_reader(route_str.as_bytes());

    let lines = record_lines(route_str);
    let mut waypoints = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let line = lines.get(i).copied().unwrap_or(0);
        let record = result.map_err(|e| csv_error(e, line))?;

        waypoints.push(
            parse_waypoint(&record).map_err(|reason| RouteError::ParseError { line, reason })?,
        );
    }

    Route::new(waypoints)
}

/// Build a single segment route between two fixed points.
///
/// The start waypoint continues onto the end, and the end waypoint carries
/// `terminal_behaviour`. The route is complete from the start since its only segment is the
/// terminal one.
pub fn two_point_route(
    start: LatLon,
    end: LatLon,
    tolerance: f64,
    terminal_behaviour: ArrivalBehaviour,
) -> Result<Route, RouteError> {
    Route::new(vec![
        Waypoint::new(start[0], start[1], tolerance, ArrivalBehaviour::ContinueToNext),
        Waypoint::new(end[0], end[1], tolerance, terminal_behaviour),
    ])
}

fn parse_waypoint(record: &StringRecord) -> Result<Waypoint, String> {
    let r: RouteRecord = record.deserialize(None).map_err(|e| match e.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
        _ => e.to_string(),
    })?;

    if !(r.latitude.is_finite() && r.longitude.is_finite() && r.tolerance.is_finite()) {
        return Err(format!("non-finite value in {:?}", record));
    }
    if r.latitude.abs() > 90.0 || r.longitude.abs() > 180.0 {
        return Err(format!("({}, {}) is not a valid position", r.latitude, r.longitude));
    }
    if r.tolerance < 0.0 {
        return Err(format!("tolerance {} is negative", r.tolerance));
    }

    Ok(Waypoint::new(r.latitude, r.longitude, r.tolerance, r.behaviour))
}

/// Line numbers of the lines read as records, in order.
///
/// The reader discards empty lines and comments before it marks a record's position, so the
/// position it reports can't be used for this.
fn record_lines(route_str: &str) -> Vec<usize> {
    route_str
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.is_empty() && !l.as_bytes().starts_with(&[COMMENT_CHAR]))
        .map(|(i, _)| i + 1)
        .collect()
}

/// Wrap an error from the reader for the record on `line`.
fn csv_error(e: csv::Error, line: usize) -> RouteError {
    let reason = match e.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => Some(format!("expected {} fields, found {}", expected_len, len)),
        csv::ErrorKind::Utf8 { .. } => Some(e.to_string()),
        _ => None,
    };

    match reason {
        Some(reason) => RouteError::ParseError { line, reason },
        None => RouteError::CsvError(e),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ROUTE: &str = "\
# Lake loop
45,-93,0.01,NEXT_WAYPOINT

46, -92, 0.01, NEXT_WAYPOINT
47,-91,0.01,LOITER
";

    #[test]
    fn test_parse_route() {
        let route = parse_route_str(ROUTE).unwrap();

        assert_eq!(route.num_waypoints(), 3);
        assert_eq!(
            route.previous_waypoint(),
            &Waypoint::new(45.0, -93.0, 0.01, ArrivalBehaviour::ContinueToNext)
        );
        assert_eq!(
            route.waypoints()[2],
            Waypoint::new(47.0, -91.0, 0.01, ArrivalBehaviour::Loiter)
        );
    }

    #[test]
    fn test_parse_errors() {
        let err = |s: &str| match parse_route_str(s) {
            Err(RouteError::ParseError { line, .. }) => line,
            other => panic!("Expected parse error, got {:?}", other),
        };

        assert_eq!(err("45,-93,0.01,NEXT_WAYPOINT\n46,-92,0.01"), 2);
        assert_eq!(err("# header\n45,-93,0.01,STOP\n46,-92,0.01,LOITER"), 2);
        assert_eq!(err("45,abc,0.01,LOITER\n46,-92,0.01,LOITER"), 1);
        assert_eq!(err("95,-93,0.01,LOITER\n46,-92,0.01,LOITER"), 1);
        assert_eq!(err("45,-93,-1,LOITER\n46,-92,0.01,LOITER"), 1);
        assert_eq!(err("45,-93,NaN,LOITER\n46,-92,0.01,LOITER"), 1);
        assert_eq!(err("45,-93,0.01\n46,-92,0.01,LOITER"), 1);

        // Comments and blank lines still count towards the line number
        assert_eq!(err("# lake\n\n45,-93,0.01,LOITER\n\n# east shore\n46,-92,0.01,HOVER"), 6);
        assert_eq!(err("45,-93,0.01,LOITER\n\n46,-92,0.01,LOITER,5"), 3);

        assert!(matches!(
            parse_route_str("# nothing\n45,-93,0.01,LOITER\n"),
            Err(RouteError::TooFewWaypoints(1))
        ));
    }

    #[test]
    fn test_two_point_route() {
        let route =
            two_point_route([45.0, -93.0], [45.1, -93.0], 5.0, ArrivalBehaviour::Loiter).unwrap();

        assert!(route.is_complete());
        assert_eq!(route.previous_waypoint().behaviour(), ArrivalBehaviour::ContinueToNext);
        assert_eq!(route.next_waypoint().behaviour(), ArrivalBehaviour::Loiter);
        assert_eq!(route.next_waypoint().tolerance(), 5.0);
    }
}
