//! # Navigation module
//!
//! Great-circle navigation maths over `[latitude, longitude]` pairs given in degrees. All functions
//! are pure.
//!
//! Bearings are measured clockwise from true north. The cross-track distance is positive when the
//! position lies to the right of the track from the previous to the next waypoint, and negative to
//! the left.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use util::maths::{get_ang_dist_2pi, map_pi_to_2pi, rem_euclid};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Angular distances below this (radians) are treated as coincident points. About 6 mm on the
/// Earth's surface.
const COINCIDENT_THRESHOLD_RAD: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A `[latitude, longitude]` pair in degrees.
pub type LatLon = [f64; 2];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Values of the Earth's radius, selecting the units of a distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EarthRadius {
    /// Nautical miles
    Nmi,
    /// Statute miles
    Mi,
    /// Kilometers
    Km,
    /// Meters
    Meters,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum NavError {
    #[error("Track start and end coincide at {0:?}, the track has no bearing")]
    DegenerateTrack(LatLon),

    #[error("Coordinate {0:?} is not finite")]
    NonFiniteCoordinate(LatLon),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EarthRadius {
    /// The radius in the units of this variant.
    pub fn value(&self) -> f64 {
        match self {
            EarthRadius::Nmi => 3440.07,
            EarthRadius::Mi => 3958.761,
            EarthRadius::Km => 6371.009,
            EarthRadius::Meters => EarthRadius::Km.value() * 1000.0,
        }
    }
}

impl Default for EarthRadius {
    fn default() -> Self {
        EarthRadius::Meters
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Initial bearing (forward azimuth) from `a` to `b`, in radians in `[0, 2pi)`.
pub fn initial_bearing_rad(a: &LatLon, b: &LatLon) -> f64 {
    let (lat_a, lon_a) = (a[0].to_radians(), a[1].to_radians());
    let (lat_b, lon_b) = (b[0].to_radians(), b[1].to_radians());

    let delta_lon = lon_b - lon_a;

    let y = delta_lon.sin() * lat_b.cos();
    let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * delta_lon.cos();

    // atan2 gives [-pi, pi], the remainder catches the -0 -> 2pi edge
    rem_euclid(map_pi_to_2pi(y.atan2(x)), std::f64::consts::TAU)
}

/// Initial bearing from `a` to `b`, in degrees in `[0, 360)`.
pub fn initial_bearing_deg(a: &LatLon, b: &LatLon) -> f64 {
    initial_bearing_rad(a, b).to_degrees()
}

/// Central angle between `a` and `b`, in radians, using the haversine formula.
pub fn angular_distance(a: &LatLon, b: &LatLon) -> f64 {
    let (lat_a, lon_a) = (a[0].to_radians(), a[1].to_radians());
    let (lat_b, lon_b) = (b[0].to_radians(), b[1].to_radians());

    archav(hav(lat_b - lat_a) + lat_a.cos() * lat_b.cos() * hav(lon_b - lon_a))
}

/// Great-circle distance between `a` and `b` in the units of `radius`.
pub fn distance(a: &LatLon, b: &LatLon, radius: EarthRadius) -> f64 {
    angular_distance(a, b) * radius.value()
}

/// Distance of `position` from the great circle through `prev` and `next`, in the units of
/// `radius`.
///
/// Positive to the right of the `prev -> next` track. Fails if `prev` and `next` coincide, as the
/// track then has no direction, or if any coordinate is not finite.
pub fn cross_track_distance(
    prev: &LatLon,
    next: &LatLon,
    position: &LatLon,
    radius: EarthRadius,
) -> Result<f64, NavError> {
    for p in [prev, next, position].iter() {
        check_finite(p)?;
    }

    if angular_distance(prev, next) < COINCIDENT_THRESHOLD_RAD {
        return Err(NavError::DegenerateTrack(*prev));
    }

    let dist_13 = angular_distance(prev, position);
    let bear_13 = initial_bearing_rad(prev, position);
    let bear_12 = initial_bearing_rad(prev, next);

    Ok((dist_13.sin() * (bear_13 - bear_12).sin()).asin() * radius.value())
}

/// The point reached by travelling `dist` (in the units of `radius`) from `start` along the great
/// circle with initial bearing `bearing_rad`.
pub fn destination(start: &LatLon, bearing_rad: f64, dist: f64, radius: EarthRadius) -> LatLon {
    let ang_dist = dist / radius.value();
    let (lat_1, lon_1) = (start[0].to_radians(), start[1].to_radians());

    let lat_2 = (lat_1.sin() * ang_dist.cos()
        + lat_1.cos() * ang_dist.sin() * bearing_rad.cos())
    .asin();
    let lon_2 = lon_1
        + (bearing_rad.sin() * ang_dist.sin() * lat_1.cos())
            .atan2(ang_dist.cos() - lat_1.sin() * lat_2.sin());

    // Normalise longitude into [-180, 180)
    let lon_2_deg = rem_euclid(lon_2.to_degrees() + 540.0, 360.0) - 180.0;

    [lat_2.to_degrees(), lon_2_deg]
}

/// Signed difference from the `actual` heading to the `desired` one, in degrees in `(-180, 180]`.
///
/// Positive when the vessel must turn clockwise (to starboard) to reach the desired heading.
pub fn heading_error_deg(desired_deg: f64, actual_deg: f64) -> f64 {
    get_ang_dist_2pi(actual_deg.to_radians(), desired_deg.to_radians()).to_degrees()
}

/// The haversine function.
pub fn hav(theta: f64) -> f64 {
    (theta / 2.0).sin().powi(2)
}

/// The inverse haversine function.
pub fn archav(value: f64) -> f64 {
    // Rounding can push the argument just past 1 for antipodal points
    2.0 * value.max(0.0).min(1.0).sqrt().asin()
}

fn check_finite(p: &LatLon) -> Result<(), NavError> {
    if p[0].is_finite() && p[1].is_finite() {
        Ok(())
    } else {
        Err(NavError::NonFiniteCoordinate(*p))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const POINTS: [LatLon; 6] = [
        [45.0, -93.0],
        [46.0, -92.0],
        [-33.86, 151.21],
        [51.48, 0.0],
        [0.0, 179.9],
        [0.0, -179.9],
    ];

    const RADII: [EarthRadius; 4] = [
        EarthRadius::Nmi,
        EarthRadius::Mi,
        EarthRadius::Km,
        EarthRadius::Meters,
    ];

    #[test]
    fn test_radius_values() {
        assert_eq!(EarthRadius::Meters.value(), EarthRadius::Km.value() * 1000.0);
        assert_eq!(EarthRadius::Nmi.value(), 3440.07);
    }

    #[test]
    fn test_bearing() {
        let origin = [0.0, 0.0];

        assert!((initial_bearing_deg(&origin, &[1.0, 0.0]) - 0.0).abs() < 1e-9);
        assert!((initial_bearing_deg(&origin, &[0.0, 1.0]) - 90.0).abs() < 1e-9);
        assert!((initial_bearing_deg(&origin, &[-1.0, 0.0]) - 180.0).abs() < 1e-9);
        assert!((initial_bearing_deg(&origin, &[0.0, -1.0]) - 270.0).abs() < 1e-9);

        for a in POINTS.iter() {
            for b in POINTS.iter() {
                let bearing = initial_bearing_rad(a, b);
                assert!(bearing >= 0.0 && bearing < std::f64::consts::TAU);
            }
        }
    }

    #[test]
    fn test_distance() {
        // One degree of latitude is one minute of arc times 60
        let d = distance(&[45.0, -93.0], &[46.0, -93.0], EarthRadius::Nmi);
        assert!((d - 3440.07 * 1f64.to_radians()).abs() < 1e-9);

        // Across the antimeridian
        let d = distance(&[0.0, 179.9], &[0.0, -179.9], EarthRadius::Km);
        assert!((d - 6371.009 * 0.2f64.to_radians()).abs() < 1e-6);

        assert_eq!(distance(&[45.0, -93.0], &[45.0, -93.0], EarthRadius::Meters), 0.0);
    }

    #[test]
    fn test_distance_symmetry() {
        for a in POINTS.iter() {
            for b in POINTS.iter() {
                for r in RADII.iter() {
                    let ab = distance(a, b, *r);
                    let ba = distance(b, a, *r);
                    assert!((ab - ba).abs() <= 1e-9 * ab.max(1.0));
                }
            }
        }
    }

    #[test]
    fn test_cross_track_on_track() {
        // Along a meridian
        let xtd = cross_track_distance(
            &[45.0, -93.0],
            &[46.0, -93.0],
            &[45.5, -93.0],
            EarthRadius::Meters,
        )
        .unwrap();
        assert!(xtd.abs() < 1e-6);

        // Along an arbitrary great circle
        let prev = [45.0, -93.0];
        let next = [47.0, -91.0];
        let bearing = initial_bearing_rad(&prev, &next);
        for dist_m in [10.0, 1_000.0, 50_000.0].iter() {
            let pos = destination(&prev, bearing, *dist_m, EarthRadius::Meters);
            let xtd = cross_track_distance(&prev, &next, &pos, EarthRadius::Meters).unwrap();
            assert!(xtd.abs() < 1e-3, "xtd {} at {} m", xtd, dist_m);
        }
    }

    #[test]
    fn test_cross_track_sign() {
        let prev = [0.0, 0.0];
        let next = [1.0, 0.0];

        // Heading north, east is to the right
        let right = cross_track_distance(&prev, &next, &[0.5, 0.1], EarthRadius::Nmi).unwrap();
        let left = cross_track_distance(&prev, &next, &[0.5, -0.1], EarthRadius::Nmi).unwrap();

        assert!(right > 0.0);
        assert!(left < 0.0);
        assert!((right + left).abs() < 1e-9);

        // About 0.1 degrees of arc
        assert!((right - 3440.07 * 0.1f64.to_radians()).abs() < 0.01);
    }

    #[test]
    fn test_cross_track_errors() {
        let p = [45.0, -93.0];
        assert_eq!(
            cross_track_distance(&p, &p, &[45.5, -93.0], EarthRadius::Meters),
            Err(NavError::DegenerateTrack(p))
        );

        let bad = [std::f64::NAN, -93.0];
        assert!(matches!(
            cross_track_distance(&p, &[46.0, -93.0], &bad, EarthRadius::Meters),
            Err(NavError::NonFiniteCoordinate(_))
        ));
    }

    #[test]
    fn test_destination() {
        let start = [45.0, -93.0];
        let end = destination(&start, 90f64.to_radians(), 1000.0, EarthRadius::Meters);

        assert!((distance(&start, &end, EarthRadius::Meters) - 1000.0).abs() < 1e-6);
        assert!((initial_bearing_deg(&start, &end) - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_heading_error() {
        assert!((heading_error_deg(90.0, 80.0) - 10.0).abs() < 1e-9);
        assert!((heading_error_deg(80.0, 90.0) + 10.0).abs() < 1e-9);
        assert!((heading_error_deg(10.0, 350.0) - 20.0).abs() < 1e-9);
        assert!((heading_error_deg(350.0, 10.0) + 20.0).abs() < 1e-9);
        assert!(heading_error_deg(45.0, 45.0).abs() < 1e-12);
    }
}
