//! GPS provider interface

use crate::nav::LatLon;

/// A source of position and heading fixes.
///
/// The pilot samples the provider once per tick from its own thread. Implementors must be safe to
/// read while being updated by their own driver.
pub trait GpsProvider: Send + Sync {
    /// True if the receiver currently has a valid fix.
    fn fix_valid(&self) -> bool;

    /// Current position as `[latitude, longitude]` in degrees.
    fn coordinates(&self) -> LatLon;

    /// Current heading in degrees clockwise from true north.
    fn heading(&self) -> f64;
}
