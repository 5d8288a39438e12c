//! # ASV library.
//!
//! This library allows the executable, benchmarks and other crates in the workspace to access
//! items defined inside the ASV crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Controllers - PID, blended cross-track/heading and constant output controllers
pub mod ctrl;

/// Helm adapter - turns helm messages from the bus into actuator demands
pub mod helm;

/// Navigation maths - great-circle bearings, distances and cross-track distance
pub mod nav;

/// Executable parameters
pub mod params;

/// Pilot - the periodic loop which follows the route
pub mod pilot;

/// Routes and waypoints
pub mod route;

/// Simulated vessel - stands in for the GPS and helm hardware
pub mod sim;
