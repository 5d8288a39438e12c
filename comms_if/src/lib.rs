//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software: the message type passed
//! between modules, the equipment wire formats, and the message bus which carries messages
//! between independently scheduled modules.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Messages passed over the bus
pub mod msg;

/// Command and response definitions for equipment (like the helm)
pub mod eqpt;

/// Message bus, client registry and drain loop
pub mod bus;
