//! # Helm adapter
//!
//! The bus client which turns helm messages into actuator demands. Each command is forwarded to a
//! [`HelmSink`] (the serial driver, or the simulation), and the actual state reported by the sink
//! is sent back to the command's origin as a helm message.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{error, trace, warn};
use std::sync::Arc;

use comms_if::{
    bus::{BusError, Client, Dispatcher},
    eqpt::helm::HelmCmd,
    msg::{Message, MessageType, MessageTypeError},
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Something which can drive the throttle and rudder.
///
/// Called from the bus's drain thread.
pub trait HelmSink: Send + Sync {
    /// Demand the given setpoints, returning the actual state of the helm.
    fn actuate(&self, cmd: HelmCmd) -> Result<HelmCmd, HelmError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct HelmAdapter {
    client_id: String,
    sink: Arc<dyn HelmSink>,
    dispatcher: Dispatcher,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum HelmError {
    #[error("Could not read the helm command: {0}")]
    MessageError(MessageTypeError),

    #[error("The helm sink failed: {0}")]
    SinkError(String),

    #[error("Could not send the helm state: {0}")]
    BusError(BusError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HelmAdapter {
    pub fn new<S: Into<String>>(client_id: S, sink: Arc<dyn HelmSink>, dispatcher: Dispatcher) -> Self {
        Self {
            client_id: client_id.into(),
            sink,
            dispatcher,
        }
    }

    /// Actuate the command in `message` and reply to its origin with the actual state.
    pub fn handle(&self, message: &Message) -> Result<HelmCmd, HelmError> {
        let cmd = message
            .content()
            .helm_cmd()
            .map_err(HelmError::MessageError)?;

        trace!("Helm demand from {}: {}", message.origin_id(), cmd);

        let actual = self.sink.actuate(cmd)?;

        self.dispatcher
            .dispatch(Message::helm(
                self.client_id.as_str(),
                message.origin_id(),
                actual,
            ))
            .map_err(HelmError::BusError)?;

        Ok(actual)
    }
}

impl Client for HelmAdapter {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn accepted_type(&self) -> MessageType {
        MessageType::Helm
    }

    fn receive(&self, message: &Message) {
        match self.handle(message) {
            Ok(_) => (),
            // Replies are lost once the bus has shut down, which is expected during exit
            Err(HelmError::BusError(BusError::NotRunning)) => {
                warn!("Helm state not sent, the bus has shut down")
            }
            Err(e) => error!("Helm command from {} failed: {}", message.origin_id(), e),
        }
    }
}
