//! Bus client through which the pilot receives the helm's actual state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, error, warn};
use std::sync::Mutex;

use comms_if::{
    bus::Client,
    eqpt::helm::HelmCmd,
    msg::{Message, MessageType},
};

use super::PilotError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Records the latest actual helm state reported back to the pilot.
pub struct PilotInbox {
    client_id: String,
    latest: Mutex<Option<HelmCmd>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PilotInbox {
    pub fn new<S: Into<String>>(client_id: S) -> Self {
        Self {
            client_id: client_id.into(),
            latest: Mutex::new(None),
        }
    }

    /// The most recently reported actual helm state, if any has been received.
    pub fn latest_state(&self) -> Result<Option<HelmCmd>, PilotError> {
        Ok(*self.latest.lock()?)
    }
}

impl Client for PilotInbox {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn accepted_type(&self) -> MessageType {
        MessageType::Helm
    }

    fn receive(&self, message: &Message) {
        let state = match message.content().helm_cmd() {
            Ok(s) => s,
            Err(e) => {
                warn!("Ignoring helm state from {}: {}", message.origin_id(), e);
                return;
            }
        };

        debug!("Helm state from {}: {}", message.origin_id(), state);

        match self.latest.lock() {
            Ok(mut l) => *l = Some(state),
            Err(_) => error!("Pilot inbox lock is poisoned, helm state lost"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::msg::{MessageContent, Priority};

    #[test]
    fn test_inbox() {
        let inbox = PilotInbox::new("pilot");
        assert_eq!(inbox.latest_state().unwrap(), None);

        inbox.receive(&Message::helm("helm", "pilot", HelmCmd::new(30.0, 0.1)));
        inbox.receive(&Message::helm("helm", "pilot", HelmCmd::new(35.0, 0.2)));
        assert_eq!(inbox.latest_state().unwrap(), Some(HelmCmd::new(35.0, 0.2)));

        // Malformed states are ignored
        inbox.receive(&Message::new(
            "helm",
            "pilot",
            Priority::Normal,
            MessageContent::Helm("<abc>".into()),
        ));
        assert_eq!(inbox.latest_state().unwrap(), Some(HelmCmd::new(35.0, 0.2)));
    }
}
