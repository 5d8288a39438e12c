//! # Message Bus
//!
//! The bus is the only channel between independently scheduled modules. Producers hand messages
//! to the bus with `dispatch`, which only enqueues them. The bus's own drain loop then empties the
//! pending queue and delivers each message to the registered client named as its destination.
//!
//! Delivery is gated on type: a client declares the single message type it accepts, and messages
//! of any other type are dropped rather than delivered. Messages addressed to a client which is not
//! registered are dropped as well. Neither case is retried, as a retry would reorder the messages
//! behind it.
//!
//! Pending messages are delivered first-in first-out. Within one drain, messages are delivered in
//! the order they were dispatched.
//!
//! Messages dispatched while a drain is delivering (for example a client replying from within
//! `receive`) are queued for the next drain.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod drain;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError, RwLock,
    },
};

use log::{error, warn};

use crate::msg::{Message, MessageType};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A module which can receive messages from the bus.
///
/// `receive` is called from the bus's drain thread, so implementors must synchronise any state
/// they share with other threads.
pub trait Client: Send + Sync {
    /// Globally unique identifier of this client.
    fn client_id(&self) -> &str;

    /// The single message type this client accepts.
    fn accepted_type(&self) -> MessageType;

    /// Handle a message delivered by the bus.
    fn receive(&self, message: &Message);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The message bus.
///
/// Construct one per process (or per test) and share it with `Arc`. Modules which only need to
/// send messages should be given a [`Dispatcher`] instead.
pub struct MessageBus {
    registry: RwLock<HashMap<String, Arc<dyn Client>>>,
    queue: Arc<Queue>,
}

/// A send-only handle onto the bus's pending queue.
#[derive(Clone)]
pub struct Dispatcher {
    queue: Arc<Queue>,
}

/// Outcome of one drain of the pending queue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Messages delivered to their destination
    pub delivered: usize,

    /// Messages dropped because the destination doesn't accept their type
    pub type_mismatched: usize,

    /// Messages dropped because their destination isn't registered
    pub unroutable: usize,
}

struct Queue {
    pending: Mutex<VecDeque<Message>>,
    running: AtomicBool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("A client with ID {0:?} is already registered")]
    DuplicateClient(String),

    #[error("The bus has been shut down")]
    NotRunning,

    #[error("Sync primitive is poisoned")]
    PoisonError,

    #[error("Could not spawn the drain thread: {0}")]
    SpawnError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MessageBus {
    /// Create a new, running bus with no clients.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            queue: Arc::new(Queue {
                pending: Mutex::new(VecDeque::new()),
                running: AtomicBool::new(true),
            }),
        }
    }

    /// Register a client with the bus.
    ///
    /// Fails if a client with the same ID is already registered. Clients are never removed.
    pub fn register(&self, client: Arc<dyn Client>) -> Result<(), BusError> {
        let mut registry = self.registry.write()?;

        let id = client.client_id().to_string();
        if registry.contains_key(&id) {
            return Err(BusError::DuplicateClient(id));
        }

        registry.insert(id, client);

        Ok(())
    }

    /// Enqueue a message for delivery on the next drain.
    ///
    /// Never blocks on delivery.
    pub fn dispatch(&self, message: Message) -> Result<(), BusError> {
        self.queue.push(message)
    }

    /// Get a send-only handle onto this bus.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            queue: self.queue.clone(),
        }
    }

    /// Drain the entire pending queue, delivering each message to its destination.
    pub fn run_once(&self) -> Result<DrainReport, BusError> {
        if !self.is_running() {
            return Err(BusError::NotRunning);
        }

        // Take the whole batch so that the queue lock isn't held while clients run
        let batch = std::mem::take(&mut *self.queue.pending.lock()?);

        let mut report = DrainReport::default();

        for message in batch {
            // Clone the client out so the registry isn't locked during delivery
            let client = self.registry.read()?.get(message.destination_id()).cloned();

            let client = match client {
                Some(c) => c,
                None => {
                    error!(
                        "Message from {:?} addressed to unregistered client {:?}, dropped",
                        message.origin_id(),
                        message.destination_id()
                    );
                    report.unroutable += 1;
                    continue;
                }
            };

            if client.accepted_type() != message.message_type() {
                warn!(
                    "Client {:?} accepts {:?} messages but message from {:?} is {:?}, dropped",
                    client.client_id(),
                    client.accepted_type(),
                    message.origin_id(),
                    message.message_type()
                );
                report.type_mismatched += 1;
                continue;
            }

            client.receive(&message);
            report.delivered += 1;
        }

        Ok(report)
    }

    /// Number of messages waiting for the next drain.
    pub fn num_pending(&self) -> Result<usize, BusError> {
        Ok(self.queue.pending.lock()?.len())
    }

    /// Number of registered clients.
    pub fn num_clients(&self) -> Result<usize, BusError> {
        Ok(self.registry.read()?.len())
    }

    pub fn is_running(&self) -> bool {
        self.queue.running.load(Ordering::SeqCst)
    }

    /// Shut the bus down.
    ///
    /// Pending messages are discarded, further dispatches fail with `NotRunning` and any drain
    /// thread exits after its current drain.
    pub fn shutdown(&self) {
        match self.queue.pending.lock() {
            Ok(mut pending) => {
                self.queue.running.store(false, Ordering::SeqCst);
                pending.clear();
            }
            Err(_) => self.queue.running.store(false, Ordering::SeqCst),
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Enqueue a message for delivery on the next drain.
    pub fn dispatch(&self, message: Message) -> Result<(), BusError> {
        self.queue.push(message)
    }

    pub fn is_running(&self) -> bool {
        self.queue.running.load(Ordering::SeqCst)
    }
}

impl DrainReport {
    /// Total number of messages dropped in this drain.
    pub fn dropped(&self) -> usize {
        self.type_mismatched + self.unroutable
    }
}

impl Queue {
    fn push(&self, message: Message) -> Result<(), BusError> {
        let mut pending = self.pending.lock()?;

        // Checked under the lock so a push can't race a shutdown
        if !self.running.load(Ordering::SeqCst) {
            return Err(BusError::NotRunning);
        }

        pending.push_back(message);

        Ok(())
    }
}

impl<T> From<PoisonError<T>> for BusError {
    fn from(_: PoisonError<T>) -> Self {
        BusError::PoisonError
    }
}
