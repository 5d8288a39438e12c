//! # Pilot
//!
//! The pilot periodically reads the GPS, follows the route, runs the throttle and rudder
//! controllers and sends helm commands over the bus. It runs on its own worker thread, scheduled
//! independently of the bus drain.
//!
//! The pilot moves through the states `Idle -> WaitingForGpsFix -> Running -> Stopped`. While
//! waiting for a fix the worker backs off for the GPS retry period between checks. Stopping is
//! cooperative: the stop flag is checked once per tick, and during sleeps.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod gps;
mod inbox;
mod params;
mod tick;
mod worker;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use gps::GpsProvider;
pub use inbox::PilotInbox;
pub use params::PilotParams;
pub use tick::{PilotCore, TickOutcome, TickReport};

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::info;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, PoisonError, RwLock,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use comms_if::{bus::BusError, msg::MessageTypeError};

use crate::{
    ctrl::CtrlError,
    nav::{LatLon, NavError},
    route::{Route, RouteError},
};
use worker::worker_thread;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

pub struct Pilot {
    shared: Arc<Shared>,

    /// The pilot's state while the worker isn't holding it
    core: Option<PilotCore>,

    worker_jh: Option<JoinHandle<Result<PilotCore, PilotError>>>,
}

/// A handle which can stop the pilot from any thread.
#[derive(Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    state: RwLock<PilotState>,
    stop_requested: AtomicBool,
    gps_retry: Duration,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PilotState {
    /// Not yet started
    Idle,

    /// Started, but no GPS fix has been seen yet
    WaitingForGpsFix,

    /// Ticking periodically
    Running,

    /// The worker has exited
    Stopped(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stop` was called
    Requested,

    /// The final waypoint was reached
    RouteFinished,

    /// A loiter waypoint was reached
    Loitering,

    /// The bus shut down so commands can no longer be sent
    BusShutdown,
}

#[derive(Debug, thiserror::Error)]
pub enum PilotError {
    #[error("The pilot is already running")]
    AlreadyRunning,

    #[error("The GPS has no fix")]
    NoGpsFix,

    #[error("The GPS reported invalid data: position {0:?}, heading {1}")]
    InvalidGpsData(LatLon, f64),

    #[error("Navigation error: {0}")]
    NavError(NavError),

    #[error("Controller error: {0}")]
    CtrlError(CtrlError),

    #[error("Route error: {0}")]
    RouteError(RouteError),

    #[error("Bus error: {0}")]
    BusError(BusError),

    #[error("Message error: {0}")]
    MessageError(MessageTypeError),

    #[error("Could not spawn the pilot worker: {0}")]
    SpawnError(std::io::Error),

    #[error("The pilot worker panicked")]
    WorkerPanicked,

    #[error("The pilot's state was lost when its worker failed, it cannot be restarted")]
    CoreLost,

    #[error("Sync primitive is poisoned")]
    PoisonError,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl Pilot {
    pub fn new(core: PilotCore, params: &PilotParams) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(PilotState::Idle),
                stop_requested: AtomicBool::new(false),
                gps_retry: params.gps_retry(),
            }),
            core: Some(core),
            worker_jh: None,
        }
    }

    /// Start the pilot's worker, ticking every `period` once a GPS fix is available.
    ///
    /// A stopped pilot may be started again, carrying on from where its route left off. Starting
    /// a pilot which is already waiting or running fails with `AlreadyRunning`.
    pub fn start(&mut self, period: Duration) -> Result<(), PilotError> {
        if self.core.is_none() && self.worker_jh.is_none() {
            return Err(PilotError::CoreLost);
        }

        match self.state()? {
            PilotState::WaitingForGpsFix | PilotState::Running => {
                return Err(PilotError::AlreadyRunning)
            }
            PilotState::Stopped(_) => self.join()?,
            PilotState::Idle => (),
        }

        let core = self.core.take().ok_or(PilotError::CoreLost)?;

        self.shared.stop_requested.store(false, Ordering::SeqCst);
        *self.shared.state.write()? = PilotState::WaitingForGpsFix;

        info!("Starting pilot with period {:?}", period);

        let shared = self.shared.clone();
        let jh = thread::Builder::new()
            .name("pilot".into())
            .spawn(move || worker_thread(core, shared, period))
            .map_err(PilotError::SpawnError)?;

        self.worker_jh = Some(jh);

        Ok(())
    }

    /// Ask the worker to exit after its current tick.
    ///
    /// Idempotent, and has no effect if the pilot isn't running.
    pub fn stop(&self) {
        self.shared.request_stop()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: self.shared.clone(),
        }
    }

    /// Wait for the worker to exit, recovering the pilot's state from it.
    ///
    /// Does nothing if the worker was never started or has already been joined. If the worker
    /// failed its state is lost, and the pilot can't be started again.
    pub fn join(&mut self) -> Result<(), PilotError> {
        let jh = match self.worker_jh.take() {
            Some(jh) => jh,
            None => return Ok(()),
        };

        let core = jh.join().map_err(|_| PilotError::WorkerPanicked)??;
        self.core = Some(core);

        Ok(())
    }

    pub fn state(&self) -> Result<PilotState, PilotError> {
        Ok(*self.shared.state.read()?)
    }

    /// The pilot's route, only available while the worker isn't running.
    pub fn route(&self) -> Option<&Route> {
        self.core.as_ref().map(|c| c.route())
    }
}

impl Drop for Pilot {
    fn drop(&mut self) {
        self.stop();
        self.join().ok();
    }
}

impl StopHandle {
    pub fn stop(&self) {
        self.shared.request_stop()
    }
}

impl Shared {
    fn request_stop(&self) {
        if !self.stop_requested.swap(true, Ordering::SeqCst) {
            info!("Pilot stop requested");
        }
    }

    fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: PilotState) -> Result<(), PilotError> {
        *self.state.write()? = state;
        Ok(())
    }
}

impl<T> From<PoisonError<T>> for PilotError {
    fn from(_: PoisonError<T>) -> Self {
        PilotError::PoisonError
    }
}

impl From<NavError> for PilotError {
    fn from(e: NavError) -> Self {
        PilotError::NavError(e)
    }
}

impl From<CtrlError> for PilotError {
    fn from(e: CtrlError) -> Self {
        PilotError::CtrlError(e)
    }
}

impl From<RouteError> for PilotError {
    fn from(e: RouteError) -> Self {
        PilotError::RouteError(e)
    }
}

impl From<MessageTypeError> for PilotError {
    fn from(e: MessageTypeError) -> Self {
        PilotError::MessageError(e)
    }
}
