//! Periodic drain of the bus, run on its own thread.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, info, warn};

use super::{BusError, MessageBus};

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl MessageBus {
    /// Spawn a thread which drains the bus every `period` until the bus is shut down.
    pub fn spawn_drain(
        self: &Arc<Self>,
        period: Duration,
    ) -> Result<JoinHandle<Result<(), BusError>>, BusError> {
        let bus = self.clone();

        thread::Builder::new()
            .name("bus_drain".into())
            .spawn(move || drain_thread(bus, period))
            .map_err(BusError::SpawnError)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn drain_thread(bus: Arc<MessageBus>, period: Duration) -> Result<(), BusError> {
    info!("Bus drain started, period {:?}", period);

    while bus.is_running() {
        let cycle_start = Instant::now();

        match bus.run_once() {
            Ok(report) => {
                if report.dropped() > 0 {
                    debug!("Bus drain dropped {} message(s): {:?}", report.dropped(), report);
                }
            }
            // Shut down between the check and the drain
            Err(BusError::NotRunning) => break,
            Err(e) => return Err(e),
        }

        let cycle_dur = Instant::now() - cycle_start;
        match period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Bus drain overran by {:.06} s",
                (cycle_dur - period).as_secs_f64()
            ),
        }
    }

    info!("Bus drain stopped");

    Ok(())
}
