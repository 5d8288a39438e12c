//! Pilot worker thread

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::{error, info, warn};
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use comms_if::bus::BusError;

use super::{PilotCore, PilotError, PilotState, Shared, StopReason, TickOutcome};

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Longest single sleep, bounding how long a stop request goes unnoticed.
const MAX_SLEEP: Duration = Duration::from_millis(10);

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

pub(super) fn worker_thread(
    mut core: PilotCore,
    shared: Arc<Shared>,
    period: Duration,
) -> Result<PilotCore, PilotError> {
    // Wait for the GPS
    while !core.gps_ready() {
        if shared.stop_requested() {
            shared.set_state(PilotState::Stopped(StopReason::Requested))?;
            return Ok(core);
        }

        warn!("GPS not ready, retrying in {:?}", shared.gps_retry);
        sleep_unless_stopped(&shared, shared.gps_retry);
    }

    info!("GPS ready, pilot running");

    core.start();
    shared.set_state(PilotState::Running)?;

    let reason = loop {
        if shared.stop_requested() {
            break StopReason::Requested;
        }

        let cycle_start = Instant::now();

        match core.tick() {
            Ok(TickOutcome::Continue(_)) => (),
            Ok(TickOutcome::Stop(r)) => break r,
            Err(PilotError::BusError(BusError::NotRunning)) => {
                warn!("The bus has shut down, stopping the pilot");
                break StopReason::BusShutdown;
            }
            // The vessel keeps trying on the next tick
            Err(e) => error!("Pilot tick failed: {}", e),
        }

        let cycle_dur = Instant::now() - cycle_start;
        match period.checked_sub(cycle_dur) {
            Some(d) => sleep_unless_stopped(&shared, d),
            None => warn!(
                "Pilot tick overran by {:.06} s",
                (cycle_dur - period).as_secs_f64()
            ),
        }
    };

    info!("Pilot stopped: {:?}", reason);
    shared.set_state(PilotState::Stopped(reason))?;

    Ok(core)
}

/// Sleep for `dur`, waking early if a stop is requested.
fn sleep_unless_stopped(shared: &Shared, dur: Duration) {
    let end = Instant::now() + dur;

    while !shared.stop_requested() {
        let now = Instant::now();
        if now >= end {
            break;
        }

        thread::sleep((end - now).min(MAX_SLEEP));
    }
}
