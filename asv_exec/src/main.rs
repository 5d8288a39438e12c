//! Main ASV executable entry point.
//!
//! # Architecture
//!
//! Two independently scheduled loops run once the executable is initialised:
//!
//!     - The bus drain, which delivers pending messages to their destination clients.
//!     - The pilot, which reads the GPS, follows the route and sends helm commands over the bus.
//!
//! The helm adapter receives the pilot's commands from the bus and drives the helm, replying with
//! the actual helm state. In this executable both the GPS and the helm are provided by the
//! simulated vessel.
//!
//! The executable exits once the pilot stops, either at the end of its route or after the
//! optional `--duration` has elapsed.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use asv_lib::{
    ctrl,
    helm::HelmAdapter,
    params::AsvExecParams,
    pilot::{Pilot, PilotCore, PilotInbox, PilotParams, PilotState},
    route::{self, Route, RouteParams},
    sim::{SimParams, SimVessel},
};
use comms_if::bus::MessageBus;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::{
    path::PathBuf,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};
use structopt::StructOpt;

// Internal
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Period at which the main thread checks on the pilot.
const MONITOR_PERIOD: Duration = Duration::from_millis(100);

/// Longest time to wait for the bus to empty before shutting it down.
const BUS_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// ASV navigation executable
#[derive(Debug, StructOpt)]
#[structopt(name = "asv_exec")]
struct Opt {
    /// Route file to follow, overriding route.toml
    #[structopt(short, long, parse(from_os_str))]
    route: Option<PathBuf>,

    /// Most verbose level of log messages, one of `info`, `debug` or `trace`
    #[structopt(short, long, default_value = "trace")]
    log_level: LevelFilter,

    /// Stop the pilot after this many seconds
    #[structopt(short, long, parse(try_from_str = parse_duration))]
    duration: Option<Duration>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("asv_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opt.log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("ASV Navigation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let exec_params: AsvExecParams =
        util::params::load("asv_exec.toml").wrap_err("Could not load exec params")?;
    let pilot_params: PilotParams =
        util::params::load("pilot.toml").wrap_err("Could not load pilot params")?;
    let ctrl_params: ctrl::Params =
        util::params::load("ctrl.toml").wrap_err("Could not load controller params")?;
    let sim_params: SimParams =
        util::params::load("sim.toml").wrap_err("Could not load sim params")?;

    info!("Exec parameters loaded");

    // ---- LOAD ROUTE ----

    let route = load_route(&opt).wrap_err("Failed to load the route")?;
    info!(
        "Route loaded with {} waypoints, first target {}",
        route.num_waypoints(),
        route.next_waypoint()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let bus = Arc::new(MessageBus::new());
    let vessel = Arc::new(SimVessel::new(sim_params));

    bus.register(Arc::new(HelmAdapter::new(
        exec_params.helm_id.as_str(),
        vessel.clone(),
        bus.dispatcher(),
    )))
    .wrap_err("Failed to register the helm adapter")?;
    info!("Helm adapter initialised");

    let inbox = Arc::new(PilotInbox::new(exec_params.pilot_id.as_str()));
    bus.register(inbox.clone())
        .wrap_err("Failed to register the pilot")?;

    let controllers = ctrl_params
        .build()
        .wrap_err("Failed to build the controllers")?;

    let core = PilotCore::new(
        &pilot_params,
        route,
        controllers,
        vessel,
        bus.dispatcher(),
        inbox,
        &exec_params.helm_id,
    )
    .wrap_err("Failed to initialise the pilot")?;
    let mut pilot = Pilot::new(core, &pilot_params);
    info!("Pilot initialised");

    info!("Module initialisation complete\n");

    // ---- START LOOPS ----

    let drain_jh = bus
        .spawn_drain(exec_params.bus_period())
        .wrap_err("Failed to start the bus drain")?;

    pilot
        .start(pilot_params.period())
        .wrap_err("Failed to start the pilot")?;

    // ---- MONITOR ----

    let start = Instant::now();

    loop {
        let state = pilot.state().wrap_err("Failed to get the pilot state")?;

        if let PilotState::Stopped(reason) = state {
            info!("Pilot stopped: {:?}", reason);
            break;
        }

        if let Some(d) = opt.duration {
            if start.elapsed() >= d {
                info!("Run duration of {:?} elapsed", d);
                pilot.stop();
            }
        }

        thread::sleep(MONITOR_PERIOD);
    }

    pilot.join().wrap_err("The pilot exited with an error")?;

    if let Some(r) = pilot.route() {
        info!(
            "Finished on segment {} of {}",
            r.current_index(),
            r.num_waypoints() - 1
        );
    }

    // ---- SHUTDOWN ----

    // Let the final command through before stopping the bus
    let flush_start = Instant::now();
    while bus.num_pending().wrap_err("Failed to get the bus queue length")? > 0 {
        if flush_start.elapsed() > BUS_FLUSH_TIMEOUT {
            warn!("Bus did not empty before shutdown");
            break;
        }
        thread::sleep(exec_params.bus_period());
    }

    bus.shutdown();
    drain_jh
        .join()
        .map_err(|_| eyre!("The bus drain thread panicked"))?
        .wrap_err("The bus drain exited with an error")?;

    info!("End of execution");

    Ok(())
}

/// Parse a run duration in seconds.
///
/// Negative, non-finite and overly long durations are rejected.
fn parse_duration(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|e| format!("{:?} is not a number of seconds: {}", s, e))?;

    Duration::try_from_secs_f64(secs).map_err(|e| format!("Invalid duration {:?}: {}", s, e))
}

/// Load the route, either from the file given on the command line or as described by route.toml.
///
/// Relative route file paths in route.toml are resolved against the software root.
fn load_route(opt: &Opt) -> Result<Route, Report> {
    if let Some(ref path) = opt.route {
        info!("Loading route from {:?}", path);
        return Ok(route::load_route_file(path)?);
    }

    let params: RouteParams = util::params::load("route.toml")?;

    let params = match params {
        RouteParams::File { path } if path.is_relative() => {
            let root = host::get_asv_sw_root()
                .wrap_err("Cannot resolve the route file, ASV_SW_ROOT is not set")?;
            RouteParams::File {
                path: root.join(path),
            }
        }
        p => p,
    };

    info!("Loading route: {:?}", params);

    Ok(params.build()?)
}
