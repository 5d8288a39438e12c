//! Single tick of the pilot

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{info, trace};
use std::sync::Arc;

use comms_if::{
    bus::{Client, Dispatcher},
    eqpt::helm::HelmCmd,
    msg::Message,
};

use super::{GpsProvider, PilotError, PilotInbox, PilotParams, StopReason};
use crate::{
    ctrl::{check_roles, Controller, ControllerKind, OUTPUT_LIMIT},
    nav::{self, EarthRadius, LatLon},
    route::{ArrivalBehaviour, Route},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Everything a pilot tick reads and mutates. Owned by the pilot's worker while it runs.
pub struct PilotCore {
    route: Route,
    throttle_ctrl: Controller,
    rudder_ctrl: Controller,

    gps: Arc<dyn GpsProvider>,
    dispatcher: Dispatcher,
    inbox: Arc<PilotInbox>,

    helm_id: String,
    distance_units: EarthRadius,
}

/// Monitoring quantities from one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Index of the route segment being followed
    pub segment: usize,

    /// Cross-track distance, positive right of track
    pub xtd: f64,

    /// Heading error in degrees, positive to starboard
    pub heading_error_deg: f64,

    /// The command sent to the helm
    pub cmd: HelmCmd,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// A command was sent and the pilot should keep going
    Continue(TickReport),

    /// The pilot must stop, a neutral command has been sent
    Stop(StopReason),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PilotCore {
    /// Create the pilot's state.
    ///
    /// The throttle controller must be `Trivial` or `Pid`, and the rudder controller `Pid` or
    /// `Blended`.
    pub fn new(
        params: &PilotParams,
        route: Route,
        controllers: (Controller, Controller),
        gps: Arc<dyn GpsProvider>,
        dispatcher: Dispatcher,
        inbox: Arc<PilotInbox>,
        helm_id: &str,
    ) -> Result<Self, PilotError> {
        let (throttle_ctrl, rudder_ctrl) = controllers;
        check_roles(&throttle_ctrl, &rudder_ctrl)?;

        Ok(Self {
            route,
            throttle_ctrl,
            rudder_ctrl,
            gps,
            dispatcher,
            inbox,
            helm_id: helm_id.into(),
            distance_units: params.distance_units,
        })
    }

    /// Reset the controllers ahead of the first tick.
    pub fn start(&mut self) {
        self.throttle_ctrl.start();
        self.rudder_ctrl.start();
    }

    pub fn gps_ready(&self) -> bool {
        self.gps.fix_valid()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Run one tick of the pilot.
    ///
    /// Errors leave the route in a consistent state, so the caller may simply try again on the
    /// next tick.
    pub fn tick(&mut self) -> Result<TickOutcome, PilotError> {
        let (position, heading_deg) = self.read_gps()?;

        if let Some(reason) = self.check_waypoint_advance(&position)? {
            self.send(HelmCmd::neutral())?;
            return Ok(TickOutcome::Stop(reason));
        }

        let prev = self.route.previous_waypoint().coordinates();
        let next = self.route.next_waypoint().coordinates();

        let xtd = nav::cross_track_distance(&prev, &next, &position, self.distance_units)?;
        let heading_error_deg =
            nav::heading_error_deg(nav::initial_bearing_deg(&position, &next), heading_deg);
        let heading_error_rad = heading_error_deg.to_radians();

        let actual_throttle = self
            .inbox
            .latest_state()?
            .map(|s| s.throttle)
            .unwrap_or(0.0);

        let throttle_output = self.throttle_ctrl.compute(&controller_inputs(
            self.throttle_ctrl.kind(),
            actual_throttle,
            xtd,
            heading_error_rad,
            actual_throttle,
        ))?;
        let throttle =
            throttle_demand(self.throttle_ctrl.kind(), actual_throttle, throttle_output);
        let rudder = self.rudder_ctrl.compute(&controller_inputs(
            self.rudder_ctrl.kind(),
            xtd,
            xtd,
            heading_error_rad,
            throttle,
        ))?;

        let cmd = HelmCmd::new(throttle, rudder / 100.0);
        self.send(cmd)?;

        let report = TickReport {
            segment: self.route.current_index(),
            xtd,
            heading_error_deg,
            cmd,
        };
        trace!("Pilot tick: {:?}", report);

        Ok(TickOutcome::Continue(report))
    }

    /// Apply the arrival behaviour of the next waypoint if the vessel is within its tolerance.
    ///
    /// Returns the reason to stop, if the pilot should stop.
    pub fn check_waypoint_advance(
        &mut self,
        position: &LatLon,
    ) -> Result<Option<StopReason>, PilotError> {
        let next = *self.route.next_waypoint();
        let dist = nav::distance(position, &next.coordinates(), self.distance_units);

        if dist > next.tolerance() {
            return Ok(None);
        }

        match next.behaviour() {
            ArrivalBehaviour::ContinueToNext if self.route.is_complete() => {
                info!("Arrived at final waypoint {}, route finished", next);
                Ok(Some(StopReason::RouteFinished))
            }
            ArrivalBehaviour::ContinueToNext => {
                self.route.advance()?;
                info!(
                    "Arrived at waypoint {}, advancing to segment {}",
                    next,
                    self.route.current_index()
                );
                Ok(None)
            }
            ArrivalBehaviour::Loiter => {
                info!("Arrived at waypoint {}, loitering", next);
                Ok(Some(StopReason::Loitering))
            }
        }
    }

    fn read_gps(&self) -> Result<(LatLon, f64), PilotError> {
        if !self.gps.fix_valid() {
            return Err(PilotError::NoGpsFix);
        }

        let position = self.gps.coordinates();
        let heading = self.gps.heading();

        if position.iter().chain(Some(&heading)).all(|v| v.is_finite()) {
            Ok((position, heading))
        } else {
            Err(PilotError::InvalidGpsData(position, heading))
        }
    }

    fn send(&self, cmd: HelmCmd) -> Result<(), PilotError> {
        self.dispatcher
            .dispatch(Message::helm(
                self.inbox.client_id(),
                self.helm_id.as_str(),
                cmd,
            ))
            .map_err(PilotError::BusError)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the input tuple for a controller of the given kind.
///
/// `process_variable` is what a PID controller regulates: the actual throttle for the throttle
/// and the cross-track distance for the rudder. A PID throttle's output is applied by
/// [`throttle_demand`].
fn controller_inputs(
    kind: ControllerKind,
    process_variable: f64,
    xtd: f64,
    heading_error_rad: f64,
    throttle: f64,
) -> Vec<f64> {
    match kind {
        ControllerKind::Trivial => vec![],
        ControllerKind::Pid => vec![process_variable],
        ControllerKind::Blended => vec![xtd, heading_error_rad, throttle],
    }
}

/// Turn the throttle controller's output into the throttle demand.
///
/// A PID throttle regulates the actual throttle reported by the helm, so its output is a change
/// to that throttle rather than a new absolute demand.
fn throttle_demand(kind: ControllerKind, actual_throttle: f64, output: f64) -> f64 {
    match kind {
        ControllerKind::Pid => {
            util::maths::clamp(&(actual_throttle + output), &-OUTPUT_LIMIT, &OUTPUT_LIMIT)
        }
        _ => output,
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        ctrl::{BlendedController, PidController, PidParams, TrivialController},
        helm::{HelmAdapter, HelmError, HelmSink},
        route::Waypoint,
    };
    use comms_if::{bus::MessageBus, msg::MessageType};

    struct FakeGps {
        pub state: Mutex<(bool, LatLon, f64)>,
    }

    impl FakeGps {
        pub fn new(position: LatLon, heading: f64) -> Self {
            Self {
                state: Mutex::new((true, position, heading)),
            }
        }

        pub fn set(&self, position: LatLon, heading: f64) {
            let mut s = self.state.lock().unwrap();
            s.1 = position;
            s.2 = heading;
        }
    }

    impl GpsProvider for FakeGps {
        fn fix_valid(&self) -> bool {
            self.state.lock().unwrap().0
        }

        fn coordinates(&self) -> LatLon {
            self.state.lock().unwrap().1
        }

        fn heading(&self) -> f64 {
            self.state.lock().unwrap().2
        }
    }

    struct HelmRecorder {
        cmds: Mutex<Vec<HelmCmd>>,
    }

    impl Client for HelmRecorder {
        fn client_id(&self) -> &str {
            "helm"
        }

        fn accepted_type(&self) -> MessageType {
            MessageType::Helm
        }

        fn receive(&self, message: &Message) {
            self.cmds
                .lock()
                .unwrap()
                .push(message.content().helm_cmd().unwrap());
        }
    }

    fn abc_route() -> Route {
        Route::new(vec![
            Waypoint::new(45.0, -93.0, 0.01, ArrivalBehaviour::ContinueToNext),
            Waypoint::new(46.0, -92.0, 0.01, ArrivalBehaviour::ContinueToNext),
            Waypoint::new(47.0, -91.0, 0.01, ArrivalBehaviour::Loiter),
        ])
        .unwrap()
    }

    fn fixture(
        route: Route,
        rudder: Controller,
        gps: Arc<FakeGps>,
    ) -> (MessageBus, Arc<HelmRecorder>, PilotCore) {
        let bus = MessageBus::new();
        let helm = Arc::new(HelmRecorder {
            cmds: Mutex::new(Vec::new()),
        });
        bus.register(helm.clone()).unwrap();

        let inbox = Arc::new(PilotInbox::new("pilot"));
        bus.register(inbox.clone()).unwrap();

        let core = PilotCore::new(
            &PilotParams {
                distance_units: EarthRadius::Nmi,
                ..Default::default()
            },
            route,
            (Controller::Trivial(TrivialController::new(50.0)), rudder),
            gps,
            bus.dispatcher(),
            inbox,
            "helm",
        )
        .unwrap();

        (bus, helm, core)
    }

    fn pid_rudder() -> Controller {
        Controller::Pid(PidController::from_params(&PidParams {
            k_p: 1.0,
            period_s: Some(1.0),
            ..Default::default()
        }))
    }

    #[test]
    fn test_route_scenario() {
        let gps = Arc::new(FakeGps::new([45.0, -93.0], 45.0));
        let (bus, helm, mut core) = fixture(abc_route(), pid_rudder(), gps.clone());

        // Underway on the first segment
        assert!(matches!(core.tick(), Ok(TickOutcome::Continue(_))));
        assert_eq!(core.route().current_index(), 0);

        // Within tolerance of B advances onto (B, C), which is the terminal segment
        gps.set([46.0, -92.0], 45.0);
        match core.tick().unwrap() {
            TickOutcome::Continue(r) => assert_eq!(r.segment, 1),
            other => panic!("Expected to continue, got {:?}", other),
        }
        assert!(core.route().is_complete());

        // C is a loiter waypoint
        gps.set([47.0, -91.0], 45.0);
        assert_eq!(core.tick().unwrap(), TickOutcome::Stop(StopReason::Loitering));

        bus.run_once().unwrap();
        let cmds = helm.cmds.lock().unwrap();
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[0].throttle, 50.0);
        assert_eq!(cmds[2], HelmCmd::neutral());
    }

    #[test]
    fn test_route_finished() {
        let route = Route::new(vec![
            Waypoint::new(45.0, -93.0, 0.01, ArrivalBehaviour::ContinueToNext),
            Waypoint::new(46.0, -93.0, 0.01, ArrivalBehaviour::ContinueToNext),
        ])
        .unwrap();
        let gps = Arc::new(FakeGps::new([46.0, -93.0], 0.0));
        let (_bus, _helm, mut core) = fixture(route, pid_rudder(), gps);

        assert_eq!(core.tick().unwrap(), TickOutcome::Stop(StopReason::RouteFinished));
        assert_eq!(core.route().current_index(), 0);
    }

    #[test]
    fn test_rudder_sign() {
        // Heading north along the track, displaced to the east (right)
        let route = Route::new(vec![
            Waypoint::new(45.0, -93.0, 0.01, ArrivalBehaviour::ContinueToNext),
            Waypoint::new(46.0, -93.0, 0.01, ArrivalBehaviour::Loiter),
        ])
        .unwrap();
        let gps = Arc::new(FakeGps::new([45.5, -92.99], 0.0));

        for rudder in vec![
            pid_rudder(),
            Controller::Blended(BlendedController::new(0.0, 1.0, 0.0)),
        ] {
            let (_bus, _helm, mut core) = fixture(route.clone(), rudder, gps.clone());

            match core.tick().unwrap() {
                TickOutcome::Continue(r) => {
                    assert!(r.xtd > 0.0);
                    // Steer to port
                    assert!(r.cmd.rudder < 0.0);
                    assert!(r.cmd.rudder >= -1.0);
                }
                other => panic!("Expected to continue, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_gps_errors() {
        let gps = Arc::new(FakeGps::new([45.0, -93.0], 0.0));
        let (bus, helm, mut core) = fixture(abc_route(), pid_rudder(), gps.clone());

        gps.state.lock().unwrap().0 = false;
        assert!(matches!(core.tick(), Err(PilotError::NoGpsFix)));

        gps.state.lock().unwrap().0 = true;
        gps.set([std::f64::NAN, -93.0], 0.0);
        assert!(matches!(core.tick(), Err(PilotError::InvalidGpsData(..))));

        // Nothing is sent on a failed tick
        bus.run_once().unwrap();
        assert!(helm.cmds.lock().unwrap().is_empty());

        // And the next good tick goes through
        gps.set([45.0, -93.0], 0.0);
        assert!(core.tick().is_ok());
    }

    #[test]
    fn test_unsupported_roles() {
        let bus = MessageBus::new();
        let result = PilotCore::new(
            &PilotParams::default(),
            abc_route(),
            (
                Controller::Trivial(TrivialController::new(50.0)),
                Controller::Trivial(TrivialController::new(0.0)),
            ),
            Arc::new(FakeGps::new([45.0, -93.0], 0.0)),
            bus.dispatcher(),
            Arc::new(PilotInbox::new("pilot")),
            "helm",
        );

        assert!(matches!(result, Err(PilotError::CtrlError(_))));
    }

    /// Helm which does exactly as it's told.
    struct EchoHelm;

    impl HelmSink for EchoHelm {
        fn actuate(&self, cmd: HelmCmd) -> Result<HelmCmd, HelmError> {
            Ok(cmd)
        }
    }

    /// Run `n` ticks with a PID throttle against a helm adapter, returning the throttle demands.
    fn pid_throttle_demands(k_p: f64, n: usize) -> Vec<f64> {
        let bus = MessageBus::new();
        bus.register(Arc::new(HelmAdapter::new(
            "helm",
            Arc::new(EchoHelm),
            bus.dispatcher(),
        )))
        .unwrap();

        let inbox = Arc::new(PilotInbox::new("pilot"));
        bus.register(inbox.clone()).unwrap();

        let throttle = Controller::Pid(PidController::from_params(&PidParams {
            k_p,
            period_s: Some(1.0),
            setpoint: 60.0,
            ..Default::default()
        }));

        let mut core = PilotCore::new(
            &PilotParams::default(),
            abc_route(),
            (throttle, pid_rudder()),
            Arc::new(FakeGps::new([45.0, -93.0], 45.0)),
            bus.dispatcher(),
            inbox,
            "helm",
        )
        .unwrap();
        core.start();

        let mut demands = Vec::new();
        for _ in 0..n {
            match core.tick().unwrap() {
                TickOutcome::Continue(r) => demands.push(r.cmd.throttle),
                other => panic!("Expected to continue, got {:?}", other),
            }

            // Deliver the command to the helm, then the helm's reply to the pilot
            bus.run_once().unwrap();
            bus.run_once().unwrap();
        }

        demands
    }

    #[test]
    fn test_pid_throttle_converges() {
        // Unit gain reaches the setpoint in one tick and holds it
        assert_eq!(pid_throttle_demands(1.0, 6), vec![60.0; 6]);

        // Lower gain approaches it without overshoot
        let demands = pid_throttle_demands(0.5, 12);
        assert_eq!(demands[0], 30.0);
        assert!(demands.windows(2).all(|w| w[0] <= w[1] && w[1] <= 60.0));
        assert!((demands[11] - 60.0).abs() < 0.1);
    }

    #[test]
    fn test_throttle_demand() {
        assert_eq!(throttle_demand(ControllerKind::Trivial, 20.0, 50.0), 50.0);
        assert_eq!(throttle_demand(ControllerKind::Pid, 20.0, 50.0), 70.0);
        assert_eq!(throttle_demand(ControllerKind::Pid, 80.0, 50.0), 100.0);
        assert_eq!(throttle_demand(ControllerKind::Pid, -80.0, -50.0), -100.0);
    }
}
