//! Orchestrator
//!
//! Couples the state machine to an actuator. Each event (start, stop,
//! disconnect, sample, gap) is handled to completion before the next one:
//! the tick's batch is executed command by command and the tick is committed
//! only when every command was acknowledged.
//!
//! Failure handling:
//! - actuator failure: best-effort brake of the drive motors, advisory, error
//!   returned; the run state is kept (a failed pickup stays in `Grabbing`)
//! - cancellation (stop request): brake the drive motors and reset
//!
//! The cancel token is only cleared by [`Orchestrator::stop`], one request
//! per call, so a stop requested while a start is being handled still
//! cancels whatever is queued behind that start.

use crate::config::{ConfigurationError, SpeedField, SpeedSource, effective_speed};
use crate::control::Speeds;
use crate::error::Result;
use crate::machine::VehicleStateMachine;
use crate::observer::{Advisory, PresentationObserver};
use crate::state::VehicleSnapshot;
use agv_driver::{
    CancelToken, CommandBatch, CommandCallback, DriverError, HookManager, LinkEvent, LinkMonitor,
    MotorActuator, execute_batch,
};
use agv_protocol::{ChannelSet, SensorSample};
use agv_tools::VehicleTuning;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub struct Orchestrator<A: MotorActuator> {
    machine: VehicleStateMachine,
    actuator: A,
    speeds: Arc<dyn SpeedSource>,
    cancel: CancelToken,
    hooks: HookManager,
    observers: Vec<Arc<dyn PresentationObserver>>,
    link: LinkMonitor,
    /// Last rejected text per field, so an advisory is raised once per change
    drive_error: Option<ConfigurationError>,
    gripper_error: Option<ConfigurationError>,
}

impl<A: MotorActuator> Orchestrator<A> {
    pub fn new(actuator: A, speeds: Arc<dyn SpeedSource>, tuning: &VehicleTuning) -> Self {
        Self {
            machine: VehicleStateMachine::new(tuning),
            actuator,
            speeds,
            cancel: CancelToken::new(),
            hooks: HookManager::new(),
            observers: Vec::new(),
            link: LinkMonitor::new(tuning.link.link_timeout()),
            drive_error: None,
            gripper_error: None,
        }
    }

    /// Share a cancel token with another thread
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn add_observer(&mut self, observer: Arc<dyn PresentationObserver>) {
        self.observers.push(observer);
    }

    pub fn add_hook(&mut self, callback: Arc<dyn CommandCallback>) {
        self.hooks.add_callback(callback);
    }

    pub fn machine(&self) -> &VehicleStateMachine {
        &self.machine
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn link(&self) -> &LinkMonitor {
        &self.link
    }

    pub fn snapshot(&self) -> VehicleSnapshot {
        self.machine.snapshot()
    }

    /// Begin a run and send the start nudge
    ///
    /// With a stop still pending the nudge is cancelled and the run reset.
    pub fn start(&mut self) -> Result<()> {
        let batch = self.machine.start();
        let result = self.execute(&batch);
        self.publish_snapshot();
        result.map(|_| ())
    }

    /// Brake the drive motors and reset the run
    ///
    /// The state is reset even if the brake command fails.
    pub fn stop(&mut self) -> Result<()> {
        info!("Stop requested");
        let brake = self.actuator.stop(ChannelSet::DRIVE, true);
        self.machine.reset();
        self.cancel.acknowledge();

        let result = match brake {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("Failed to brake drive motors on stop: {}", e);
                self.publish_advisory(Advisory::ActuatorFailure(e.clone()));
                Err(e.into())
            },
        };
        self.publish_snapshot();
        result
    }

    /// The link was closed by the operator; reset without touching the motors
    pub fn disconnect(&mut self) {
        info!("Disconnected");
        self.machine.reset();
        self.publish_snapshot();
    }

    /// Handle one sensor sample
    ///
    /// Samples arriving while a stop is pending are dropped.
    pub fn handle_sample(&mut self, sample: SensorSample, now: Instant) -> Result<()> {
        if let Some(LinkEvent::Restored) = self.link.register_sample() {
            info!("Sensor link restored");
            self.publish_advisory(Advisory::LinkRestored);
        }
        if self.cancel.is_cancelled() {
            debug!("stop pending, sample dropped");
            return Ok(());
        }

        let (speeds, gripper_error) = self.read_speeds();
        let tick = self.machine.tick(&sample, speeds, now);
        if tick.maneuver_fired {
            self.note_config_error(SpeedField::Gripper, gripper_error);
        }

        let result = self.execute(&tick.commands).map(|_| self.machine.commit(&tick));
        if tick.maneuver_fired
            && let Err(e) = &result
            && !e.is_cancelled()
        {
            warn!("Pickup maneuver aborted, staying in {}", self.machine.status());
        }
        self.publish_snapshot();
        result
    }

    /// No sample this cycle: state is left alone, the link watchdog is polled
    pub fn handle_gap(&mut self) {
        if let Some(LinkEvent::TimedOut(silence)) = self.link.poll() {
            warn!("No sensor sample for {:?}", silence);
            self.publish_advisory(Advisory::LinkTimeout(silence));
        }
    }

    fn execute(&mut self, batch: &CommandBatch) -> Result<usize> {
        match execute_batch(&mut self.actuator, batch, &self.cancel, &self.hooks) {
            Ok(sent) => Ok(sent),
            Err(DriverError::Cancelled) => {
                info!("Batch cancelled, braking drive motors");
                if let Err(e) = self.actuator.stop(ChannelSet::DRIVE, true) {
                    error!("Failed to brake drive motors after cancel: {}", e);
                }
                self.machine.reset();
                Err(DriverError::Cancelled.into())
            },
            Err(e) => {
                if let Err(brake_err) = self.actuator.stop(ChannelSet::DRIVE, true) {
                    error!("Best-effort brake failed: {}", brake_err);
                }
                self.publish_advisory(Advisory::ActuatorFailure(e.clone()));
                Err(e.into())
            },
        }
    }

    /// Effective speeds for this tick
    ///
    /// Drive problems are reported immediately; the gripper error is returned
    /// so it is only reported when the gripper is actually used.
    fn read_speeds(&mut self) -> (Speeds, Option<ConfigurationError>) {
        let (drive, drive_error) = effective_speed(&self.speeds.drive_speed());
        let (gripper, gripper_error) = effective_speed(&self.speeds.gripper_speed());
        self.note_config_error(SpeedField::Drive, drive_error);
        (Speeds::new(drive, gripper), gripper_error)
    }

    fn note_config_error(&mut self, field: SpeedField, error: Option<ConfigurationError>) {
        let last = match field {
            SpeedField::Drive => &mut self.drive_error,
            SpeedField::Gripper => &mut self.gripper_error,
        };
        if *last == error {
            return;
        }
        *last = error.clone();
        if let Some(error) = error {
            self.publish_advisory(Advisory::Configuration { field, error });
        }
    }

    fn publish_advisory(&self, advisory: Advisory) {
        warn!("Advisory: {}", advisory);
        for observer in &self.observers {
            observer.on_advisory(&advisory);
        }
    }

    fn publish_snapshot(&self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.machine.snapshot();
        for observer in &self.observers {
            observer.on_snapshot(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;
    use crate::config::OperatorSpeeds;
    use agv_driver::{MockActuator, MockHandle};
    use agv_protocol::{LineColor, MotorChannel, MotorCommand};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct CollectingObserver {
        snapshots: Mutex<Vec<VehicleSnapshot>>,
        advisories: Mutex<Vec<Advisory>>,
    }

    impl PresentationObserver for CollectingObserver {
        fn on_snapshot(&self, snapshot: &VehicleSnapshot) {
            self.snapshots.lock().unwrap().push(snapshot.clone());
        }

        fn on_advisory(&self, advisory: &Advisory) {
            self.advisories.lock().unwrap().push(advisory.clone());
        }
    }

    struct Fixture {
        orchestrator: Orchestrator<MockActuator>,
        handle: MockHandle,
        speeds: Arc<OperatorSpeeds>,
        observer: Arc<CollectingObserver>,
        t0: Instant,
    }

    impl Fixture {
        fn new(drive: &str, gripper: &str) -> Self {
            let (actuator, handle) = MockActuator::new();
            let speeds = Arc::new(OperatorSpeeds::new(drive, gripper));
            let mut orchestrator =
                Orchestrator::new(actuator, speeds.clone(), &VehicleTuning::default());
            let observer = Arc::new(CollectingObserver::default());
            orchestrator.add_observer(observer.clone());
            Self {
                orchestrator,
                handle,
                speeds,
                observer,
                t0: Instant::now(),
            }
        }

        fn feed(&mut self, ms: u64, color: LineColor, distance_cm: f32) -> Result<()> {
            self.orchestrator.handle_sample(
                SensorSample::new(color, distance_cm),
                self.t0 + Duration::from_millis(ms),
            )
        }

        /// Started, positive polarity, in Grabbing
        fn into_grabbing(&mut self) {
            self.orchestrator.start().unwrap();
            self.feed(0, LineColor::Yellow, 50.0).unwrap();
            self.feed(100, LineColor::White, 50.0).unwrap();
            assert_eq!(self.orchestrator.machine().status(), Status::Grabbing);
            self.handle.clear();
        }

        fn advisories(&self) -> Vec<Advisory> {
            self.observer.advisories.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_start_sends_nudge() {
        let mut fx = Fixture::new("20", "30");
        fx.orchestrator.start().unwrap();

        assert_eq!(
            fx.handle.commands(),
            vec![MotorCommand::set_speed(MotorChannel::Right, 1)]
        );
        let snapshots = fx.observer.snapshots.lock().unwrap();
        assert_eq!(snapshots.last().unwrap().status, Status::FindingPolarity);
    }

    #[test]
    fn test_scenario_c_maneuver_executes_and_commits() {
        let mut fx = Fixture::new("20", "30");
        fx.into_grabbing();

        fx.feed(200, LineColor::Black, 20.0).unwrap();
        fx.feed(700, LineColor::Black, 4.0).unwrap();

        let commands = fx.handle.commands();
        // Two follow commands, then the 11-step maneuver
        assert_eq!(commands.len(), 13);
        assert_eq!(
            commands[3],
            MotorCommand::set_speed(MotorChannel::Gripper, 30)
        );
        assert_eq!(commands[4], MotorCommand::wait(Duration::from_millis(500)));
        assert_eq!(commands[6], MotorCommand::set_speed(ChannelSet::DRIVE, -20));
        assert_eq!(commands[7], MotorCommand::wait(Duration::from_millis(500)));
        assert_eq!(commands[10], MotorCommand::wait(Duration::from_secs(4)));
        assert_eq!(fx.orchestrator.machine().status(), Status::FindingPath);
    }

    #[test]
    fn test_scenario_d_invalid_speed() {
        let mut fx = Fixture::new("abc", "30");
        fx.orchestrator.start().unwrap();
        fx.handle.clear();

        for ms in 0..5 {
            fx.feed(ms * 100, LineColor::Yellow, 50.0).unwrap();
            fx.feed(ms * 100 + 50, LineColor::Black, 50.0).unwrap();
        }

        let batch: CommandBatch = fx.handle.commands().into_iter().collect();
        assert!(!batch.is_empty());
        assert!(!batch.moves(ChannelSet::DRIVE | ChannelSet::GRIPPER));

        // Raised once while the text stays the same
        let advisories = fx.advisories();
        assert_eq!(
            advisories,
            vec![Advisory::Configuration {
                field: SpeedField::Drive,
                error: ConfigurationError::NotANumber("abc".into()),
            }]
        );

        // Fixing the text applies on the next tick
        fx.speeds.set_drive("15");
        fx.feed(1000, LineColor::Black, 50.0).unwrap();
        assert!(
            fx.handle
                .commands()
                .contains(&MotorCommand::set_speed(MotorChannel::Left, 15))
        );
    }

    #[test]
    fn test_gripper_error_reported_when_used() {
        let mut fx = Fixture::new("20", "0");
        fx.into_grabbing();
        assert!(fx.advisories().is_empty());

        fx.feed(200, LineColor::Black, 2.0).unwrap();
        assert_eq!(
            fx.advisories(),
            vec![Advisory::Configuration {
                field: SpeedField::Gripper,
                error: ConfigurationError::Zero,
            }]
        );
        assert!(
            fx.handle
                .commands()
                .contains(&MotorCommand::set_speed(MotorChannel::Gripper, 0))
        );
    }

    #[test]
    fn test_actuator_failure_keeps_grabbing() {
        let mut fx = Fixture::new("20", "30");
        fx.into_grabbing();

        // Gripper command fails
        fx.handle.fail_after(1);
        let err = fx.feed(200, LineColor::Black, 2.0).unwrap_err();
        assert!(matches!(err, crate::VehicleError::Driver(ref e) if e.is_actuator_failure()));

        let machine = fx.orchestrator.machine();
        assert_eq!(machine.status(), Status::Grabbing);
        assert!(machine.state().maneuver_triggered());
        assert!(matches!(
            fx.advisories().last(),
            Some(Advisory::ActuatorFailure(_))
        ));

        // No retry once the link is back
        fx.handle.heal();
        fx.handle.clear();
        fx.feed(300, LineColor::Black, 2.0).unwrap();
        assert_eq!(fx.handle.len(), 2);
        assert_eq!(fx.orchestrator.machine().status(), Status::Grabbing);
    }

    #[test]
    fn test_stop_brakes_and_resets() {
        let mut fx = Fixture::new("20", "30");
        fx.into_grabbing();

        fx.orchestrator.stop().unwrap();
        assert_eq!(
            fx.handle.commands(),
            vec![MotorCommand::brake(ChannelSet::DRIVE)]
        );
        let machine = fx.orchestrator.machine();
        assert_eq!(machine.status(), Status::Waiting);
        assert_eq!(machine.polarity(), crate::Polarity::Unknown);
        assert!(!machine.is_started());
    }

    #[test]
    fn test_cancelled_token_drops_samples() {
        let mut fx = Fixture::new("20", "30");
        fx.into_grabbing();

        fx.orchestrator.cancel_token().cancel();
        fx.feed(200, LineColor::Black, 2.0).unwrap();
        assert!(fx.handle.is_empty());
        assert_eq!(fx.orchestrator.machine().status(), Status::Grabbing);

        fx.orchestrator.stop().unwrap();
        assert!(!fx.orchestrator.cancel_token().is_cancelled());
    }

    #[test]
    fn test_stop_requested_during_start_still_cancels() {
        let mut fx = Fixture::new("20", "30");

        // Stop requested; its event is still queued behind the start
        fx.orchestrator.cancel_token().cancel();
        let err = fx.orchestrator.start().unwrap_err();
        assert!(err.is_cancelled());
        assert!(fx.orchestrator.cancel_token().is_cancelled());

        // Samples queued behind the start do not move the vehicle
        fx.feed(0, LineColor::Yellow, 50.0).unwrap();
        fx.feed(100, LineColor::Black, 2.0).unwrap();
        assert!(
            !fx.handle
                .commands()
                .iter()
                .any(|c| matches!(c, MotorCommand::SetSpeed { .. }))
        );
        assert_eq!(fx.orchestrator.machine().status(), Status::Waiting);

        // The queued stop clears the request; the next start runs
        fx.orchestrator.stop().unwrap();
        assert!(!fx.orchestrator.cancel_token().is_cancelled());
        fx.orchestrator.start().unwrap();
        assert_eq!(
            fx.handle.commands().last(),
            Some(&MotorCommand::set_speed(MotorChannel::Right, 1))
        );
    }

    #[test]
    fn test_disconnect_resets_without_commands() {
        let mut fx = Fixture::new("20", "30");
        fx.into_grabbing();

        fx.orchestrator.disconnect();
        assert!(fx.handle.is_empty());
        assert_eq!(fx.orchestrator.machine().status(), Status::Waiting);
    }

    #[test]
    fn test_gap_reports_link_timeout_once() {
        let (actuator, _handle) = MockActuator::new();
        let mut tuning = VehicleTuning::default();
        tuning.link.link_timeout_ms = 20;
        let mut orchestrator =
            Orchestrator::new(actuator, Arc::new(OperatorSpeeds::new("20", "30")), &tuning);
        let observer = Arc::new(CollectingObserver::default());
        orchestrator.add_observer(observer.clone());

        std::thread::sleep(Duration::from_millis(40));
        orchestrator.handle_gap();
        orchestrator.handle_gap();
        orchestrator
            .handle_sample(SensorSample::from_raw(1, 30.0), Instant::now())
            .unwrap();

        let advisories = observer.advisories.lock().unwrap();
        assert_eq!(advisories.len(), 2);
        assert!(matches!(advisories[0], Advisory::LinkTimeout(_)));
        assert_eq!(advisories[1], Advisory::LinkRestored);
    }
}
