//! replay command
//!
//! Runs a recorded sample trace through the controller against the logging
//! actuator. Ctrl+C stops the vehicle (brake and reset) and ends playback.

use super::config::load_tuning;
use crate::actuator::LoggingActuator;
use agv_client::{
    LoggingObserver, OperatorSpeeds, Orchestrator, PlaybackOptions, Vehicle, play_trace,
};
use agv_tools::SampleTrace;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::warn;

/// Extra time allowed after the last sample for queued maneuvers to finish
const SETTLE_MARGIN: Duration = Duration::from_secs(10);

#[derive(Args, Debug)]
pub struct ReplayCommand {
    /// Trace file (TOML)
    pub trace: PathBuf,

    /// Drive speed as the operator would type it
    #[arg(short, long, default_value = "20")]
    pub drive_speed: String,

    /// Gripper speed as the operator would type it
    #[arg(short, long, default_value = "30")]
    pub gripper_speed: String,

    /// Deliver samples and run holds without sleeping
    #[arg(long)]
    pub no_pacing: bool,

    /// Tuning file (default: ~/.config/agv/tuning.toml if present)
    #[arg(long)]
    pub tuning: Option<PathBuf>,

    /// Start the run before the first sample, whatever the trace says
    #[arg(long, conflicts_with = "no_start")]
    pub start: bool,

    /// Never start the run
    #[arg(long)]
    pub no_start: bool,
}

impl ReplayCommand {
    pub fn execute(&self) -> Result<()> {
        let trace = SampleTrace::load_from_file(&self.trace)
            .with_context(|| format!("failed to load trace {}", self.trace.display()))?;
        let (tuning, tuning_source) = load_tuning(self.tuning.as_deref())?;

        println!("Trace: {}", self.trace.display());
        if let Some(name) = &trace.name {
            println!("  name: {}", name);
        }
        println!("  samples: {} over {:?}", trace.len(), trace.duration());
        match &tuning_source {
            Some(path) => println!("Tuning: {}", path.display()),
            None => println!("Tuning: defaults"),
        }
        println!(
            "Speeds: drive {:?}, gripper {:?}",
            self.drive_speed, self.gripper_speed
        );
        println!();

        let paced = !self.no_pacing;
        let actuator = LoggingActuator::new(paced);
        let sent = actuator.counter();
        let speeds = Arc::new(OperatorSpeeds::new(
            self.drive_speed.as_str(),
            self.gripper_speed.as_str(),
        ));

        let mut orchestrator = Orchestrator::new(actuator, speeds, &tuning);
        orchestrator.add_observer(Arc::new(LoggingObserver::new()));
        let vehicle = Arc::new(Vehicle::from_orchestrator(
            orchestrator,
            tuning.link.sample_timeout(),
        )?);

        let interrupt = Arc::new(AtomicBool::new(false));
        install_stop_handler(Arc::downgrade(&vehicle), interrupt.clone())?;

        let options = PlaybackOptions {
            paced,
            auto_start: self.auto_start(),
            interrupt: Some(interrupt.clone()),
        };
        let report = play_trace(&vehicle, &trace, &options)?;

        let settle = tuning.maneuver.gripper_close()
            + tuning.maneuver.rotate()
            + trace.duration()
            + SETTLE_MARGIN;
        if !report.interrupted && !vehicle.flush(settle)? {
            warn!("Controller still busy after {:?}", settle);
        }

        let snapshot = vehicle.snapshot();
        let errors = vehicle.take_errors();
        if let Ok(vehicle) = Arc::try_unwrap(vehicle) {
            vehicle.shutdown()?;
        }

        println!();
        println!("{}", snapshot.status_line());
        println!("  {}", snapshot);
        println!(
            "  {} samples replayed, {} motor commands",
            report.samples_sent,
            sent.load(Ordering::Relaxed)
        );
        if report.interrupted || interrupt.load(Ordering::Relaxed) {
            println!("🛑 Stopped by operator");
        }

        if !errors.is_empty() {
            for e in &errors {
                println!("❌ {}", e);
            }
            anyhow::bail!("{} control errors during replay", errors.len());
        }
        Ok(())
    }

    fn auto_start(&self) -> Option<bool> {
        if self.start {
            Some(true)
        } else if self.no_start {
            Some(false)
        } else {
            None
        }
    }
}

/// Ctrl+C: stop the vehicle and end playback
fn install_stop_handler(vehicle: Weak<Vehicle>, interrupt: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        println!();
        println!("🛑 Stop requested, braking...");
        interrupt.store(true, Ordering::SeqCst);
        if let Some(vehicle) = vehicle.upgrade()
            && let Err(e) = vehicle.stop()
        {
            eprintln!("Failed to stop vehicle: {}", e);
        }
    })
    .context("failed to install Ctrl+C handler")
}
