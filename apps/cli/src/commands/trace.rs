//! trace command
//!
//! Loads a trace file, decodes every color and prints a summary.

use agv_sdk::protocol::LineColor;
use agv_tools::SampleTrace;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct TraceCommand {
    /// Trace file (TOML)
    pub trace: PathBuf,

    /// Print every sample
    #[arg(short, long)]
    pub verbose: bool,
}

impl TraceCommand {
    pub fn execute(&self) -> Result<()> {
        let trace = SampleTrace::load_from_file(&self.trace)
            .with_context(|| format!("failed to load trace {}", self.trace.display()))?;
        let samples = trace.sensor_samples()?;

        println!("✅ {} is valid", self.trace.display());
        if let Some(name) = &trace.name {
            println!("  name: {}", name);
        }
        println!("  auto start: {}", trace.auto_start);
        println!("  samples: {} over {:?}", samples.len(), trace.duration());

        let colors = [
            LineColor::Black,
            LineColor::White,
            LineColor::Yellow,
            LineColor::Red,
            LineColor::Other,
        ];
        for color in colors {
            let count = samples.iter().filter(|(_, s)| s.line_color == color).count();
            if count > 0 {
                println!("  {:<7} {}", color.name(), count);
            }
        }

        if self.verbose {
            let mut at = std::time::Duration::ZERO;
            for (delay, sample) in &samples {
                at += *delay;
                println!(
                    "  {:>8.3}s  {:<7} {:>6.1} cm",
                    at.as_secs_f64(),
                    sample.line_color.name(),
                    sample.distance_cm
                );
            }
        }
        Ok(())
    }
}
