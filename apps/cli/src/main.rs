//! # AGV CLI
//!
//! Command-line tool for the line-following controller.
//!
//! ```bash
//! # Write the default tuning file
//! agv-cli config init
//!
//! # Replay a recorded course against a logging actuator
//! agv-cli replay demos/pickup.toml --drive-speed 20 --gripper-speed 30
//!
//! # Check a trace file without running it
//! agv-cli trace demos/pickup.toml
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod actuator;
mod commands;

use commands::{ConfigCommand, ReplayCommand, TraceCommand};

/// AGV CLI - line-following controller tool
#[derive(Parser, Debug)]
#[command(name = "agv-cli")]
#[command(about = "Replay sensor traces through the AGV controller", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tuning file management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Replay a sample trace through the controller
    Replay {
        #[command(flatten)]
        args: ReplayCommand,
    },

    /// Validate and summarize a sample trace
    Trace {
        #[command(flatten)]
        args: TraceCommand,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agv_cli=info".parse()?)
                .add_directive("agv_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),
        Commands::Replay { args } => args.execute(),
        Commands::Trace { args } => args.execute(),
    }
}
