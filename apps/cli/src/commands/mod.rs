//! Subcommands

pub mod config;
pub mod replay;
pub mod trace;

pub use config::ConfigCommand;
pub use replay::ReplayCommand;
pub use trace::TraceCommand;
