//! Tuning file management
//!
//! The tuning file lives at `~/.config/agv/tuning.toml` unless a path is
//! given. A missing file means the calibrated defaults.

use agv_tools::VehicleTuning;
use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::{Path, PathBuf};

/// Default tuning file path
pub fn default_tuning_path() -> Result<PathBuf> {
    let mut path =
        dirs::config_dir().ok_or_else(|| anyhow::anyhow!("cannot determine config directory"))?;
    path.push("agv");
    path.push("tuning.toml");
    Ok(path)
}

/// Load tuning from `path`, or from the default file if it exists
///
/// Returns the file actually read, `None` when falling back to defaults.
pub fn load_tuning(path: Option<&Path>) -> Result<(VehicleTuning, Option<PathBuf>)> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_tuning_path()?;
            if !path.exists() {
                return Ok((VehicleTuning::default(), None));
            }
            path
        },
    };
    let tuning = VehicleTuning::load_from_file(&path)
        .with_context(|| format!("failed to load tuning from {}", path.display()))?;
    Ok((tuning, Some(path)))
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective tuning as TOML
    Show {
        /// Tuning file (default: ~/.config/agv/tuning.toml)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Write the default tuning file
    Init {
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a tuning file
    Check {
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Print the default tuning file path
    Path,
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Show { path } => Self::show(path.as_deref()),
            ConfigCommand::Init { path, force } => Self::init(path, force),
            ConfigCommand::Check { path } => Self::check(path.as_deref()),
            ConfigCommand::Path => {
                println!("{}", default_tuning_path()?.display());
                Ok(())
            },
        }
    }

    fn show(path: Option<&Path>) -> Result<()> {
        let (tuning, source) = load_tuning(path)?;
        match source {
            Some(source) => println!("# {}", source.display()),
            None => println!("# defaults"),
        }
        print!("{}", tuning.to_toml_string()?);
        Ok(())
    }

    fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
        let path = match path {
            Some(path) => path,
            None => default_tuning_path()?,
        };
        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("failed to create config directory")?;
        }

        VehicleTuning::default()
            .save_to_file(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("✅ Wrote default tuning to {}", path.display());
        Ok(())
    }

    fn check(path: Option<&Path>) -> Result<()> {
        let (tuning, source) = load_tuning(path)?;
        let Some(source) = source else {
            println!("No tuning file, using defaults");
            return Ok(());
        };

        println!("✅ {} is valid", source.display());
        println!(
            "  steering: bias {:.1} +{:.1}/tick, ceiling {:.1}",
            tuning.steering.base_turn_bias,
            tuning.steering.turn_bias_step,
            tuning.steering.turn_bias_ceiling
        );
        println!(
            "  maneuver: grab below {} cm, gripper {:?}, rotate {:?}",
            tuning.maneuver.grab_distance_cm,
            tuning.maneuver.gripper_close(),
            tuning.maneuver.rotate()
        );
        println!(
            "  link: sample timeout {:?}, link timeout {:?}",
            tuning.link.sample_timeout(),
            tuning.link.link_timeout()
        );
        Ok(())
    }
}
