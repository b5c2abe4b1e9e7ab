use crate::cli::commands::{Commands, ConfigAction};
use crate::cli::handlers;
use crate::context::AppContext;
use crate::error::Result;
use clap::Parser;
use clap_verbosity_flag::{OffLevel, Verbosity};
use parkinglot_common::AppConfig;
use std::path::PathBuf;

/// Ideas Parking Lot CLI - capture ideas now, decide later
#[derive(Parser, Debug)]
#[command(
    name = "parkinglot",
    author = "Ideas Parking Lot Team",
    version,
    about = "Ideas Parking Lot CLI - capture ideas now, decide later",
    long_about = "Command-line client for the Ideas Parking Lot service.

ACCOUNT:
  parkinglot register               # Create an account
  parkinglot login                  # Sign in with email and password
  parkinglot login --google         # Sign in with Google
  parkinglot whoami                 # Show the signed-in user
  parkinglot logout                 # Sign out

IDEAS:
  parkinglot ideas ls               # Browse ideas
  parkinglot ideas mine             # Your ideas
  parkinglot ideas add              # Park a new idea
  parkinglot ideas show <id>        # Read one idea
  parkinglot ideas update <id>      # Change an idea
  parkinglot ideas rm <id>          # Delete an idea
  parkinglot categories             # Available categories

CONFIGURATION:
  parkinglot config example         # Print a starter parkinglot.toml"
)]
pub struct Args {
    /// Configuration file path (defaults to ./parkinglot.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<OffLevel>,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// Load and validate configuration. Commands never run without it.
    pub fn load_config(&self) -> Result<AppConfig> {
        Ok(AppConfig::load(self.config.as_deref())?)
    }

    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        if let Commands::Config {
            action: ConfigAction::Example,
        } = self.command
        {
            print!("{}", AppConfig::generate_example()?);
            return Ok(());
        }

        let config = self.load_config()?;
        let ctx = AppContext::from_config(config, self.json).await?;
        handlers::dispatch(&ctx, self.command).await
    }
}
