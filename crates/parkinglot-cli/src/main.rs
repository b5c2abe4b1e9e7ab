//! Main entry point for the Ideas Parking Lot CLI

use clap::Parser;
use clap_verbosity_flag::LevelFilter;
use color_eyre::eyre::{eyre, Result};
use parkinglot_cli::cli::Args;
use parkinglot_cli::output::print_error;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    color_eyre::config::HookBuilder::default()
        .display_location_section(false)
        .display_env_section(false)
        .install()?;

    match args.verbosity.log_level_filter() {
        LevelFilter::Off | LevelFilter::Error => {}
        _ => {
            std::env::set_var("RUST_LIB_BACKTRACE", "1");
        }
    }

    let binary_name = env!("CARGO_BIN_NAME").replace('-', "_");
    let default_filter = format!("{binary_name}=error,parkinglot_sdk=error");
    parkinglot_common::logging::init_cli_logging(&args.verbosity, &default_filter)
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

    match args.run().await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            print_error(&e.to_string());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("  {suggestion}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
