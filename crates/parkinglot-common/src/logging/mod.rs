//! Logging initialization for the Ideas Parking Lot binaries
//!
//! Filter priority:
//! 1. CLI flags (`-v/-q`)
//! 2. `RUST_LOG` environment variable
//! 3. The binary's default filter

use anyhow::Result;
use clap_verbosity_flag::{LogLevel, Verbosity};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging with the given verbosity and fallback filter.
///
/// # Example
///
/// ```no_run
/// use clap::Parser;
/// use clap_verbosity_flag::{Verbosity, WarnLevel};
/// use parkinglot_common::logging;
///
/// #[derive(Parser)]
/// struct Args {
///     #[clap(flatten)]
///     verbosity: Verbosity<WarnLevel>,
/// }
///
/// let args = Args::parse();
/// logging::init_logging(&args.verbosity, "parkinglot=info").unwrap();
/// ```
pub fn init_logging<L: LogLevel>(verbosity: &Verbosity<L>, default_filter: &str) -> Result<()> {
    let filter = build_filter(verbosity, default_filter)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()?;

    Ok(())
}

/// Initialize logging only when explicitly requested via flags or `RUST_LOG`.
///
/// The CLI keeps stdout clean for command output, so tracing stays off unless
/// the user asks for it. Returns whether a subscriber was installed.
pub fn init_cli_logging<L: LogLevel>(
    verbosity: &Verbosity<L>,
    default_filter: &str,
) -> Result<bool> {
    if verbosity.log_level().is_some() || std::env::var("RUST_LOG").is_ok() {
        init_logging(verbosity, default_filter)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

fn build_filter<L: LogLevel>(verbosity: &Verbosity<L>, default_filter: &str) -> Result<EnvFilter> {
    let filter = if let Some(log_level) = verbosity.log_level() {
        EnvFilter::try_new(format!("{}", log_level).to_lowercase())?
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
    };
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap_verbosity_flag::{ErrorLevel, WarnLevel};

    #[test]
    fn test_verbosity_flag_overrides_default() {
        let verbosity = Verbosity::<WarnLevel>::new(2, 0);
        let filter = build_filter(&verbosity, "parkinglot=error").unwrap();
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_quiet_disables_output() {
        let verbosity = Verbosity::<ErrorLevel>::new(0, 1);
        assert!(verbosity.log_level().is_none());
    }
}
