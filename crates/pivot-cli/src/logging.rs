//! Subscriber setup for the `pivot` binary.
//!
//! Logs go to stderr so rendered output on stdout stays machine-readable.
//! `RUST_LOG` takes precedence over `--log-level`.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, Result};

/// Default filter when neither `RUST_LOG` nor `--log-level` is given.
pub const DEFAULT_LEVEL: &str = "warn";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Build the filter from `RUST_LOG`, falling back to `level`.
pub fn env_filter(level: Option<&str>) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level.unwrap_or(DEFAULT_LEVEL)).map_err(|error| CliError::Logging {
        message: error.to_string(),
    })
}

/// Install the global subscriber.
pub fn init(level: Option<&str>, format: LogFormat) -> Result<()> {
    let filter = env_filter(level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| CliError::Logging {
        message: error.to_string(),
    })
}
