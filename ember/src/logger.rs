//! Process-wide logging setup.

use thiserror::Error;
use tracing::subscriber::{self, SetGlobalDefaultError};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Errors raised while installing the logger.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// A global `tracing` subscriber was already installed.
    #[error("a global subscriber is already set: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
    /// A `log` logger was already installed.
    #[error("could not forward log records: {0}")]
    LogBridge(#[from] log::SetLoggerError),
}

/// Installs the `tracing` subscriber and forwards `log` records into it.
///
/// Call once, before anything logs.
pub fn init() -> Result<(), LoggerError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false));

    subscriber::set_global_default(registry)?;
    LogTracer::init()?;
    Ok(())
}
