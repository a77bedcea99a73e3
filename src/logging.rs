//! Diagnostic logging.
//!
//! Installs a global tracing subscriber writing to stderr, so stdout stays
//! clean for reports and JSON output. The filter comes from `SINGSCORE_LOG`
//! (same syntax as `RUST_LOG`), defaulting to `warn`, or `debug` with
//! `--verbose`.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "SINGSCORE_LOG";

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize logging. Subsequent calls are no-ops.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }

    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let subscriber = Registry::default()
        .with(build_env_filter(verbose))
        .with(stderr_layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| anyhow::anyhow!("Failed to install tracing subscriber: {err}"))?;

    let _ = INITIALIZED.set(());
    tracing::debug!("logging initialized");
    Ok(())
}

fn build_env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "warn" };
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}
