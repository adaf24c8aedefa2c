//! Logging bootstrap
//!
//! `RUST_LOG` wins when it is set; otherwise `logging.level` from the
//! configuration is used as a directive, e.g. `debug` or `pubhub=trace,warn`.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

const FALLBACK_LEVEL: &str = "info";

/// Build the event filter for `settings`. Directives that fail to parse fall
/// back to `info`.
pub fn filter_for(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL))
}

/// Install the global `tracing` subscriber.
///
/// Only the first call takes effect, so tests and embedding binaries can call
/// it freely.
pub fn init(settings: &LoggingSettings) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(settings))
        .with_target(false)
        .try_init();
}
