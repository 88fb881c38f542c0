//! Tracing subscriber setup for binaries and embedding applications
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! the host's choice. `RUST_LOG` wins over the configured filter.

use tracing_subscriber::EnvFilter;

use crate::config::SinopticoConfig;

/// Install a global fmt subscriber
///
/// Returns `false` if a global subscriber was already set (for example by a
/// test harness or the host application); that is not an error.
pub fn init_tracing(config: &SinopticoConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
