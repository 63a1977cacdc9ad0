//! Logging setup for hosts that don't install their own subscriber.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a formatted subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"info,roundkeeper_rollback=debug"`).
///
/// Returns `false` if a global subscriber was already set, in which case
/// the existing one is left alone.
pub fn init(default_directive: &str) -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
