//! Tracing subscriber setup with a reloadable level filter.
//!
//! `RUST_LOG`, when set and valid, takes precedence over the configured level.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Set only once our subscriber is the global default.
static FILTER_HANDLE: OnceLock<FilterHandle> = OnceLock::new();

pub fn init_tracing() -> bool {
    init_tracing_with_level("info")
}

/// Install the global subscriber from the `[logging]` section.
pub fn init_tracing_from_config(logging: &LoggingConfig) -> bool {
    init_tracing_with_level(&logging.level)
}

/// Install a registry with a reloadable `EnvFilter` and a fmt layer.
///
/// Returns `true` if this call installed the global subscriber. Returns
/// `false` if tracing was already initialized here or elsewhere.
pub fn init_tracing_with_level(level: &str) -> bool {
    if FILTER_HANDLE.get().is_some() {
        return false;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let (filter_layer, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        let _ = FILTER_HANDLE.set(handle);
        tracing::debug!(level, "tracing initialized");
    }
    installed
}

/// Swap the active level filter.
///
/// Returns `false` when the global subscriber was not installed by
/// [`init_tracing_with_level`] or the new filter could not be applied.
pub fn apply_logging_level(level: &str) -> bool {
    let Some(handle) = FILTER_HANDLE.get() else {
        return false;
    };
    handle.reload(EnvFilter::new(level)).is_ok()
}
