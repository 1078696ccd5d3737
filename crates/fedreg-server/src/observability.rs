//! Logging for the fedreg service.
//!
//! The subscriber is installed once at startup with the `info` level so that
//! config loading is logged; the configured `logging.level` is swapped in
//! afterwards through a reload handle. `RUST_LOG` always wins over both.

use std::sync::OnceLock;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

const STARTUP_LEVEL: &str = "info";

/// Upstream HTTP internals are only interesting when something breaks.
const QUIET_DEPENDENCIES: &[&str] = &["hyper_util=warn", "reqwest=warn"];

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

fn level_filter(level: &str) -> EnvFilter {
    QUIET_DEPENDENCIES
        .iter()
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .fold(EnvFilter::new(level), EnvFilter::add_directive)
}

fn env_override() -> Option<EnvFilter> {
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
}

pub fn init_tracing() {
    let filter = env_override().unwrap_or_else(|| level_filter(STARTUP_LEVEL));
    let (filter, handle) = reload::Layer::new(filter);
    let _ = FILTER_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}

/// Switch to the configured level once the config is loaded.
pub fn apply_logging_level(level: &str) {
    if env_override().is_some() {
        return;
    }
    if let Some(handle) = FILTER_HANDLE.get() {
        if let Err(err) = handle.modify(|f| *f = level_filter(level)) {
            tracing::warn!(error = %err, level, "Could not apply logging level");
        }
    }
}
