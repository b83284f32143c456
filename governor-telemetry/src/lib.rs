//! Tracing setup for controller binaries and tests.

#![warn(missing_docs, clippy::pedantic)]

use tracing_subscriber::EnvFilter;

/// Installs the global `fmt` subscriber honouring `RUST_LOG`.
///
/// Falls back to `info` when no filter is configured. Safe to call more
/// than once; later calls leave the installed subscriber in place.
pub fn init() {
    init_with_filter("info");
}

/// Installs the global subscriber with an explicit fallback filter.
///
/// `RUST_LOG`, when set, still wins over `fallback`.
pub fn init_with_filter(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
