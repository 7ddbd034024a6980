//! # Logging
//!
//! `tracing` subscriber setup. The level comes from `RUST_LOG`
//! (default `info`), e.g. `RUST_LOG=rebar_core=debug` shows per-stage
//! survivor counts during a solve.
//!
//! ```rust,no_run
//! rebar_core::logging::init();
//! ```

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber for a binary
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// Debug-level subscriber writing through the test harness; safe to call repeatedly
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
