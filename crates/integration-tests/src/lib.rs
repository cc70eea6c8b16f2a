//! Integration tests for Crave & Dine.
//!
//! The suites under `tests/` exercise the cart store and checkout
//! orchestrator together, with the backend and payment widget replaced by
//! the fakes in [`fixtures`]. No network or database is required.
//!
//! Run with: `cargo test -p crave-dine-integration-tests`

pub mod fixtures;

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize a tracing subscriber once for the whole test binary.
///
/// Honors `RUST_LOG`; defaults to warnings only so failing tests stay
/// readable.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
