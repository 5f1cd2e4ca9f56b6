//! Shared helpers for integration tests.

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber. Safe to call from every test.
///
/// Defaults to `kv_cache=debug`; override with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "kv_cache=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
