//! Tracing subscriber setup for `givens-cli` and for tests that want
//! visible search traces. Mirrors the thin `EnvFilter`-driven setup a
//! chalk binary performs at its own entry point -- the library crates
//! only ever emit `tracing` events, never install a subscriber themselves.

use tracing_subscriber::EnvFilter;

/// Installs a global subscriber reading `RUST_LOG` (defaulting to `warn`
/// when unset). Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
