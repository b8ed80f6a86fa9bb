//! Tracing subscriber setup for the command line.

use tracing_subscriber::EnvFilter;

/// Install a plain-text subscriber on stderr, filtered through `RUST_LOG`
/// (default `info`). Stdout is left to command output.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
