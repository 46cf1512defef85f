// src/logging.rs

use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Default filter directive for a `-v` count, or `warn` when quiet.
pub fn default_level(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

/// Installs the global subscriber once. `RUST_LOG` overrides `level`.
pub fn init_tracing(level: &str) {
    if INITIALISED.set(()).is_err() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal());
    // Another subscriber may already be installed, e.g. by a test harness.
    let _ = Registry::default().with(filter).with(fmt_layer).try_init();
}
