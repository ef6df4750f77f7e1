//! Tracing subscriber setup for the drivers and bindings.

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Install the global fmt subscriber. `RUST_LOG` overrides the default
/// `info` filter. Calling it again is a no-op.
pub fn init_tracing() {
    init_tracing_with("info");
}

/// Like [`init_tracing`] with a different fallback filter.
pub fn init_tracing_with(default_filter: &str) {
    INITIALISED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(std::io::stderr);
        // Another subscriber may already be installed by the host program.
        let _ = Registry::default().with(filter).with(fmt_layer).try_init();
    });
}
