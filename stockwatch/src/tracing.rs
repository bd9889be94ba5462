//! Logging setup and the crate-wide tracing prelude.
//!
//! Log output goes to stderr so the CLI can keep stdout for results. When
//! started under systemd (`JOURNAL_STREAM` is set) events are routed to the
//! journal instead.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub mod prelude {
    pub use tracing::{debug, error, info, trace, warn};
}

const DEFAULT_DIRECTIVES: &str = "info";

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default `info` level. Call once, early in
/// `main()`.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var_os("JOURNAL_STREAM").is_some() {
        match tracing_journald::layer() {
            Ok(journald) => {
                registry.with(journald).init();
                return;
            }
            Err(e) => eprintln!("journald unavailable, logging to stderr: {e}"),
        }
    }

    let stderr_is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());
    registry
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(stderr_is_tty)
                .with_target(false)
                .with_timer(fmt::time::LocalTime::rfc_3339()),
        )
        .init();
}
