//! Tracing subscriber setup for binaries.
//!
//! Libraries only emit `tracing` events; installing a subscriber is left to
//! whoever owns `main`.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Parse a level name, falling back to `INFO`.
#[must_use]
pub fn parse_level(level: &str) -> Level {
    level.parse().unwrap_or(Level::INFO)
}

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` directives are honoured on top of `level`. Returns `false` if
/// a subscriber was already installed.
pub fn init_tracing(level: &str, json: bool) -> bool {
    let filter = EnvFilter::from_default_env().add_directive(parse_level(level).into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}
