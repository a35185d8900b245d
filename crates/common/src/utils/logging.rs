use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter for the CLI: quiet unless something goes wrong.
pub const DEFAULT_FILTER: &str = "warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize tracing subscriber with compact human-readable output.
/// - Respects `RUST_LOG` if set, e.g. `RUST_LOG=service=debug`
/// - Writes to stderr; stdout is reserved for command output
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .compact()
        .with_writer(io::stderr)
        .try_init();
}

/// Initialize tracing subscriber with JSON structured output on stderr.
pub fn init_logging_json() {
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .json()
        .with_writer(io::stderr)
        .try_init();
}

/// Pick the subscriber by the configured format name; unknown names fall back to compact.
pub fn init_logging(format: &str) {
    match format {
        "json" => init_logging_json(),
        _ => init_logging_default(),
    }
}
