//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Default filter directive for a verbosity level.
#[must_use]
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "swarm_cli=info",
        _ => "swarm_cli=debug",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the verbosity level.
/// Events go to stderr so stdout stays free for the report.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    // A second install (tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
