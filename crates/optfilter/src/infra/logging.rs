//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "OPTFILTER_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the global fmt subscriber writing to stderr.
///
/// Defaults to `warn` so unresolved filter targets are reported without any
/// setup. Installing twice is harmless.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
