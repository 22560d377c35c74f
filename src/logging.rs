//! Process-wide logging setup.
//!
//! Events go to stderr so nothing interferes with the probe's exit-status
//! contract. The filter comes from `HEALTHCHECKER_LOG` (default
//! `healthchecker=info`), the output format from `HEALTHCHECKER_LOG_FORMAT`
//! (`text` or `json`).

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter directives.
pub const LOG_ENV: &str = "HEALTHCHECKER_LOG";

/// Environment variable selecting the output format (`text` or `json`).
pub const LOG_FORMAT_ENV: &str = "HEALTHCHECKER_LOG_FORMAT";

/// Initializes the global subscriber. Called once from `main`; library code
/// only emits events.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("healthchecker=info"));

    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
