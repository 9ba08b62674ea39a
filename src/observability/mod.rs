//! # Observability
//!
//! Structured logging bootstrap for the sync job. The job is short-lived and
//! log-only: no metrics endpoint, no trace export. Output goes to stdout in
//! either human-readable or JSON form so the platform's log collector can
//! pick it up.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Environment variable selecting the log output format ("json" or plain)
const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Default filter applied when RUST_LOG is not set
const DEFAULT_LOG_FILTER: &str = "info";

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG` for filtering (defaulting to `info`) and `LOG_FORMAT=json`
/// for structured output. Safe to call more than once.
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", DEFAULT_LOG_FILTER);
    }

    let json_output = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json_output {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).json().finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish(),
        )
    };

    if result.is_err() {
        // Subscriber already set elsewhere (e.g. integration tests); ignore.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}
