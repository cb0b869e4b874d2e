//! Logging setup.
//!
//! Structured logging via `tracing`. The filter defaults to `armiger=info`
//! (or `debug` with `--verbose`) and can always be overridden with
//! `RUST_LOG`. JSON output is for running under a log collector.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Lower the default filter to `debug`.
    pub verbose: bool,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Explicit filter directive, overriding the defaults.
    pub filter: Option<String>,
}

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes the global tracing subscriber.
///
/// Safe to call more than once; only the first call takes effect.
pub fn init(config: &LoggingConfig) {
    INIT.get_or_init(|| {
        let default_directive = if config.verbose {
            "armiger=debug"
        } else {
            "armiger=info"
        };
        let filter = config.filter.as_ref().map_or_else(
            || {
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(default_directive))
            },
            |directive| EnvFilter::new(directive.clone()),
        );

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false);

        if config.json {
            let _ = builder.json().try_init();
        } else {
            let _ = builder.try_init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        init(&config);
        init(&LoggingConfig {
            verbose: true,
            ..LoggingConfig::default()
        });
    }
}
