//! # Structured Logging
//!
//! Provides logging initialisation and span macros using the tracing ecosystem.

use crate::config::{AnalyzerConfig, ObservabilityConfig};
use tracing_subscriber::EnvFilter;

/// Create a tracing span for one checker run.
///
/// ```rust,ignore
/// let span = check_span!("gateways.multimatch", objects = gateways.len());
/// ```
#[macro_export]
macro_rules! check_span {
    ($checker:expr) => {
        tracing::debug_span!("check", checker = %$checker)
    };
    ($checker:expr, $($field:tt)*) => {
        tracing::debug_span!("check", checker = %$checker, $($field)*)
    };
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. Returns `false` when a subscriber
/// was already installed (integration tests, embedding applications).
pub fn init_logging(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let installed = if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    };

    installed.is_ok()
}

/// Log analyzer configuration at startup
pub fn log_config_info(config: &AnalyzerConfig) {
    tracing::info!(
        identity_domain = %config.identity_domain,
        root_namespace = %config.root_namespace,
        auto_mtls_enabled = config.auto_mtls_enabled,
        allow_permissive = config.allow_permissive,
        "meshlint analyzer configuration"
    );
}
