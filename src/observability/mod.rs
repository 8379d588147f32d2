//! # Observability
//!
//! Structured logging for the analyzer and its command line front end.

pub mod logging;

pub use logging::{init_logging, log_config_info};
