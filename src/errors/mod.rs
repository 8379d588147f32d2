//! # Error Handling
//!
//! Error types and the crate-wide `Result` alias.

pub mod types;

pub use types::{ErrorContext, MeshlintError, Result};
