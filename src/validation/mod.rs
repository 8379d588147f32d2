//! # Validation
//!
//! The validation graph and the checkers that fill it.

pub mod checkers;
pub mod graph;

pub use checkers::{GroupChecker, ObjectChecker};
pub use graph::{CheckCode, Finding, Severity, ValidationEntry, ValidationGraph, ValidationKey};
