//! # meshlint
//!
//! Static configuration-conflict analysis for an Istio-style service mesh.
//!
//! Given a snapshot of gateways, virtual services, destination rules and peer
//! authentications, meshlint reports the combinations that are valid one by
//! one but conflict together:
//!
//! - gateways exposing the same host and port on the same ingress,
//! - several virtual services claiming one destination host,
//! - destination rules and peer authentications disagreeing on mTLS.
//!
//! ```text
//! Snapshot → Analyzer → checkers (gateways, virtual services, mTLS) → ValidationGraph
//!                    ↘ MtlsStatusResolver → namespace / mesh / overall status
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use meshlint::{Analyzer, AnalyzerConfig, Snapshot};
//!
//! fn main() -> meshlint::Result<()> {
//!     let snapshot = Snapshot::from_path(std::path::Path::new("mesh.yaml"))?;
//!     let validations = Analyzer::new(AnalyzerConfig::default()).analyze(&snapshot);
//!     println!("{} objects with findings", validations.len());
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod mtls;
pub mod observability;
pub mod validation;

// Re-export commonly used types
pub use analyzer::{Analyzer, MtlsReport, Snapshot};
pub use config::{AnalyzerConfig, AppConfig};
pub use domain::{MeshObject, MtlsMode, MtlsStatus, ObjectKind};
pub use errors::{MeshlintError, Result};
pub use validation::{CheckCode, Finding, Severity, ValidationEntry, ValidationGraph, ValidationKey};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
