//! Conflict checkers.
//!
//! Group checkers look at a set of objects at once and return a graph.
//! Object checkers inspect one object against its peers and return its
//! findings plus a validity flag; the caller turns that into an entry.

pub mod destination_rules;
pub mod gateways;
pub mod peer_authentications;
pub mod virtual_services;

pub use destination_rules::{DisabledNamespaceWideMtlsChecker, NamespaceWideMtlsChecker};
pub use gateways::{HostBinding, MultiMatchChecker};
pub use peer_authentications::DisabledNamespaceWideChecker;
pub use virtual_services::SingleHostChecker;

use crate::domain::MeshObject;
use crate::validation::graph::{Finding, ValidationEntry, ValidationGraph, ValidationKey};

/// Checker over a set of objects that builds its own cross-references.
pub trait GroupChecker {
    fn check(&self) -> ValidationGraph;
}

/// Checker over a single object.
pub trait ObjectChecker {
    /// Findings for the object and whether it is still valid.
    fn check(&self) -> (Vec<Finding>, bool);
}

/// Wrap the outcome of an [`ObjectChecker`] into a graph entry for `object`.
pub fn object_entry(object: &MeshObject, findings: Vec<Finding>, valid: bool) -> ValidationEntry {
    let mut entry = ValidationEntry::new(ValidationKey::for_object(object));
    for finding in findings {
        entry.push_finding(finding);
    }
    entry.valid &= valid;
    entry
}
