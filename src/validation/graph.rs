//! # Validation Graph
//!
//! Findings keyed by object, with cross-references between the objects that
//! take part in the same conflict. Entries merge monotonically: findings
//! concatenate, references union and validity is the AND of every merge, so
//! graphs produced independently can be combined in any order.

use crate::domain::{MeshObject, ObjectKind};
use serde::{Serialize, Serializer};
use std::collections::{btree_map, BTreeMap, BTreeSet};
use std::fmt;

/// How serious a finding is. Errors block correctness claims, warnings are advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// Whether a finding of this severity passes a `minimum` severity filter.
    pub fn at_least(&self, minimum: Severity) -> bool {
        match minimum {
            Severity::Warning => true,
            Severity::Error => *self == Severity::Error,
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            _ => Err(format!("Unknown severity '{}'. Use 'error' or 'warning'.", s)),
        }
    }
}

/// Catalogue of the checks this crate emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckCode {
    GatewayMultiMatch,
    VirtualServiceSingleHost,
    DestinationRulePolicyMtlsEnabled,
    DestinationRuleMeshPolicyMtlsEnabled,
    DestinationRuleNamespacePolicyMissing,
    PeerAuthnDisableDestinationRuleMissing,
}

impl CheckCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckCode::GatewayMultiMatch => "gateways.multimatch",
            CheckCode::VirtualServiceSingleHost => "virtualservices.singlehost",
            CheckCode::DestinationRulePolicyMtlsEnabled => "destinationrules.mtls.policymtlsenabled",
            CheckCode::DestinationRuleMeshPolicyMtlsEnabled => {
                "destinationrules.mtls.meshpolicymtlsenabled"
            }
            CheckCode::DestinationRuleNamespacePolicyMissing => "destinationrules.mtls.nspolicymissing",
            CheckCode::PeerAuthnDisableDestinationRuleMissing => {
                "peerauthentications.mtls.disabledestinationrulemissing"
            }
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            CheckCode::VirtualServiceSingleHost => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Human readable explanation shown next to the code
    pub fn description(&self) -> &'static str {
        match self {
            CheckCode::GatewayMultiMatch => "More than one Gateway for the same host port combination",
            CheckCode::VirtualServiceSingleHost => "More than one Virtual Service for same host",
            CheckCode::DestinationRulePolicyMtlsEnabled => {
                "Policy with TLS strict mode found, it should be permissive"
            }
            CheckCode::DestinationRuleMeshPolicyMtlsEnabled => {
                "Mesh-wide policy enabling mTLS found, permissive policy is needed"
            }
            CheckCode::DestinationRuleNamespacePolicyMissing => {
                "PeerAuthentication enabling namespace-wide mTLS is missing"
            }
            CheckCode::PeerAuthnDisableDestinationRuleMissing => {
                "Destination Rule disabling namespace-wide mTLS is missing"
            }
        }
    }
}

impl fmt::Display for CheckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CheckCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One problem found on an object, pointing into its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub message: CheckCode,
    /// Slash-separated pointer into the object (`spec/servers[0]/hosts[1]`)
    pub path: String,
    pub severity: Severity,
}

impl Finding {
    /// Build a finding with the catalogue severity of `code`.
    pub fn build<P: Into<String>>(code: CheckCode, path: P) -> Self {
        Self {
            message: code,
            path: path.into(),
            severity: code.severity(),
        }
    }
}

/// Identity of a validation entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationKey {
    #[serde(serialize_with = "serialize_object_type")]
    pub object_type: ObjectKind,
    pub namespace: String,
    pub name: String,
}

impl ValidationKey {
    pub fn new<N: Into<String>, S: Into<String>>(object_type: ObjectKind, namespace: S, name: N) -> Self {
        Self {
            object_type,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn for_object(object: &MeshObject) -> Self {
        Self::new(object.kind, object.namespace(), object.name())
    }
}

impl fmt::Display for ValidationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.object_type, self.namespace, self.name)
    }
}

fn serialize_object_type<S: Serializer>(kind: &ObjectKind, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(kind.as_str())
}

/// Findings and conflict references collected for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationEntry {
    #[serde(flatten)]
    pub key: ValidationKey,
    pub valid: bool,
    pub checks: Vec<Finding>,
    pub references: BTreeSet<ValidationKey>,
}

impl ValidationEntry {
    pub fn new(key: ValidationKey) -> Self {
        Self {
            key,
            valid: true,
            checks: Vec::new(),
            references: BTreeSet::new(),
        }
    }

    /// Attach a finding; an error-severity finding makes the entry invalid.
    pub fn with_finding(mut self, finding: Finding) -> Self {
        self.push_finding(finding);
        self
    }

    /// Reference another entry. References to the entry itself are dropped.
    pub fn with_reference(mut self, reference: ValidationKey) -> Self {
        if reference != self.key {
            self.references.insert(reference);
        }
        self
    }

    pub fn with_references<I: IntoIterator<Item = ValidationKey>>(self, references: I) -> Self {
        references.into_iter().fold(self, ValidationEntry::with_reference)
    }

    pub fn push_finding(&mut self, finding: Finding) {
        self.valid &= finding.severity != Severity::Error;
        self.checks.push(finding);
    }

    /// Monotonic merge of another entry for the same key.
    pub fn merge(&mut self, other: ValidationEntry) {
        debug_assert_eq!(self.key, other.key);
        self.valid &= other.valid;
        self.checks.extend(other.checks);
        self.references.extend(other.references);
    }
}

/// Validation results for a snapshot, keyed by object.
///
/// Objects without findings never appear as keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationGraph {
    entries: BTreeMap<ValidationKey, ValidationEntry>,
}

impl ValidationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one entry; entries without findings are ignored.
    pub fn merge_entry(&mut self, entry: ValidationEntry) {
        if entry.checks.is_empty() {
            return;
        }

        match self.entries.entry(entry.key.clone()) {
            btree_map::Entry::Occupied(mut existing) => existing.get_mut().merge(entry),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
    }

    /// Merge every entry of `other` into this graph.
    pub fn merge(&mut self, other: ValidationGraph) {
        for entry in other.entries.into_values() {
            self.merge_entry(entry);
        }
    }

    pub fn get(&self, key: &ValidationKey) -> Option<&ValidationEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &ValidationKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationEntry> {
        self.entries.values()
    }

    /// Total findings across all entries
    pub fn finding_count(&self) -> usize {
        self.entries.values().map(|entry| entry.checks.len()).sum()
    }

    /// Keep only findings at or above `minimum`; entries left empty are dropped.
    pub fn filter_by_severity(&self, minimum: Severity) -> ValidationGraph {
        let mut filtered = ValidationGraph::new();
        for entry in self.entries.values() {
            let mut kept = ValidationEntry::new(entry.key.clone());
            kept.valid = entry.valid;
            kept.references = entry.references.clone();
            kept.checks = entry
                .checks
                .iter()
                .filter(|finding| finding.severity.at_least(minimum))
                .cloned()
                .collect();
            filtered.merge_entry(kept);
        }
        filtered
    }
}

impl FromIterator<ValidationEntry> for ValidationGraph {
    fn from_iter<I: IntoIterator<Item = ValidationEntry>>(iter: I) -> Self {
        let mut graph = ValidationGraph::new();
        for entry in iter {
            graph.merge_entry(entry);
        }
        graph
    }
}

impl Serialize for ValidationGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}
