//! Mesh object views.
//!
//! A `MeshObject` is a read-only view over one control-plane resource. The body
//! is kept as free-form JSON and every accessor treats absent or wrongly typed
//! fields as "no information" instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Kinds of mesh objects the analyzer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    Gateway,
    VirtualService,
    DestinationRule,
    PeerAuthentication,
}

impl ObjectKind {
    /// Object type used in validation keys
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Gateway => "gateway",
            ObjectKind::VirtualService => "virtualservice",
            ObjectKind::DestinationRule => "destinationrule",
            ObjectKind::PeerAuthentication => "peerauthentication",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = String;

    /// Accepts both the resource kind (`VirtualService`) and the validation
    /// object type (`virtualservice`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gateway" => Ok(ObjectKind::Gateway),
            "virtualservice" => Ok(ObjectKind::VirtualService),
            "destinationrule" => Ok(ObjectKind::DestinationRule),
            "peerauthentication" => Ok(ObjectKind::PeerAuthentication),
            _ => Err(format!("Unsupported object kind: {}", s)),
        }
    }
}

/// Object metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default, rename = "clusterName", skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
}

/// A typed view over one mesh resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshObject {
    pub kind: ObjectKind,
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: Value,
}

impl MeshObject {
    pub fn new<N: Into<String>, S: Into<String>>(
        kind: ObjectKind,
        name: N,
        namespace: S,
        spec: Value,
    ) -> Self {
        Self {
            kind,
            metadata: ObjectMeta {
                name: name.into(),
                namespace: namespace.into(),
                cluster_name: None,
            },
            spec,
        }
    }

    /// Set the owning cluster
    pub fn with_cluster<C: Into<String>>(mut self, cluster: C) -> Self {
        self.metadata.cluster_name = Some(cluster.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    /// Owning cluster, falling back to `default` when unset or empty.
    pub fn cluster<'a>(&'a self, default: &'a str) -> &'a str {
        match self.metadata.cluster_name.as_deref() {
            Some(cluster) if !cluster.is_empty() => cluster,
            _ => default,
        }
    }

    /// Body field addressed by a JSON pointer relative to `spec` (`/trafficPolicy/tls/mode`).
    pub fn spec_value(&self, pointer: &str) -> Option<&Value> {
        self.spec.pointer(pointer).filter(|v| !v.is_null())
    }

    /// String body field; `None` when absent or not a string.
    pub fn spec_str(&self, pointer: &str) -> Option<&str> {
        self.spec_value(pointer).and_then(Value::as_str)
    }

    /// String entries of an array body field with their original positions.
    ///
    /// Non-string entries are skipped without shifting the positions of the rest.
    pub fn spec_strings(&self, pointer: &str) -> Vec<(usize, &str)> {
        string_entries(self.spec_value(pointer))
    }
}

/// Positions and values of the string entries of a JSON array.
pub(crate) fn string_entries(value: Option<&Value>) -> Vec<(usize, &str)> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| item.as_str().map(|s| (index, s)))
                .collect()
        })
        .unwrap_or_default()
}
