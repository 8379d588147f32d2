//! mTLS modes and statuses, and how they are read off policy objects.

use crate::config::{AnalyzerConfig, MESH_WIDE_HOST};
use crate::domain::object::MeshObject;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An mTLS mode declared by a peer authentication or destination rule.
///
/// `Unset` means no applicable policy was found. Modes outside the known set
/// (for example `SIMPLE` on a destination rule) are kept verbatim as `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum MtlsMode {
    #[default]
    Unset,
    Disable,
    Permissive,
    Strict,
    Mutual,
    IstioMutual,
    Other(String),
}

impl MtlsMode {
    pub fn parse(mode: &str) -> Self {
        match mode {
            "" => MtlsMode::Unset,
            "DISABLE" => MtlsMode::Disable,
            "PERMISSIVE" => MtlsMode::Permissive,
            "STRICT" => MtlsMode::Strict,
            "MUTUAL" => MtlsMode::Mutual,
            "ISTIO_MUTUAL" => MtlsMode::IstioMutual,
            other => MtlsMode::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MtlsMode::Unset => "",
            MtlsMode::Disable => "DISABLE",
            MtlsMode::Permissive => "PERMISSIVE",
            MtlsMode::Strict => "STRICT",
            MtlsMode::Mutual => "MUTUAL",
            MtlsMode::IstioMutual => "ISTIO_MUTUAL",
            MtlsMode::Other(mode) => mode,
        }
    }

    pub fn is_set(&self) -> bool {
        *self != MtlsMode::Unset
    }

    /// `MUTUAL` and `ISTIO_MUTUAL` both require mutual TLS.
    pub fn requires_mutual(&self) -> bool {
        matches!(self, MtlsMode::Mutual | MtlsMode::IstioMutual)
    }
}

impl fmt::Display for MtlsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for MtlsMode {
    fn from(mode: &str) -> Self {
        MtlsMode::parse(mode)
    }
}

impl Serialize for MtlsMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MtlsMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mode = String::deserialize(deserializer)?;
        Ok(MtlsMode::parse(&mode))
    }
}

/// Computed mTLS enablement of a namespace or of the whole mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MtlsStatus {
    #[serde(rename = "MTLS_ENABLED")]
    Enabled,
    #[serde(rename = "MTLS_PARTIALLY_ENABLED")]
    PartiallyEnabled,
    #[serde(rename = "MTLS_NOT_ENABLED")]
    NotEnabled,
    #[serde(rename = "MTLS_DISABLED")]
    Disabled,
}

impl MtlsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MtlsStatus::Enabled => "MTLS_ENABLED",
            MtlsStatus::PartiallyEnabled => "MTLS_PARTIALLY_ENABLED",
            MtlsStatus::NotEnabled => "MTLS_NOT_ENABLED",
            MtlsStatus::Disabled => "MTLS_DISABLED",
        }
    }

    /// `Enabled` and `Disabled` settle the question without inheritance.
    pub fn is_defined(&self) -> bool {
        matches!(self, MtlsStatus::Enabled | MtlsStatus::Disabled)
    }
}

impl fmt::Display for MtlsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode a peer authentication applies to its whole scope.
///
/// Workload-scoped policies (a non-empty `selector.matchLabels`) apply to no
/// scope and yield `Unset`. An `mtls` block without a `mode` key means
/// `STRICT`; a `mode` that is not a string means no mode.
pub fn peer_authentication_mode(peer_authn: &MeshObject) -> MtlsMode {
    let workload_scoped = peer_authn
        .spec_value("/selector/matchLabels")
        .and_then(|labels| labels.as_object())
        .is_some_and(|labels| !labels.is_empty());
    if workload_scoped {
        return MtlsMode::Unset;
    }

    let Some(mtls) = peer_authn.spec_value("/mtls").and_then(|v| v.as_object()) else {
        return MtlsMode::Unset;
    };

    match mtls.get("mode") {
        Some(mode) => mode.as_str().map(MtlsMode::parse).unwrap_or_default(),
        None => MtlsMode::Strict,
    }
}

/// Mode a destination rule sets when its host is exactly `expected_host`.
pub fn destination_rule_mode_for_host(expected_host: &str, destination_rule: &MeshObject) -> MtlsMode {
    if destination_rule.spec_str("/host") != Some(expected_host) {
        return MtlsMode::Unset;
    }

    destination_rule
        .spec_str("/trafficPolicy/tls/mode")
        .map(MtlsMode::parse)
        .unwrap_or_default()
}

/// Mode a destination rule sets for every service of `namespace`.
pub fn namespace_wide_destination_rule_mode(
    namespace: &str,
    destination_rule: &MeshObject,
    config: &AnalyzerConfig,
) -> MtlsMode {
    destination_rule_mode_for_host(&config.namespace_wide_host(namespace), destination_rule)
}

/// Mode a destination rule sets for every service in the mesh.
pub fn mesh_wide_destination_rule_mode(destination_rule: &MeshObject) -> MtlsMode {
    destination_rule_mode_for_host(MESH_WIDE_HOST, destination_rule)
}
