use crate::config::AnalyzerConfig;
use crate::domain::{
    mesh_wide_destination_rule_mode, namespace_wide_destination_rule_mode, peer_authentication_mode, MeshObject,
    MtlsMode, MtlsStatus,
};
use serde::Serialize;

/// Policy objects relevant to the mTLS state of one namespace.
#[derive(Debug, Clone, Default)]
pub struct MtlsDetails<'a> {
    /// Peer authentications of the namespace itself
    pub peer_authentications: Vec<&'a MeshObject>,
    /// Peer authentications of the root namespace
    pub mesh_peer_authentications: Vec<&'a MeshObject>,
    /// Every destination rule visible to the namespace
    pub destination_rules: Vec<&'a MeshObject>,
}

impl<'a> MtlsDetails<'a> {
    /// Mode of the first namespace peer authentication that sets one.
    pub fn namespace_peer_authentication_mode(&self) -> MtlsMode {
        first_set_mode(self.peer_authentications.iter().map(|pa| peer_authentication_mode(pa)))
    }

    /// Mode of the first root-namespace peer authentication that sets one.
    pub fn mesh_peer_authentication_mode(&self) -> MtlsMode {
        first_set_mode(
            self.mesh_peer_authentications
                .iter()
                .map(|pa| peer_authentication_mode(pa)),
        )
    }

    pub fn namespace_destination_rule_mode(&self, namespace: &str, config: &AnalyzerConfig) -> MtlsMode {
        first_set_mode(
            self.destination_rules
                .iter()
                .map(|dr| namespace_wide_destination_rule_mode(namespace, dr, config)),
        )
    }

    pub fn mesh_destination_rule_mode(&self) -> MtlsMode {
        first_set_mode(
            self.destination_rules
                .iter()
                .map(|dr| mesh_wide_destination_rule_mode(dr)),
        )
    }
}

fn first_set_mode<I: Iterator<Item = MtlsMode>>(mut modes: I) -> MtlsMode {
    modes.find(MtlsMode::is_set).unwrap_or_default()
}

/// The modes found at one scope and the status they resolve to.
///
/// `status` is `None` only for the empty placeholder used while inheriting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsStatus {
    pub destination_rule_mode: MtlsMode,
    pub peer_authentication_mode: MtlsMode,
    pub status: Option<MtlsStatus>,
}

impl TlsStatus {
    fn is_defined(&self) -> bool {
        self.status.is_some_and(|status| status.is_defined())
    }

    fn is_partial(&self) -> bool {
        self.status == Some(MtlsStatus::PartiallyEnabled)
    }

    fn has_no_config(&self) -> bool {
        !self.peer_authentication_mode.is_set() && !self.destination_rule_mode.is_set()
    }

    /// Exactly one side says DISABLE and the other says nothing.
    fn has_partial_disabled_config(&self) -> bool {
        (self.peer_authentication_mode == MtlsMode::Disable && !self.destination_rule_mode.is_set())
            || (self.destination_rule_mode == MtlsMode::Disable && !self.peer_authentication_mode.is_set())
    }
}

/// Decision table merging destination-rule and peer-authentication modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MtlsStatusResolver {
    pub auto_mtls_enabled: bool,
    pub allow_permissive: bool,
}

impl MtlsStatusResolver {
    pub fn new(auto_mtls_enabled: bool, allow_permissive: bool) -> Self {
        Self {
            auto_mtls_enabled,
            allow_permissive,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.auto_mtls_enabled, config.allow_permissive)
    }

    /// Status of one scope from its first destination-rule and peer-authentication modes.
    pub fn table_status(&self, destination_rule_mode: &MtlsMode, peer_authentication_mode: &MtlsMode) -> MtlsStatus {
        let auto_negotiated = !destination_rule_mode.is_set() && self.auto_mtls_enabled;
        let mtls_enabled = destination_rule_mode.requires_mutual() || auto_negotiated;
        let mtls_disabled = *destination_rule_mode == MtlsMode::Disable || auto_negotiated;

        let peer_enabled = *peer_authentication_mode == MtlsMode::Strict
            || (*peer_authentication_mode == MtlsMode::Permissive && self.allow_permissive);

        if peer_enabled && mtls_enabled {
            MtlsStatus::Enabled
        } else if *peer_authentication_mode == MtlsMode::Disable && mtls_disabled {
            MtlsStatus::Disabled
        } else if !peer_authentication_mode.is_set() && !destination_rule_mode.is_set() {
            MtlsStatus::NotEnabled
        } else {
            MtlsStatus::PartiallyEnabled
        }
    }

    pub fn final_status(&self, destination_rule_mode: MtlsMode, peer_authentication_mode: MtlsMode) -> TlsStatus {
        let status = self.table_status(&destination_rule_mode, &peer_authentication_mode);
        TlsStatus {
            destination_rule_mode,
            peer_authentication_mode,
            status: Some(status),
        }
    }

    /// Status of `namespace` on its own, without mesh-wide inheritance.
    pub fn namespace_status(&self, namespace: &str, details: &MtlsDetails<'_>, config: &AnalyzerConfig) -> TlsStatus {
        self.final_status(
            details.namespace_destination_rule_mode(namespace, config),
            details.namespace_peer_authentication_mode(),
        )
    }

    /// Status of the mesh from `*.local` destination rules and root-namespace peer authentications.
    pub fn mesh_status(&self, details: &MtlsDetails<'_>) -> TlsStatus {
        let scoped = self.final_status(
            details.mesh_destination_rule_mode(),
            details.mesh_peer_authentication_mode(),
        );
        let status = self.overall_status(&TlsStatus::default(), &scoped);
        TlsStatus {
            status: Some(status),
            ..scoped
        }
    }

    /// Merge a namespace status with the mesh status; the first matching rule wins.
    pub fn overall_status(&self, namespace: &TlsStatus, mesh: &TlsStatus) -> MtlsStatus {
        if namespace.is_defined() {
            if let Some(status) = namespace.status {
                return status;
            }
        }
        if namespace.is_partial() {
            return self.inherited_status(namespace, mesh);
        }
        if mesh.is_defined() {
            if let Some(status) = mesh.status {
                return status;
            }
        }

        if mesh.has_no_config() {
            MtlsStatus::NotEnabled
        } else if mesh.has_partial_disabled_config() {
            MtlsStatus::Disabled
        } else if self.has_half_config_defined(mesh) {
            MtlsStatus::Enabled
        } else {
            // Covers a partially enabled mesh without auto mTLS as well
            MtlsStatus::PartiallyEnabled
        }
    }

    /// Fill the namespace gaps with mesh modes and resolve once more as a mesh-level status.
    fn inherited_status(&self, namespace: &TlsStatus, mesh: &TlsStatus) -> MtlsStatus {
        let inherit = |own: &MtlsMode, mesh: &MtlsMode| {
            if own.is_set() {
                own.clone()
            } else {
                mesh.clone()
            }
        };

        let filled = self.final_status(
            inherit(&namespace.destination_rule_mode, &mesh.destination_rule_mode),
            inherit(&namespace.peer_authentication_mode, &mesh.peer_authentication_mode),
        );
        self.overall_status(&TlsStatus::default(), &filled)
    }

    /// One side left empty that auto mTLS completes into an enabled mesh.
    fn has_half_config_defined(&self, mesh: &TlsStatus) -> bool {
        if !self.auto_mtls_enabled {
            return false;
        }

        let pa = &mesh.peer_authentication_mode;
        let dr = &mesh.destination_rule_mode;
        (*pa == MtlsMode::Strict && !dr.is_set())
            || (dr.requires_mutual() && !pa.is_set())
            || (self.allow_permissive && *pa == MtlsMode::Permissive && !dr.is_set())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObjectKind;
    use serde_json::json;

    fn resolver(auto_mtls: bool, allow_permissive: bool) -> MtlsStatusResolver {
        MtlsStatusResolver::new(auto_mtls, allow_permissive)
    }

    fn mode(value: &str) -> MtlsMode {
        MtlsMode::parse(value)
    }

    fn tls(dr: &str, pa: &str, status: MtlsStatus) -> TlsStatus {
        TlsStatus {
            destination_rule_mode: mode(dr),
            peer_authentication_mode: mode(pa),
            status: Some(status),
        }
    }

    #[test]
    fn table_matches_documented_cases() {
        assert_eq!(resolver(false, false).table_status(&mode(""), &mode("")), MtlsStatus::NotEnabled);
        assert_eq!(
            resolver(false, false).table_status(&mode("ISTIO_MUTUAL"), &mode("STRICT")),
            MtlsStatus::Enabled
        );
        assert_eq!(
            resolver(false, false).table_status(&mode("DISABLE"), &mode("DISABLE")),
            MtlsStatus::Disabled
        );
        assert_eq!(resolver(false, false).table_status(&mode(""), &mode("STRICT")), MtlsStatus::PartiallyEnabled);
        assert_eq!(resolver(true, false).table_status(&mode(""), &mode("STRICT")), MtlsStatus::Enabled);
    }

    #[test]
    fn permissive_counts_only_when_allowed() {
        assert_eq!(
            resolver(false, false).table_status(&mode("MUTUAL"), &mode("PERMISSIVE")),
            MtlsStatus::PartiallyEnabled
        );
        assert_eq!(
            resolver(false, true).table_status(&mode("MUTUAL"), &mode("PERMISSIVE")),
            MtlsStatus::Enabled
        );
    }

    #[test]
    fn auto_mtls_fills_missing_destination_rule_both_ways() {
        assert_eq!(resolver(true, false).table_status(&mode(""), &mode("DISABLE")), MtlsStatus::Disabled);
        assert_eq!(
            resolver(false, false).table_status(&mode(""), &mode("DISABLE")),
            MtlsStatus::PartiallyEnabled
        );
    }

    #[test]
    fn unknown_destination_rule_mode_is_partial() {
        assert_eq!(
            resolver(true, true).table_status(&mode("SIMPLE"), &mode("STRICT")),
            MtlsStatus::PartiallyEnabled
        );
    }

    #[test]
    fn defined_namespace_status_wins() {
        let r = resolver(true, false);
        let namespace = tls("DISABLE", "DISABLE", MtlsStatus::Disabled);
        let mesh = tls("ISTIO_MUTUAL", "STRICT", MtlsStatus::Enabled);
        assert_eq!(r.overall_status(&namespace, &mesh), MtlsStatus::Disabled);
    }

    #[test]
    fn partial_namespace_inherits_mesh_modes() {
        let r = resolver(false, false);
        // Namespace only enables on the destination rule side; the mesh supplies STRICT.
        let namespace = r.final_status(mode("ISTIO_MUTUAL"), mode(""));
        assert_eq!(namespace.status, Some(MtlsStatus::PartiallyEnabled));
        let mesh = r.final_status(mode(""), mode("STRICT"));
        assert_eq!(r.overall_status(&namespace, &mesh), MtlsStatus::Enabled);
    }

    #[test]
    fn partial_namespace_stays_partial_when_mesh_adds_nothing() {
        let r = resolver(false, false);
        let namespace = r.final_status(mode("MUTUAL"), mode("PERMISSIVE"));
        let mesh = r.final_status(mode(""), mode(""));
        assert_eq!(r.overall_status(&namespace, &mesh), MtlsStatus::PartiallyEnabled);
    }

    #[test]
    fn not_enabled_namespace_falls_back_to_mesh() {
        let r = resolver(false, false);
        let namespace = r.final_status(mode(""), mode(""));
        assert_eq!(
            r.overall_status(&namespace, &tls("ISTIO_MUTUAL", "STRICT", MtlsStatus::Enabled)),
            MtlsStatus::Enabled
        );
        assert_eq!(r.overall_status(&namespace, &r.final_status(mode(""), mode(""))), MtlsStatus::NotEnabled);
    }

    #[test]
    fn mesh_half_disabled_is_disabled() {
        let r = resolver(false, false);
        let empty = TlsStatus::default();
        let mesh = r.final_status(mode("DISABLE"), mode(""));
        assert_eq!(mesh.status, Some(MtlsStatus::PartiallyEnabled));
        assert_eq!(r.overall_status(&empty, &mesh), MtlsStatus::Disabled);
    }

    #[test]
    fn mesh_half_enabled_needs_auto_mtls() {
        let empty = TlsStatus::default();
        let strict_only = TlsStatus {
            destination_rule_mode: MtlsMode::Unset,
            peer_authentication_mode: MtlsMode::Strict,
            status: Some(MtlsStatus::PartiallyEnabled),
        };
        assert_eq!(resolver(true, false).overall_status(&empty, &strict_only), MtlsStatus::Enabled);
        assert_eq!(
            resolver(false, false).overall_status(&empty, &strict_only),
            MtlsStatus::PartiallyEnabled
        );

        let permissive_only = TlsStatus {
            peer_authentication_mode: MtlsMode::Permissive,
            ..strict_only.clone()
        };
        assert_eq!(
            resolver(true, false).overall_status(&empty, &permissive_only),
            MtlsStatus::PartiallyEnabled
        );
        assert_eq!(resolver(true, true).overall_status(&empty, &permissive_only), MtlsStatus::Enabled);
    }

    #[test]
    fn details_read_first_modes() {
        let config = AnalyzerConfig::default();
        let workload_pa = MeshObject::new(
            ObjectKind::PeerAuthentication,
            "workload",
            "bookinfo",
            json!({"selector": {"matchLabels": {"app": "reviews"}}, "mtls": {"mode": "DISABLE"}}),
        );
        let ns_pa = MeshObject::new(
            ObjectKind::PeerAuthentication,
            "default",
            "bookinfo",
            json!({"mtls": {"mode": "PERMISSIVE"}}),
        );
        let mesh_pa = MeshObject::new(ObjectKind::PeerAuthentication, "default", "istio-system", json!({"mtls": {}}));
        let ns_dr = MeshObject::new(
            ObjectKind::DestinationRule,
            "ns",
            "bookinfo",
            json!({"host": "*.bookinfo.svc.cluster.local", "trafficPolicy": {"tls": {"mode": "ISTIO_MUTUAL"}}}),
        );
        let mesh_dr = MeshObject::new(
            ObjectKind::DestinationRule,
            "mesh",
            "istio-system",
            json!({"host": "*.local", "trafficPolicy": {"tls": {"mode": "DISABLE"}}}),
        );

        let details = MtlsDetails {
            peer_authentications: vec![&workload_pa, &ns_pa],
            mesh_peer_authentications: vec![&mesh_pa],
            destination_rules: vec![&mesh_dr, &ns_dr],
        };

        assert_eq!(details.namespace_peer_authentication_mode(), MtlsMode::Permissive);
        assert_eq!(details.mesh_peer_authentication_mode(), MtlsMode::Strict);
        assert_eq!(details.namespace_destination_rule_mode("bookinfo", &config), MtlsMode::IstioMutual);
        assert_eq!(details.namespace_destination_rule_mode("eshop", &config), MtlsMode::Unset);
        assert_eq!(details.mesh_destination_rule_mode(), MtlsMode::Disable);

        let r = MtlsStatusResolver::from_config(&config);
        let namespace = r.namespace_status("bookinfo", &details, &config);
        assert_eq!(namespace.status, Some(MtlsStatus::PartiallyEnabled));

        let mesh = r.mesh_status(&details);
        assert_eq!(mesh.destination_rule_mode, MtlsMode::Disable);
        assert_eq!(mesh.peer_authentication_mode, MtlsMode::Strict);
        assert_eq!(mesh.status, Some(MtlsStatus::PartiallyEnabled));
    }

    #[test]
    fn tls_status_serializes_wire_names() {
        let value = serde_json::to_value(tls("ISTIO_MUTUAL", "STRICT", MtlsStatus::Enabled)).unwrap();
        assert_eq!(value["destinationRuleMode"], "ISTIO_MUTUAL");
        assert_eq!(value["peerAuthenticationMode"], "STRICT");
        assert_eq!(value["status"], "MTLS_ENABLED");
    }
}
