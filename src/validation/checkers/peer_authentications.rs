//! Peer authentications disabling mTLS while a destination rule still requires it.

use super::ObjectChecker;
use crate::config::AnalyzerConfig;
use crate::domain::{
    mesh_wide_destination_rule_mode, namespace_wide_destination_rule_mode, peer_authentication_mode, MeshObject,
    MtlsMode,
};
use crate::validation::graph::{CheckCode, Finding};
use tracing::debug;

const MTLS_PATH: &str = "spec/mtls";

pub struct DisabledNamespaceWideChecker<'a> {
    peer_authn: &'a MeshObject,
    destination_rules: Vec<&'a MeshObject>,
    config: &'a AnalyzerConfig,
}

impl<'a> DisabledNamespaceWideChecker<'a> {
    pub fn new(peer_authn: &'a MeshObject, destination_rules: Vec<&'a MeshObject>, config: &'a AnalyzerConfig) -> Self {
        Self {
            peer_authn,
            destination_rules,
            config,
        }
    }
}

impl ObjectChecker for DisabledNamespaceWideChecker<'_> {
    fn check(&self) -> (Vec<Finding>, bool) {
        if peer_authentication_mode(self.peer_authn) != MtlsMode::Disable {
            return (Vec::new(), true);
        }

        let namespace = self.peer_authn.namespace();
        let conflicting = self.destination_rules.iter().find(|dr| {
            namespace_wide_destination_rule_mode(namespace, dr, self.config).requires_mutual()
                || mesh_wide_destination_rule_mode(dr).requires_mutual()
        });

        match conflicting {
            Some(dr) => {
                debug!(
                    peer_authentication = %self.peer_authn.name(),
                    namespace,
                    destination_rule = %dr.name(),
                    "Destination rule still requires mTLS"
                );
                (vec![Finding::build(CheckCode::PeerAuthnDisableDestinationRuleMissing, MTLS_PATH)], false)
            }
            None => (Vec::new(), true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObjectKind;
    use crate::validation::graph::Severity;
    use serde_json::json;

    fn peer_authn(mode: &str) -> MeshObject {
        MeshObject::new(
            ObjectKind::PeerAuthentication,
            "default",
            "bookinfo",
            json!({"mtls": {"mode": mode}}),
        )
    }

    fn destination_rule(host: &str, mode: &str) -> MeshObject {
        MeshObject::new(
            ObjectKind::DestinationRule,
            "dr",
            "bookinfo",
            json!({"host": host, "trafficPolicy": {"tls": {"mode": mode}}}),
        )
    }

    fn check(pa: &MeshObject, drs: &[&MeshObject]) -> (Vec<Finding>, bool) {
        let config = AnalyzerConfig::default();
        DisabledNamespaceWideChecker::new(pa, drs.to_vec(), &config).check()
    }

    #[test]
    fn only_disabling_policies_are_checked() {
        let dr = destination_rule("*.bookinfo.svc.cluster.local", "ISTIO_MUTUAL");
        assert_eq!(check(&peer_authn("STRICT"), &[&dr]), (Vec::new(), true));
        assert_eq!(check(&peer_authn("PERMISSIVE"), &[&dr]), (Vec::new(), true));
    }

    #[test]
    fn no_rule_requiring_mtls_is_valid() {
        let disabling = destination_rule("*.bookinfo.svc.cluster.local", "DISABLE");
        let other_namespace = destination_rule("*.eshop.svc.cluster.local", "ISTIO_MUTUAL");
        assert_eq!(check(&peer_authn("DISABLE"), &[&disabling, &other_namespace]), (Vec::new(), true));
        assert_eq!(check(&peer_authn("DISABLE"), &[]), (Vec::new(), true));
    }

    #[test]
    fn namespace_rule_requiring_mtls_conflicts() {
        let dr = destination_rule("*.bookinfo.svc.cluster.local", "MUTUAL");
        let (findings, valid) = check(&peer_authn("DISABLE"), &[&dr]);
        assert!(!valid);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, CheckCode::PeerAuthnDisableDestinationRuleMissing);
        assert_eq!(findings[0].path, "spec/mtls");
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn mesh_rule_requiring_mtls_conflicts_once() {
        let mesh = destination_rule("*.local", "ISTIO_MUTUAL");
        let namespace = destination_rule("*.bookinfo.svc.cluster.local", "ISTIO_MUTUAL");
        let (findings, valid) = check(&peer_authn("DISABLE"), &[&mesh, &namespace]);
        assert!(!valid);
        assert_eq!(findings.len(), 1);
    }
}
