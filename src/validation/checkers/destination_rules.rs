//! Namespace-wide destination rules checked against the peer authentications in scope.

use super::ObjectChecker;
use crate::config::AnalyzerConfig;
use crate::domain::{namespace_wide_destination_rule_mode, peer_authentication_mode, MeshObject, MtlsMode};
use crate::mtls::MtlsDetails;
use crate::validation::graph::{CheckCode, Finding};
use tracing::debug;

const TLS_MODE_PATH: &str = "spec/trafficPolicy/tls/mode";

/// A destination rule disabling mTLS namespace-wide while a peer authentication enforces it.
pub struct DisabledNamespaceWideMtlsChecker<'a> {
    destination_rule: &'a MeshObject,
    details: &'a MtlsDetails<'a>,
    config: &'a AnalyzerConfig,
}

impl<'a> DisabledNamespaceWideMtlsChecker<'a> {
    pub fn new(destination_rule: &'a MeshObject, details: &'a MtlsDetails<'a>, config: &'a AnalyzerConfig) -> Self {
        Self {
            destination_rule,
            details,
            config,
        }
    }
}

impl ObjectChecker for DisabledNamespaceWideMtlsChecker<'_> {
    fn check(&self) -> (Vec<Finding>, bool) {
        let dr = self.destination_rule;
        if namespace_wide_destination_rule_mode(dr.namespace(), dr, self.config) != MtlsMode::Disable {
            return (Vec::new(), true);
        }

        // Only a namespace policy enabling mTLS settles it; DISABLE or unknown modes fall through to the mesh
        if let Some(mode) = self
            .details
            .peer_authentications
            .iter()
            .map(|pa| peer_authentication_mode(pa))
            .find(|mode| matches!(mode, MtlsMode::Strict | MtlsMode::Permissive))
        {
            if mode == MtlsMode::Strict {
                debug!(destination_rule = %dr.name(), namespace = %dr.namespace(), "Namespace policy enforces mTLS");
                return (vec![Finding::build(CheckCode::DestinationRulePolicyMtlsEnabled, TLS_MODE_PATH)], false);
            }
            return (Vec::new(), true);
        }

        let mesh_strict = self
            .details
            .mesh_peer_authentications
            .iter()
            .any(|pa| peer_authentication_mode(pa) == MtlsMode::Strict);
        if mesh_strict {
            debug!(destination_rule = %dr.name(), namespace = %dr.namespace(), "Mesh policy enforces mTLS");
            return (vec![Finding::build(CheckCode::DestinationRuleMeshPolicyMtlsEnabled, TLS_MODE_PATH)], false);
        }

        (Vec::new(), true)
    }
}

/// A destination rule requiring mTLS namespace-wide with no peer authentication backing it.
pub struct NamespaceWideMtlsChecker<'a> {
    destination_rule: &'a MeshObject,
    details: &'a MtlsDetails<'a>,
    config: &'a AnalyzerConfig,
}

impl<'a> NamespaceWideMtlsChecker<'a> {
    pub fn new(destination_rule: &'a MeshObject, details: &'a MtlsDetails<'a>, config: &'a AnalyzerConfig) -> Self {
        Self {
            destination_rule,
            details,
            config,
        }
    }
}

impl ObjectChecker for NamespaceWideMtlsChecker<'_> {
    fn check(&self) -> (Vec<Finding>, bool) {
        let dr = self.destination_rule;
        if !namespace_wide_destination_rule_mode(dr.namespace(), dr, self.config).requires_mutual() {
            return (Vec::new(), true);
        }

        let policy_defined = self
            .details
            .peer_authentications
            .iter()
            .chain(self.details.mesh_peer_authentications.iter())
            .any(|pa| peer_authentication_mode(pa).is_set());
        if policy_defined {
            return (Vec::new(), true);
        }

        debug!(destination_rule = %dr.name(), namespace = %dr.namespace(), "No peer authentication backs namespace-wide mTLS");
        (vec![Finding::build(CheckCode::DestinationRuleNamespacePolicyMissing, TLS_MODE_PATH)], false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObjectKind;
    use crate::validation::graph::Severity;
    use serde_json::json;

    fn destination_rule(name: &str, host: &str, mode: &str) -> MeshObject {
        MeshObject::new(
            ObjectKind::DestinationRule,
            name,
            "bookinfo",
            json!({"host": host, "trafficPolicy": {"tls": {"mode": mode}}}),
        )
    }

    fn disabling_rule() -> MeshObject {
        destination_rule("disable-mtls", "*.bookinfo.svc.cluster.local", "DISABLE")
    }

    fn enabling_rule() -> MeshObject {
        destination_rule("dr-mtls", "*.bookinfo.svc.cluster.local", "ISTIO_MUTUAL")
    }

    fn peer_authn(namespace: &str, mode: &str) -> MeshObject {
        MeshObject::new(
            ObjectKind::PeerAuthentication,
            "default",
            namespace,
            json!({"mtls": {"mode": mode}}),
        )
    }

    fn details<'a>(namespace: &[&'a MeshObject], mesh: &[&'a MeshObject]) -> MtlsDetails<'a> {
        MtlsDetails {
            peer_authentications: namespace.to_vec(),
            mesh_peer_authentications: mesh.to_vec(),
            destination_rules: Vec::new(),
        }
    }

    fn check_disabled(dr: &MeshObject, details: &MtlsDetails<'_>) -> (Vec<Finding>, bool) {
        let config = AnalyzerConfig::default();
        DisabledNamespaceWideMtlsChecker::new(dr, details, &config).check()
    }

    fn check_enabled(dr: &MeshObject, details: &MtlsDetails<'_>) -> (Vec<Finding>, bool) {
        let config = AnalyzerConfig::default();
        NamespaceWideMtlsChecker::new(dr, details, &config).check()
    }

    fn assert_single(result: (Vec<Finding>, bool), code: CheckCode) {
        let (findings, valid) = result;
        assert!(!valid);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, code);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].path, "spec/trafficPolicy/tls/mode");
    }

    fn assert_clean(result: (Vec<Finding>, bool)) {
        assert_eq!(result, (Vec::new(), true));
    }

    #[test]
    fn permissive_namespace_policy_tolerates_plaintext() {
        let permissive = peer_authn("bookinfo", "PERMISSIVE");
        let mesh_strict = peer_authn("istio-system", "STRICT");
        assert_clean(check_disabled(&disabling_rule(), &details(&[&permissive], &[])));
        assert_clean(check_disabled(&disabling_rule(), &details(&[&permissive], &[&mesh_strict])));
    }

    #[test]
    fn disabled_namespace_policy_agrees() {
        let disable = peer_authn("bookinfo", "DISABLE");
        assert_clean(check_disabled(&disabling_rule(), &details(&[&disable], &[])));
    }

    #[test]
    fn non_enabling_namespace_policy_defers_to_mesh() {
        let unset = peer_authn("bookinfo", "UNSET");
        let disable = peer_authn("bookinfo", "DISABLE");
        let mesh_strict = peer_authn("istio-system", "STRICT");
        assert_single(
            check_disabled(&disabling_rule(), &details(&[&unset], &[&mesh_strict])),
            CheckCode::DestinationRuleMeshPolicyMtlsEnabled,
        );
        assert_single(
            check_disabled(&disabling_rule(), &details(&[&disable], &[&mesh_strict])),
            CheckCode::DestinationRuleMeshPolicyMtlsEnabled,
        );
    }

    #[test]
    fn later_strict_namespace_policy_is_found() {
        let disable = peer_authn("bookinfo", "DISABLE");
        let strict = peer_authn("bookinfo", "STRICT");
        assert_single(
            check_disabled(&disabling_rule(), &details(&[&disable, &strict], &[])),
            CheckCode::DestinationRulePolicyMtlsEnabled,
        );
    }

    #[test]
    fn strict_namespace_policy_conflicts() {
        let strict = peer_authn("bookinfo", "STRICT");
        assert_single(
            check_disabled(&disabling_rule(), &details(&[&strict], &[])),
            CheckCode::DestinationRulePolicyMtlsEnabled,
        );
    }

    #[test]
    fn strict_mesh_policy_conflicts() {
        let mesh_strict = peer_authn("istio-system", "STRICT");
        assert_single(
            check_disabled(&disabling_rule(), &details(&[], &[&mesh_strict])),
            CheckCode::DestinationRuleMeshPolicyMtlsEnabled,
        );
    }

    #[test]
    fn permissive_or_missing_mesh_policy_is_fine() {
        let mesh_permissive = peer_authn("istio-system", "PERMISSIVE");
        assert_clean(check_disabled(&disabling_rule(), &details(&[], &[&mesh_permissive])));
        assert_clean(check_disabled(&disabling_rule(), &details(&[], &[])));
    }

    #[test]
    fn mesh_wide_rule_is_not_namespace_wide() {
        let mesh_rule = destination_rule("dr-mtls", "*.local", "DISABLE");
        let strict = peer_authn("bookinfo", "STRICT");
        assert_clean(check_disabled(&mesh_rule, &details(&[&strict], &[])));
    }

    #[test]
    fn namespace_wide_enable_is_backed_by_any_policy() {
        let permissive = peer_authn("bookinfo", "PERMISSIVE");
        let strict = peer_authn("bookinfo", "STRICT");
        let mesh_strict = peer_authn("istio-system", "STRICT");
        assert_clean(check_enabled(&enabling_rule(), &details(&[&permissive], &[])));
        assert_clean(check_enabled(&enabling_rule(), &details(&[&strict], &[])));
        assert_clean(check_enabled(&enabling_rule(), &details(&[], &[&mesh_strict])));
    }

    #[test]
    fn namespace_wide_enable_without_policy() {
        assert_single(
            check_enabled(&enabling_rule(), &details(&[], &[])),
            CheckCode::DestinationRuleNamespacePolicyMissing,
        );

        let mutual = destination_rule("dr-mtls", "*.bookinfo.svc.cluster.local", "MUTUAL");
        assert_single(
            check_enabled(&mutual, &details(&[], &[])),
            CheckCode::DestinationRuleNamespacePolicyMissing,
        );
    }

    #[test]
    fn workload_policies_do_not_count() {
        let workload = MeshObject::new(
            ObjectKind::PeerAuthentication,
            "reviews",
            "bookinfo",
            json!({"selector": {"matchLabels": {"app": "reviews"}}, "mtls": {"mode": "STRICT"}}),
        );
        assert_single(
            check_enabled(&enabling_rule(), &details(&[&workload], &[])),
            CheckCode::DestinationRuleNamespacePolicyMissing,
        );
        assert_clean(check_disabled(&disabling_rule(), &details(&[&workload], &[])));
    }

    #[test]
    fn unrelated_rules_are_skipped() {
        assert_clean(check_enabled(&disabling_rule(), &details(&[], &[])));
        let plain = MeshObject::new(ObjectKind::DestinationRule, "reviews", "bookinfo", json!({"host": "reviews"}));
        assert_clean(check_enabled(&plain, &details(&[], &[])));
        assert_clean(check_disabled(&plain, &details(&[], &[])));
    }
}
