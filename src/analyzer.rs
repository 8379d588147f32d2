//! # Analyzer
//!
//! Runs every checker over one snapshot and merges their graphs. Also exposes
//! the namespace, mesh and overall mTLS statuses of a snapshot.

use crate::config::AnalyzerConfig;
use crate::domain::{KubernetesHostResolver, MeshObject, MtlsStatus, ObjectKind, ObjectMeta};
use crate::errors::{ErrorContext, MeshlintError, Result};
use crate::mtls::{MtlsDetails, MtlsStatusResolver, TlsStatus};
use crate::validation::checkers::{
    object_entry, DisabledNamespaceWideChecker, DisabledNamespaceWideMtlsChecker, GroupChecker, MultiMatchChecker,
    NamespaceWideMtlsChecker, ObjectChecker, SingleHostChecker,
};
use crate::validation::ValidationGraph;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Immutable set of mesh objects to analyze, partitioned by kind.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    gateways: Vec<MeshObject>,
    virtual_services: Vec<MeshObject>,
    destination_rules: Vec<MeshObject>,
    peer_authentications: Vec<MeshObject>,
}

/// One YAML document before its kind is known to be supported.
#[derive(Deserialize)]
struct RawDocument {
    kind: String,
    metadata: ObjectMeta,
    #[serde(default)]
    spec: Value,
}

impl Snapshot {
    pub fn from_objects(objects: Vec<MeshObject>) -> Self {
        let mut snapshot = Self::default();
        for object in objects {
            match object.kind {
                ObjectKind::Gateway => snapshot.gateways.push(object),
                ObjectKind::VirtualService => snapshot.virtual_services.push(object),
                ObjectKind::DestinationRule => snapshot.destination_rules.push(object),
                ObjectKind::PeerAuthentication => snapshot.peer_authentications.push(object),
            }
        }
        snapshot
    }

    /// Parse a multi-document YAML stream of `{kind, metadata, spec}` objects.
    ///
    /// Documents of unsupported kinds are skipped.
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let mut objects = Vec::new();

        for (index, document) in serde_yaml::Deserializer::from_str(input).enumerate() {
            let value = serde_yaml::Value::deserialize(document)
                .context(format!("Failed to parse snapshot document {}", index))?;
            if value.is_null() {
                continue;
            }

            let kind = value
                .get("kind")
                .and_then(serde_yaml::Value::as_str)
                .ok_or_else(|| MeshlintError::snapshot("document has no kind", Some(index)))?;
            let kind = match kind.parse::<ObjectKind>() {
                Ok(kind) => kind,
                Err(_) => {
                    warn!(document = index, kind, "Skipping unsupported object kind");
                    continue;
                }
            };

            let raw: RawDocument = serde_yaml::from_value(value)
                .context(format!("Failed to read {} in snapshot document {}", kind, index))?;
            debug!(document = index, kind = %raw.kind, name = %raw.metadata.name, "Loaded mesh object");
            objects.push(MeshObject {
                kind,
                metadata: raw.metadata,
                spec: raw.spec,
            });
        }

        Ok(Self::from_objects(objects))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let input = std::fs::read_to_string(path)
            .context(format!("Failed to read snapshot {}", path.display()))?;
        Self::from_yaml_str(&input)
    }

    pub fn gateways(&self) -> &[MeshObject] {
        &self.gateways
    }

    pub fn virtual_services(&self) -> &[MeshObject] {
        &self.virtual_services
    }

    pub fn destination_rules(&self) -> &[MeshObject] {
        &self.destination_rules
    }

    pub fn peer_authentications(&self) -> &[MeshObject] {
        &self.peer_authentications
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
            + self.virtual_services.len()
            + self.destination_rules.len()
            + self.peer_authentications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every namespace owning at least one object, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        self.objects()
            .map(|object| object.namespace().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn objects(&self) -> impl Iterator<Item = &MeshObject> {
        self.gateways
            .iter()
            .chain(&self.virtual_services)
            .chain(&self.destination_rules)
            .chain(&self.peer_authentications)
    }

    fn peer_authentications_in(&self, namespace: &str) -> Vec<&MeshObject> {
        self.peer_authentications
            .iter()
            .filter(|pa| pa.namespace() == namespace)
            .collect()
    }
}

/// Groups objects by namespace, keeping their order inside each namespace.
fn by_namespace(objects: &[MeshObject]) -> BTreeMap<&str, Vec<&MeshObject>> {
    let mut groups: BTreeMap<&str, Vec<&MeshObject>> = BTreeMap::new();
    for object in objects {
        groups.entry(object.namespace()).or_default().push(object);
    }
    groups
}

/// mTLS statuses of one namespace, the mesh, and their merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MtlsReport {
    pub namespace: String,
    pub namespace_status: TlsStatus,
    pub mesh_status: TlsStatus,
    pub overall_status: MtlsStatus,
}

pub struct Analyzer {
    config: AnalyzerConfig,
    resolver: KubernetesHostResolver,
    status_resolver: MtlsStatusResolver,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let resolver = KubernetesHostResolver::new(config.identity_domain.clone());
        let status_resolver = MtlsStatusResolver::from_config(&config);
        Self {
            config,
            resolver,
            status_resolver,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Run every checker and merge the results.
    #[instrument(skip(self, snapshot), fields(objects = snapshot.len()))]
    pub fn analyze(&self, snapshot: &Snapshot) -> ValidationGraph {
        let mut validations = ValidationGraph::new();
        validations.merge(self.gateway_validations(snapshot));
        validations.merge(self.virtual_service_validations(snapshot));
        validations.merge(self.destination_rule_validations(snapshot));
        validations.merge(self.peer_authentication_validations(snapshot));

        info!(
            entries = validations.len(),
            findings = validations.finding_count(),
            "Snapshot analysis complete"
        );
        validations
    }

    fn gateway_validations(&self, snapshot: &Snapshot) -> ValidationGraph {
        let _span = crate::check_span!("gateways.multimatch", gateways = snapshot.gateways().len()).entered();
        let per_namespace = by_namespace(snapshot.gateways()).into_values().collect();
        MultiMatchChecker::new(per_namespace).check()
    }

    fn virtual_service_validations(&self, snapshot: &Snapshot) -> ValidationGraph {
        let known_namespaces = snapshot.namespaces();
        let mut validations = ValidationGraph::new();

        for (namespace, virtual_services) in by_namespace(snapshot.virtual_services()) {
            let checker =
                SingleHostChecker::new(namespace, &known_namespaces, virtual_services, &self.resolver, &self.config);
            validations.merge(checker.check());
        }
        validations
    }

    fn destination_rule_validations(&self, snapshot: &Snapshot) -> ValidationGraph {
        let _span = crate::check_span!("destinationrules.mtls").entered();
        let mut validations = ValidationGraph::new();

        for destination_rule in snapshot.destination_rules() {
            let details = self.mtls_details(snapshot, destination_rule.namespace());

            let (findings, valid) =
                DisabledNamespaceWideMtlsChecker::new(destination_rule, &details, &self.config).check();
            validations.merge_entry(object_entry(destination_rule, findings, valid));

            let (findings, valid) = NamespaceWideMtlsChecker::new(destination_rule, &details, &self.config).check();
            validations.merge_entry(object_entry(destination_rule, findings, valid));
        }
        validations
    }

    fn peer_authentication_validations(&self, snapshot: &Snapshot) -> ValidationGraph {
        let _span = crate::check_span!("peerauthentications.mtls").entered();
        let destination_rules: Vec<&MeshObject> = snapshot.destination_rules().iter().collect();
        let mut validations = ValidationGraph::new();

        for peer_authn in snapshot.peer_authentications() {
            if self.config.is_root_namespace(peer_authn.namespace()) {
                continue;
            }
            let checker = DisabledNamespaceWideChecker::new(peer_authn, destination_rules.clone(), &self.config);
            let (findings, valid) = checker.check();
            validations.merge_entry(object_entry(peer_authn, findings, valid));
        }
        validations
    }

    fn mtls_details<'a>(&self, snapshot: &'a Snapshot, namespace: &str) -> MtlsDetails<'a> {
        MtlsDetails {
            peer_authentications: snapshot.peer_authentications_in(namespace),
            mesh_peer_authentications: snapshot.peer_authentications_in(&self.config.root_namespace),
            destination_rules: snapshot.destination_rules().iter().collect(),
        }
    }

    /// Status of `namespace` from its own policies only.
    pub fn namespace_mtls_status(&self, snapshot: &Snapshot, namespace: &str) -> TlsStatus {
        let details = self.mtls_details(snapshot, namespace);
        self.status_resolver
            .namespace_status(namespace, &details, &self.config)
    }

    pub fn mesh_mtls_status(&self, snapshot: &Snapshot) -> TlsStatus {
        let details = self.mtls_details(snapshot, &self.config.root_namespace);
        self.status_resolver.mesh_status(&details)
    }

    /// Status of `namespace` once mesh-wide policies are inherited.
    pub fn overall_mtls_status(&self, snapshot: &Snapshot, namespace: &str) -> MtlsStatus {
        self.mtls_report(snapshot, namespace).overall_status
    }

    #[instrument(skip(self, snapshot))]
    pub fn mtls_report(&self, snapshot: &Snapshot, namespace: &str) -> MtlsReport {
        let namespace_status = self.namespace_mtls_status(snapshot, namespace);
        let mesh_status = self.mesh_mtls_status(snapshot);
        let overall_status = self
            .status_resolver
            .overall_status(&namespace_status, &mesh_status);

        info!(namespace, overall = %overall_status, "Resolved mTLS status");
        MtlsReport {
            namespace: namespace.to_string(),
            namespace_status,
            mesh_status,
            overall_status,
        }
    }
}
