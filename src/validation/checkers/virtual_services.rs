//! More than one virtual service claiming the same destination host.

use super::GroupChecker;
use crate::config::AnalyzerConfig;
use crate::domain::{HostResolver, MeshObject, ResolvedHost};
use crate::validation::graph::{CheckCode, Finding, ValidationEntry, ValidationGraph, ValidationKey};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

const NO_GATEWAY: &str = "no-gateway";
const WILDCARD_SERVICE: &str = "*";
const HOSTS_PATH: &str = "spec/hosts";

/// (gateway, cluster, namespace, service)
type HostGroupKey = (String, String, String, String);

/// Every rule and service seen under one namespace, across gateways and clusters.
#[derive(Default)]
struct NamespaceBucket {
    services: BTreeSet<String>,
    rules: Vec<ValidationKey>,
}

impl NamespaceBucket {
    fn wildcard_shadows_others(&self) -> bool {
        self.services.contains(WILDCARD_SERVICE) && self.services.len() > 1
    }
}

/// Groups virtual services by resolved host and flags hosts claimed twice.
///
/// A rule declaring N hosts is grouped once per host (and per gateway), so
/// it can take part in several conflicts at once.
pub struct SingleHostChecker<'a> {
    namespace: &'a str,
    known_namespaces: &'a [String],
    virtual_services: Vec<&'a MeshObject>,
    resolver: &'a dyn HostResolver,
    config: &'a AnalyzerConfig,
}

impl<'a> SingleHostChecker<'a> {
    pub fn new(
        namespace: &'a str,
        known_namespaces: &'a [String],
        virtual_services: Vec<&'a MeshObject>,
        resolver: &'a dyn HostResolver,
        config: &'a AnalyzerConfig,
    ) -> Self {
        Self {
            namespace,
            known_namespaces,
            virtual_services,
            resolver,
            config,
        }
    }

    fn resolved_hosts(&self, virtual_service: &MeshObject) -> Vec<ResolvedHost> {
        let namespace = virtual_service.namespace();
        let cluster = virtual_service.cluster(&self.config.identity_domain);

        virtual_service
            .spec_strings("/hosts")
            .into_iter()
            .filter_map(|(_, host)| {
                let resolved = self
                    .resolver
                    .resolve(host, namespace, cluster, self.known_namespaces);
                if resolved.is_none() {
                    debug!(virtual_service = %virtual_service.name(), host, "Skipping unresolvable host");
                }
                resolved
            })
            .map(|mut resolved| {
                if !resolved.complete_input {
                    resolved.cluster = cluster.to_string();
                    resolved.namespace = namespace.to_string();
                }
                resolved
            })
            .collect()
    }

    fn host_groups(&self) -> BTreeMap<HostGroupKey, Vec<ValidationKey>> {
        let mut groups: BTreeMap<HostGroupKey, Vec<ValidationKey>> = BTreeMap::new();

        for virtual_service in &self.virtual_services {
            let key = ValidationKey::for_object(virtual_service);
            let mut gateways: Vec<&str> = virtual_service
                .spec_strings("/gateways")
                .into_iter()
                .map(|(_, gateway)| gateway)
                .collect();
            if gateways.is_empty() {
                gateways.push(NO_GATEWAY);
            }

            for host in self.resolved_hosts(virtual_service) {
                for gateway in &gateways {
                    groups
                        .entry((
                            gateway.to_string(),
                            host.cluster.clone(),
                            host.namespace.clone(),
                            host.service.clone(),
                        ))
                        .or_default()
                        .push(key.clone());
                }
            }
        }

        groups
    }
}

fn single_host_entry<'k, I>(key: &ValidationKey, references: I) -> ValidationEntry
where
    I: IntoIterator<Item = &'k ValidationKey>,
{
    ValidationEntry::new(key.clone())
        .with_finding(Finding::build(CheckCode::VirtualServiceSingleHost, HOSTS_PATH))
        .with_references(references.into_iter().cloned())
}

impl GroupChecker for SingleHostChecker<'_> {
    fn check(&self) -> ValidationGraph {
        let _span = crate::check_span!("virtualservices.singlehost", namespace = %self.namespace).entered();

        let groups = self.host_groups();
        let mut namespaces: BTreeMap<&str, NamespaceBucket> = BTreeMap::new();
        for ((_, _, namespace, service), rules) in &groups {
            let bucket = namespaces.entry(namespace.as_str()).or_default();
            bucket.services.insert(service.clone());
            bucket.rules.extend(rules.iter().cloned());
        }

        let mut validations = ValidationGraph::new();
        for ((gateway, cluster, namespace, service), rules) in &groups {
            let same_host = rules.len() > 1;
            let wildcard = namespaces
                .get(namespace.as_str())
                .filter(|bucket| bucket.wildcard_shadows_others());

            if same_host {
                debug!(
                    gateway = %gateway,
                    cluster = %cluster,
                    namespace = %namespace,
                    service = %service,
                    rules = rules.len(),
                    "Host claimed by several virtual services"
                );
            }

            for rule in rules {
                if same_host {
                    validations.merge_entry(single_host_entry(rule, rules));
                }
                if let Some(bucket) = wildcard {
                    validations.merge_entry(single_host_entry(rule, &bucket.rules));
                }
            }
        }

        validations
    }
}
