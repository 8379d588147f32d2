//! Overlapping host and port bindings across gateways.
//!
//! Gateways sharing a workload selector are served by the same ingress
//! instances, so two of them exposing the same hostname on the same port
//! leave the routing undefined. Gateways with different selectors never
//! conflict.

use super::GroupChecker;
use crate::domain::object::string_entries;
use crate::domain::{canonical_selector, MeshObject};
use crate::validation::graph::{CheckCode, Finding, ValidationEntry, ValidationGraph, ValidationKey};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

const WILDCARD: &str = "*";

/// One hostname exposed on one port by one server entry of a gateway.
#[derive(Debug, Clone)]
pub struct HostBinding {
    pub port: i64,
    /// Lower-cased hostname, possibly containing `*` wildcards
    pub hostname: String,
    pub server_index: usize,
    pub host_index: usize,
    pub owner: ValidationKey,
    pattern: Option<Regex>,
}

impl HostBinding {
    pub fn new(owner: ValidationKey, port: i64, hostname: &str, server_index: usize, host_index: usize) -> Self {
        let hostname = hostname.to_lowercase();
        let pattern = wildcard_pattern(&hostname);
        Self {
            port,
            hostname,
            server_index,
            host_index,
            owner,
            pattern,
        }
    }

    /// Pointer to the host entry inside the gateway body
    pub fn path(&self) -> String {
        format!("spec/servers[{}]/hosts[{}]", self.server_index, self.host_index)
    }

    /// Same port and hostnames matching in either direction.
    pub fn overlaps(&self, other: &HostBinding) -> bool {
        if self.port != other.port {
            return false;
        }
        if self.hostname == WILDCARD || other.hostname == WILDCARD {
            return true;
        }
        self.matches_hostname(&other.hostname) || other.matches_hostname(&self.hostname)
    }

    fn matches_hostname(&self, hostname: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(hostname))
    }

    fn conflict_entry(&self, other: &HostBinding) -> ValidationEntry {
        ValidationEntry::new(self.owner.clone())
            .with_finding(Finding::build(CheckCode::GatewayMultiMatch, self.path()))
            .with_reference(other.owner.clone())
    }
}

/// Anchored pattern where `*` spans any characters and dots stay literal.
fn wildcard_pattern(hostname: &str) -> Option<Regex> {
    let body = hostname
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{}$", body)).ok()
}

/// `port.number` as an integer; floats truncate, numeric strings parse, anything else is 0.
fn port_number(server: &Value) -> i64 {
    match server.pointer("/port/number") {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64))
            .unwrap_or(0),
        Some(Value::String(number)) => number.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Every (server, host) binding a gateway declares, in declaration order.
pub fn host_bindings(gateway: &MeshObject) -> Vec<HostBinding> {
    let Some(servers) = gateway.spec_value("/servers").and_then(Value::as_array) else {
        return Vec::new();
    };

    let owner = ValidationKey::for_object(gateway);
    let mut bindings = Vec::new();
    for (server_index, server) in servers.iter().enumerate() {
        if !server.is_object() {
            continue;
        }
        let port = port_number(server);
        // Host indexes count string entries only
        let hostnames = string_entries(server.get("hosts")).into_iter().map(|(_, hostname)| hostname);
        for (host_index, hostname) in hostnames.enumerate() {
            bindings.push(HostBinding::new(owner.clone(), port, hostname, server_index, host_index));
        }
    }
    bindings
}

/// Detects gateways exposing the same host and port on the same ingress.
pub struct MultiMatchChecker<'a> {
    gateways_per_namespace: Vec<Vec<&'a MeshObject>>,
}

impl<'a> MultiMatchChecker<'a> {
    /// Grouping only drives iteration order; conflicts are found across all groups.
    pub fn new(gateways_per_namespace: Vec<Vec<&'a MeshObject>>) -> Self {
        Self {
            gateways_per_namespace,
        }
    }
}

impl GroupChecker for MultiMatchChecker<'_> {
    fn check(&self) -> ValidationGraph {
        let mut validations = ValidationGraph::new();
        let mut existing: HashMap<String, Vec<HostBinding>> = HashMap::new();

        for gateway in self.gateways_per_namespace.iter().flatten() {
            let selector = canonical_selector(gateway.spec_value("/selector"));
            let seen = existing.entry(selector).or_default();

            for binding in host_bindings(gateway) {
                for previous in seen.iter().filter(|previous| previous.overlaps(&binding)) {
                    debug!(
                        gateway = %binding.owner,
                        conflicts_with = %previous.owner,
                        host = %binding.hostname,
                        port = binding.port,
                        "Gateway host overlaps an existing binding"
                    );
                    validations.merge_entry(binding.conflict_entry(previous));
                    validations.merge_entry(previous.conflict_entry(&binding));
                }
                seen.push(binding);
            }
        }

        validations
    }
}
