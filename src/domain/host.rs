//! Host-string resolution for routing rules.
//!
//! Expands Kubernetes-style short names (`reviews`, `reviews.bookinfo`,
//! `reviews.bookinfo.svc.cluster.local`) into cluster, namespace and service.

use serde::Serialize;

/// A routing-rule host after short-name expansion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedHost {
    pub cluster: String,
    pub namespace: String,
    pub service: String,
    /// The input was already fully qualified and must not be defaulted.
    pub complete_input: bool,
}

/// Resolves host strings declared on routing rules.
pub trait HostResolver {
    /// Returns `None` when the host cannot be parsed; callers skip such hosts.
    fn resolve(
        &self,
        host: &str,
        namespace: &str,
        cluster: &str,
        known_namespaces: &[String],
    ) -> Option<ResolvedHost>;
}

/// Resolver following Kubernetes DNS conventions under one identity domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubernetesHostResolver {
    identity_domain: String,
}

impl KubernetesHostResolver {
    pub fn new<S: Into<String>>(identity_domain: S) -> Self {
        Self {
            identity_domain: identity_domain.into(),
        }
    }
}

impl HostResolver for KubernetesHostResolver {
    fn resolve(
        &self,
        host: &str,
        namespace: &str,
        cluster: &str,
        known_namespaces: &[String],
    ) -> Option<ResolvedHost> {
        let parts: Vec<&str> = host.split('.').collect();
        if parts.iter().any(|part| part.is_empty()) {
            return None;
        }

        let resolved = |service: &str, namespace: &str, complete_input: bool| ResolvedHost {
            cluster: cluster.to_string(),
            namespace: namespace.to_string(),
            service: service.to_string(),
            complete_input,
        };

        match parts.as_slice() {
            [service] => Some(resolved(*service, namespace, false)),
            [service, ns] if known_namespaces.iter().any(|known| known == ns) => {
                Some(resolved(*service, *ns, true))
            }
            [service, ns, rest @ ..] if !rest.is_empty() && rest.join(".") == self.identity_domain => {
                Some(resolved(*service, *ns, true))
            }
            // ServiceEntry-style or external host: keep it whole.
            _ => Some(resolved(host, namespace, false)),
        }
    }
}
