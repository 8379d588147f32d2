//! Common builders for integration tests.

#![allow(dead_code)]

use meshlint::{MeshObject, ObjectKind};
use serde_json::{json, Value};

pub fn gateway(name: &str, namespace: &str, selector: Value, servers: &[(i64, &[&str])]) -> MeshObject {
    let servers: Vec<Value> = servers
        .iter()
        .map(|(port, hosts)| {
            json!({"port": {"number": port, "name": "http", "protocol": "HTTP"}, "hosts": hosts})
        })
        .collect();
    MeshObject::new(
        ObjectKind::Gateway,
        name,
        namespace,
        json!({"selector": selector, "servers": servers}),
    )
}

pub fn virtual_service(name: &str, namespace: &str, hosts: &[&str], gateways: &[&str]) -> MeshObject {
    let mut spec = json!({"hosts": hosts});
    if !gateways.is_empty() {
        spec["gateways"] = json!(gateways);
    }
    MeshObject::new(ObjectKind::VirtualService, name, namespace, spec)
}

pub fn destination_rule(name: &str, namespace: &str, host: &str, mode: &str) -> MeshObject {
    MeshObject::new(
        ObjectKind::DestinationRule,
        name,
        namespace,
        json!({"host": host, "trafficPolicy": {"tls": {"mode": mode}}}),
    )
}

pub fn peer_authentication(name: &str, namespace: &str, mode: &str) -> MeshObject {
    MeshObject::new(
        ObjectKind::PeerAuthentication,
        name,
        namespace,
        json!({"mtls": {"mode": mode}}),
    )
}

/// A bookinfo-style mesh touching every checker.
pub const BOOKINFO_SNAPSHOT: &str = r#"
kind: Gateway
metadata:
  name: bookinfo-gateway
  namespace: bookinfo
spec:
  selector:
    istio: ingressgateway
  servers:
    - port: {number: 80, name: http, protocol: HTTP}
      hosts: ["*.bookinfo.com"]
---
kind: Gateway
metadata:
  name: productpage-gateway
  namespace: bookinfo
spec:
  selector:
    istio: ingressgateway
  servers:
    - port: {number: 80, name: http, protocol: HTTP}
      hosts: ["productpage.bookinfo.com"]
---
kind: VirtualService
metadata:
  name: reviews
  namespace: bookinfo
spec:
  hosts: ["reviews"]
---
kind: VirtualService
metadata:
  name: reviews-canary
  namespace: bookinfo
spec:
  hosts: ["reviews.bookinfo.svc.cluster.local"]
---
kind: DestinationRule
metadata:
  name: disable-mtls
  namespace: bookinfo
spec:
  host: "*.bookinfo.svc.cluster.local"
  trafficPolicy:
    tls:
      mode: DISABLE
---
kind: PeerAuthentication
metadata:
  name: default
  namespace: istio-system
spec:
  mtls:
    mode: STRICT
---
kind: Sidecar
metadata:
  name: default
  namespace: bookinfo
spec: {}
"#;
