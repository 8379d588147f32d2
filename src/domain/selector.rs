//! Workload-selector canonicalisation.

use serde_json::Value;

/// Render a label selector as a stable `key=value,key=value` string sorted by key.
///
/// An absent, non-map or partially non-string selector canonicalises to the
/// empty string, so all such gateways share one ingress group.
pub fn canonical_selector(selector: Option<&Value>) -> String {
    let Some(labels) = selector.and_then(Value::as_object) else {
        return String::new();
    };

    let mut pairs = Vec::with_capacity(labels.len());
    for (key, value) in labels {
        match value.as_str() {
            Some(value) => pairs.push((key.as_str(), value)),
            None => return String::new(),
        }
    }
    pairs.sort_unstable();

    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_labels_by_key() {
        let selector = json!({"istio": "ingressgateway", "app": "edge"});
        assert_eq!(canonical_selector(Some(&selector)), "app=edge,istio=ingressgateway");
    }

    #[test]
    fn malformed_selectors_are_empty() {
        assert_eq!(canonical_selector(None), "");
        assert_eq!(canonical_selector(Some(&json!("app=edge"))), "");
        assert_eq!(canonical_selector(Some(&json!({"app": 3}))), "");
        assert_eq!(canonical_selector(Some(&json!({}))), "");
    }
}
