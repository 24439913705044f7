//! Request and result types of the orchestrator operations.

use serde::{Deserialize, Serialize};

/// Body of a provision request.
///
/// Both fields default to empty: a missing plan is reported as an invalid
/// plan rather than a binding error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub billingcode: String,
}

impl ProvisionRequest {
    pub fn new(plan: impl Into<String>, billingcode: impl Into<String>) -> Self {
        Self {
            plan: plan.into(),
            billingcode: billingcode.into(),
        }
    }
}

/// A provisioned cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub name: String,
}

/// Body of a tag request. `resource` is the cluster name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRequest {
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Connection URLs of a ready cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterUrls {
    #[serde(rename = "ES_URL")]
    pub es_url: String,
    #[serde(rename = "KIBANA_URL")]
    pub kibana_url: String,
}

impl ClusterUrls {
    /// Derive both URLs from the VPC endpoint host name.
    pub fn from_endpoint(endpoint: &str) -> Self {
        let es_url = format!("https://{endpoint}");
        Self {
            kibana_url: format!("{es_url}/_plugin/kibana"),
            es_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_from_endpoint() {
        let urls = ClusterUrls::from_endpoint("vpc-dev-1.us-west-2.es.amazonaws.com");
        assert_eq!(urls.es_url, "https://vpc-dev-1.us-west-2.es.amazonaws.com");
        assert_eq!(
            urls.kibana_url,
            "https://vpc-dev-1.us-west-2.es.amazonaws.com/_plugin/kibana"
        );

        let json = serde_json::to_value(&urls).unwrap();
        assert_eq!(json["ES_URL"], "https://vpc-dev-1.us-west-2.es.amazonaws.com");
        assert!(json.get("KIBANA_URL").is_some());
    }

    #[test]
    fn provision_request_fields_default() {
        let request: ProvisionRequest = serde_json::from_str(r#"{"plan":"micro"}"#).unwrap();
        assert_eq!(request, ProvisionRequest::new("micro", ""));
    }
}
