//! Request and response types of the Elasticsearch Service configuration API.
//!
//! Field names serialize to the provider's PascalCase JSON.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Body of `POST /2015-01-01/es/domain`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateClusterRequest {
    pub domain_name: String,
    pub elasticsearch_version: String,
    /// IAM policy document, as a JSON string.
    pub access_policies: String,
    #[serde(rename = "EBSOptions")]
    pub ebs_options: EbsOptions,
    pub elasticsearch_cluster_config: ClusterConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_at_rest_options: Option<EncryptionAtRestOptions>,
    #[serde(rename = "VPCOptions")]
    pub vpc_options: VpcOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EbsOptions {
    #[serde(rename = "EBSEnabled")]
    pub ebs_enabled: bool,
    pub volume_size: u32,
    pub volume_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterConfig {
    pub dedicated_master_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedicated_master_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedicated_master_type: Option<String>,
    pub instance_count: u32,
    pub instance_type: String,
    pub zone_awareness_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EncryptionAtRestOptions {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcOptions {
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
}

/// Body of `POST /2015-01-01/tags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddTagsRequest {
    #[serde(rename = "ARN")]
    pub arn: String,
    pub tag_list: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// Response of `GET /2015-01-01/es/domain/{name}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DescribeDomainResponse {
    pub domain_status: DomainStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DomainStatus {
    pub domain_name: String,
    #[serde(default)]
    pub endpoints: Option<HashMap<String, String>>,
    #[serde(default)]
    pub processing: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// What the broker needs from a live cluster description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterDescription {
    pub name: String,
    /// Host name of the VPC endpoint, once the provider has assigned one.
    pub vpc_endpoint: Option<String>,
    /// A configuration change (including initial creation) is in progress.
    pub processing: bool,
    /// Deletion has been requested.
    pub deleted: bool,
}

impl From<DomainStatus> for ClusterDescription {
    fn from(status: DomainStatus) -> Self {
        let vpc_endpoint = status
            .endpoints
            .and_then(|mut endpoints| endpoints.remove("vpc"))
            .filter(|e| !e.is_empty());
        Self {
            name: status.domain_name,
            vpc_endpoint,
            processing: status.processing,
            deleted: status.deleted,
        }
    }
}
