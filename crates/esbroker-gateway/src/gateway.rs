//! The gateway interface consumed by the orchestrator.

use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::types::{ClusterDescription, CreateClusterRequest};

/// Thin interface to the managed-cluster provider.
///
/// Implementations are shared across request tasks behind an `Arc`.
#[async_trait]
pub trait ClusterGateway: Send + Sync {
    /// Request creation of a cluster. Creation completes asynchronously.
    async fn create_cluster(&self, request: &CreateClusterRequest) -> GatewayResult<()>;

    /// Request deletion of the named cluster.
    async fn delete_cluster(&self, name: &str) -> GatewayResult<()>;

    /// Fetch the live description of the named cluster.
    async fn describe_cluster(&self, name: &str) -> GatewayResult<ClusterDescription>;

    /// Attach a tag to the resource identified by `arn`.
    async fn add_tag(&self, arn: &str, key: &str, value: &str) -> GatewayResult<()>;
}
