//! esbroker-gateway: the external managed-cluster provider.
//!
//! The orchestrator only ever talks to [`ClusterGateway`]. Implementations:
//!
//! - [`AwsGateway`]: Elasticsearch Service configuration API (`2015-01-01`),
//!   JSON over HTTPS, requests signed with Signature Version 4.
//! - [`InMemoryGateway`]: in-process fake that records recent calls; used by
//!   tests and by local development (`provider.backend = "memory"`).
//! - [`ResilientGateway`]: wraps another gateway with a per-call timeout and
//!   bounded retries for describe and delete.
//!
//! # Retry policy
//!
//! ```text
//! create_cluster    timeout only (a blind retry could create twice)
//! add_tag           timeout only
//! describe_cluster  timeout + exponential backoff on transient errors
//! delete_cluster    timeout + exponential backoff on transient errors;
//!                   NotFound on a retry counts as deleted
//! ```

pub mod aws;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod retry;
pub mod sigv4;
pub mod types;

use std::sync::Arc;

use esbroker_core::{BrokerConfig, ProviderBackend};
use tracing::info;

pub use aws::AwsGateway;
pub use error::{GatewayError, GatewayResult};
pub use gateway::ClusterGateway;
pub use memory::{GatewayCall, InMemoryGateway, Operation};
pub use retry::{ResilientGateway, RetryPolicy};
pub use sigv4::Credentials;
pub use types::*;

/// Build the configured gateway, wrapped in the retry policy.
pub fn build(config: &BrokerConfig) -> GatewayResult<Arc<dyn ClusterGateway>> {
    let inner: Arc<dyn ClusterGateway> = match config.provider.backend {
        ProviderBackend::Aws => Arc::new(AwsGateway::from_config(config)?),
        ProviderBackend::Memory => Arc::new(InMemoryGateway::ready()),
    };
    let policy = RetryPolicy::from_config(&config.provider);
    info!(
        backend = ?config.provider.backend,
        timeout = ?policy.timeout,
        max_attempts = policy.max_attempts,
        "cluster gateway initialized"
    );
    Ok(Arc::new(ResilientGateway::new(inner, policy)))
}
