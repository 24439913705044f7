//! Timeouts and bounded retries around any [`ClusterGateway`].
//!
//! Every call is bounded by `timeout`. Describe and delete calls that fail
//! with a transient error are retried up to `max_attempts` times, waiting
//! `base_backoff`, then double that, up to `max_backoff`.
//!
//! A delete whose earlier attempt timed out or lost its response may already
//! have been applied, so `NotFound` on a retry counts as deleted.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use esbroker_core::ProviderConfig;
use tracing::{debug, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::ClusterGateway;
use crate::types::{ClusterDescription, CreateClusterRequest};

/// Timeout and retry settings for provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_attempts: config.max_attempts.max(1),
            base_backoff: Duration::from_millis(config.retry_backoff_ms),
            ..Self::default()
        }
    }

    /// Delay after the given failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let mut delay = self.base_backoff;
        for _ in 1..attempt {
            delay = (delay * 2).min(self.max_backoff);
        }
        delay.min(self.max_backoff)
    }
}

/// A gateway wrapper that applies a [`RetryPolicy`].
pub struct ResilientGateway {
    inner: Arc<dyn ClusterGateway>,
    policy: RetryPolicy,
}

impl ResilientGateway {
    pub fn new(inner: Arc<dyn ClusterGateway>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn bounded<T, F>(&self, call: F) -> GatewayResult<T>
    where
        F: Future<Output = GatewayResult<T>>,
    {
        match tokio::time::timeout(self.policy.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.policy.timeout)),
        }
    }

    async fn with_retries<T, F, Fut>(&self, operation: &str, name: &str, mut call: F) -> GatewayResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = GatewayResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match self.bounded(call()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(operation, %name, attempt, ?delay, error = %e, "transient provider error, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    debug!(operation, %name, attempt, error = %e, "provider call failed");
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl ClusterGateway for ResilientGateway {
    async fn create_cluster(&self, request: &CreateClusterRequest) -> GatewayResult<()> {
        self.bounded(self.inner.create_cluster(request)).await
    }

    async fn delete_cluster(&self, name: &str) -> GatewayResult<()> {
        let inner = &self.inner;
        let mut attempt = 0u32;
        self.with_retries("delete", name, || {
            attempt += 1;
            let retry = attempt > 1;
            async move {
                match inner.delete_cluster(name).await {
                    Err(GatewayError::NotFound(message)) if retry => {
                        debug!(%name, %message, "cluster already gone on retried delete");
                        Ok(())
                    }
                    result => result,
                }
            }
        })
        .await
    }

    async fn describe_cluster(&self, name: &str) -> GatewayResult<ClusterDescription> {
        self.with_retries("describe", name, || self.inner.describe_cluster(name))
            .await
    }

    async fn add_tag(&self, arn: &str, key: &str, value: &str) -> GatewayResult<()> {
        self.bounded(self.inner.add_tag(arn, key, value)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{GatewayCall, InMemoryGateway, Operation};
    use crate::types::{ClusterConfig, EbsOptions, VpcOptions};

    fn policy() -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(1),
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(300),
        }
    }

    /// Never answers.
    struct Hanging;

    #[async_trait]
    impl ClusterGateway for Hanging {
        async fn create_cluster(&self, _request: &CreateClusterRequest) -> GatewayResult<()> {
            std::future::pending().await
        }
        async fn delete_cluster(&self, _name: &str) -> GatewayResult<()> {
            std::future::pending().await
        }
        async fn describe_cluster(&self, _name: &str) -> GatewayResult<ClusterDescription> {
            std::future::pending().await
        }
        async fn add_tag(&self, _arn: &str, _key: &str, _value: &str) -> GatewayResult<()> {
            std::future::pending().await
        }
    }

    /// Applies deletes on the fake, then never answers.
    struct LostDeleteResponse(Arc<InMemoryGateway>);

    #[async_trait]
    impl ClusterGateway for LostDeleteResponse {
        async fn create_cluster(&self, request: &CreateClusterRequest) -> GatewayResult<()> {
            self.0.create_cluster(request).await
        }
        async fn delete_cluster(&self, name: &str) -> GatewayResult<()> {
            self.0.delete_cluster(name).await?;
            std::future::pending().await
        }
        async fn describe_cluster(&self, name: &str) -> GatewayResult<ClusterDescription> {
            self.0.describe_cluster(name).await
        }
        async fn add_tag(&self, arn: &str, key: &str, value: &str) -> GatewayResult<()> {
            self.0.add_tag(arn, key, value).await
        }
    }

    fn request(name: &str) -> CreateClusterRequest {
        CreateClusterRequest {
            domain_name: name.to_string(),
            elasticsearch_version: "6.2".into(),
            access_policies: "{}".into(),
            ebs_options: EbsOptions {
                ebs_enabled: true,
                volume_size: 10,
                volume_type: "gp2".into(),
            },
            elasticsearch_cluster_config: ClusterConfig {
                dedicated_master_enabled: false,
                dedicated_master_count: None,
                dedicated_master_type: None,
                instance_count: 1,
                instance_type: "t2.small.elasticsearch".into(),
                zone_awareness_enabled: false,
            },
            encryption_at_rest_options: None,
            vpc_options: VpcOptions {
                subnet_ids: vec![],
                security_group_ids: vec![],
            },
        }
    }

    #[test]
    fn backoff_doubles_up_to_max() {
        let policy = policy();
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(300));
        assert_eq!(policy.backoff(10), Duration::from_millis(300));
    }

    #[test]
    fn from_config_never_allows_zero_attempts() {
        let config = ProviderConfig {
            max_attempts: 0,
            ..ProviderConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.timeout, Duration::from_secs(config.timeout_secs));
    }

    #[tokio::test(start_paused = true)]
    async fn describe_retries_transient_errors() {
        let fake = Arc::new(InMemoryGateway::ready());
        fake.fail_next(Operation::Describe, GatewayError::Throttled("slow down".into()));
        fake.fail_next(Operation::Describe, GatewayError::Transport("reset".into()));
        let gateway = ResilientGateway::new(fake.clone(), policy());

        // Retries reach the fake, which reports the cluster as missing.
        let err = gateway.describe_cluster("dev-1").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
        assert_eq!(fake.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_stop_at_max_attempts() {
        let fake = Arc::new(InMemoryGateway::ready());
        for _ in 0..5 {
            fake.fail_next(Operation::Delete, GatewayError::Transport("reset".into()));
        }
        let gateway = ResilientGateway::new(fake.clone(), policy());

        let err = gateway.delete_cluster("dev-1").await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
        assert_eq!(fake.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_not_retried() {
        let fake = Arc::new(InMemoryGateway::ready());
        let gateway = ResilientGateway::new(fake.clone(), policy());

        assert!(gateway.delete_cluster("nope").await.is_err());
        assert_eq!(fake.calls(), vec![GatewayCall::Delete("nope".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn create_is_never_retried() {
        let fake = Arc::new(InMemoryGateway::ready());
        fake.fail_next(Operation::Create, GatewayError::Transport("reset".into()));
        let gateway = ResilientGateway::new(fake.clone(), policy());

        assert!(gateway.create_cluster(&request("dev-1")).await.is_err());
        assert_eq!(fake.calls().len(), 1);
        assert!(fake.clusters().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_calls_time_out() {
        let gateway = ResilientGateway::new(Arc::new(Hanging), policy());

        let err = gateway.add_tag("arn", "k", "v").await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout(d) if d == Duration::from_secs(1)));

        // Describe retries timeouts, then gives up.
        let err = gateway.describe_cluster("dev-1").await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_applied_before_timeout_counts_as_deleted() {
        let fake = Arc::new(InMemoryGateway::ready());
        fake.create_cluster(&request("dev-1")).await.unwrap();
        let gateway = ResilientGateway::new(Arc::new(LostDeleteResponse(fake.clone())), policy());

        gateway.delete_cluster("dev-1").await.unwrap();
        assert!(fake.clusters().is_empty());
        assert_eq!(
            fake.calls()
                .iter()
                .filter(|c| matches!(c, GatewayCall::Delete(_)))
                .count(),
            2
        );
    }
}
