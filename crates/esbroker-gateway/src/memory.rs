//! InMemoryGateway: an in-process stand-in for the provider.
//!
//! Keeps a map of created clusters, records the most recent calls in order,
//! and can be told to fail the next call of a given kind.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::ClusterGateway;
use crate::types::{ClusterDescription, CreateClusterRequest};

/// Calls kept in the log; older ones are dropped first.
pub const MAX_RECORDED_CALLS: usize = 1024;

/// A recorded gateway call.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Create(CreateClusterRequest),
    Delete(String),
    Describe(String),
    AddTag {
        arn: String,
        key: String,
        value: String,
    },
}

/// Gateway operations, for targeting injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Delete,
    Describe,
    AddTag,
}

#[derive(Debug, Clone)]
struct FakeCluster {
    request: CreateClusterRequest,
    endpoint: Option<String>,
    deleted: bool,
    tags: BTreeMap<String, String>,
}

#[derive(Default)]
struct Inner {
    clusters: HashMap<String, FakeCluster>,
    calls: VecDeque<GatewayCall>,
    failures: HashMap<Operation, Vec<GatewayError>>,
}

/// Thread-safe fake gateway.
pub struct InMemoryGateway {
    inner: Mutex<Inner>,
    auto_publish: bool,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    /// Clusters stay without an endpoint until [`publish_endpoint`] is called.
    ///
    /// [`publish_endpoint`]: InMemoryGateway::publish_endpoint
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            auto_publish: false,
        }
    }

    /// Clusters receive an endpoint as soon as they are created.
    pub fn ready() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            auto_publish: true,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panicking test thread must not wedge the others.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Assign the VPC endpoint of an existing cluster. Returns it, or `None`
    /// if no such cluster exists.
    pub fn publish_endpoint(&self, name: &str) -> Option<String> {
        let mut inner = self.lock();
        let cluster = inner.clusters.get_mut(name)?;
        let endpoint = endpoint_for(name);
        cluster.endpoint = Some(endpoint.clone());
        Some(endpoint)
    }

    /// Make the next call of `operation` fail with `error`. Queued failures
    /// are consumed in order.
    pub fn fail_next(&self, operation: Operation, error: GatewayError) {
        self.lock().failures.entry(operation).or_default().push(error);
    }

    /// The last [`MAX_RECORDED_CALLS`] calls received, oldest first.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.iter().cloned().collect()
    }

    /// Names of clusters that exist and have not been deleted.
    pub fn clusters(&self) -> Vec<String> {
        let inner = self.lock();
        let mut names: Vec<String> = inner
            .clusters
            .iter()
            .filter(|(_, c)| !c.deleted)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// The creation request a cluster was made from.
    pub fn request_for(&self, name: &str) -> Option<CreateClusterRequest> {
        self.lock().clusters.get(name).map(|c| c.request.clone())
    }

    /// Tags attached to a cluster.
    pub fn tags_for(&self, name: &str) -> BTreeMap<String, String> {
        self.lock()
            .clusters
            .get(name)
            .map(|c| c.tags.clone())
            .unwrap_or_default()
    }

    fn record(inner: &mut Inner, call: GatewayCall, operation: Operation) -> GatewayResult<()> {
        if inner.calls.len() == MAX_RECORDED_CALLS {
            inner.calls.pop_front();
        }
        inner.calls.push_back(call);
        match inner.failures.get_mut(&operation) {
            Some(queue) if !queue.is_empty() => Err(queue.remove(0)),
            _ => Ok(()),
        }
    }
}

fn endpoint_for(name: &str) -> String {
    format!("vpc-{name}.local.es.amazonaws.com")
}

fn not_found(name: &str) -> GatewayError {
    GatewayError::NotFound(format!("Domain not found: {name}"))
}

#[async_trait]
impl ClusterGateway for InMemoryGateway {
    async fn create_cluster(&self, request: &CreateClusterRequest) -> GatewayResult<()> {
        let mut inner = self.lock();
        Self::record(&mut inner, GatewayCall::Create(request.clone()), Operation::Create)?;

        let name = &request.domain_name;
        if inner.clusters.contains_key(name) {
            return Err(GatewayError::AlreadyExists(format!(
                "Domain {name} already exists"
            )));
        }
        let endpoint = self.auto_publish.then(|| endpoint_for(name));
        inner.clusters.insert(
            name.clone(),
            FakeCluster {
                request: request.clone(),
                endpoint,
                deleted: false,
                tags: BTreeMap::new(),
            },
        );
        debug!(%name, "fake cluster created");
        Ok(())
    }

    async fn delete_cluster(&self, name: &str) -> GatewayResult<()> {
        let mut inner = self.lock();
        Self::record(&mut inner, GatewayCall::Delete(name.to_string()), Operation::Delete)?;

        match inner.clusters.get_mut(name) {
            Some(cluster) if !cluster.deleted => {
                cluster.deleted = true;
                debug!(%name, "fake cluster deleted");
                Ok(())
            }
            _ => Err(not_found(name)),
        }
    }

    async fn describe_cluster(&self, name: &str) -> GatewayResult<ClusterDescription> {
        let mut inner = self.lock();
        Self::record(&mut inner, GatewayCall::Describe(name.to_string()), Operation::Describe)?;

        let cluster = inner.clusters.get(name).ok_or_else(|| not_found(name))?;
        Ok(ClusterDescription {
            name: name.to_string(),
            vpc_endpoint: cluster.endpoint.clone(),
            processing: cluster.endpoint.is_none(),
            deleted: cluster.deleted,
        })
    }

    async fn add_tag(&self, arn: &str, key: &str, value: &str) -> GatewayResult<()> {
        let mut inner = self.lock();
        let call = GatewayCall::AddTag {
            arn: arn.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        };
        Self::record(&mut inner, call, Operation::AddTag)?;

        let name = arn.rsplit_once("domain/").map(|(_, n)| n).unwrap_or(arn);
        match inner.clusters.get_mut(name) {
            Some(cluster) if !cluster.deleted => {
                cluster.tags.insert(key.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(not_found(name)),
        }
    }
}
