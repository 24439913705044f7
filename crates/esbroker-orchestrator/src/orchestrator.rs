//! Orchestrator: the provisioning state machine.
//!
//! ```text
//! Validating → Resolving → Creating → Tagging → Persisting → Done
//!      └───────────┴──────────┴──────────┴───────────┴──→ Failed
//! ```
//!
//! Failures after the create call leave the cluster running without a
//! ledger row. Nothing is rolled back; those cases are logged as orphans so
//! an operator can reconcile them.

use std::collections::BTreeMap;
use std::sync::Arc;

use esbroker_core::{BrokerConfig, NameGenerator, PlanCatalog, Topology, resolve};
use esbroker_gateway::{ClusterGateway, GatewayError};
use esbroker_ledger::{LedgerStore, NewLedgerRow};
use tracing::{debug, error, info, warn};

use crate::error::{BrokerError, BrokerResult, ProvisionStage};
use crate::request::create_request;
use crate::types::{ClusterUrls, ProvisionRequest, Provisioned, TagRequest};

/// Tag key carrying the caller's billing code.
pub const BILLING_TAG: &str = "billingcode";

/// Coordinates the gateway and the ledger for every broker operation.
///
/// Holds no per-request state; one instance is shared by all handlers.
pub struct Orchestrator {
    config: Arc<BrokerConfig>,
    catalog: PlanCatalog,
    names: NameGenerator,
    gateway: Arc<dyn ClusterGateway>,
    ledger: Arc<dyn LedgerStore>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(
        config: Arc<BrokerConfig>,
        catalog: PlanCatalog,
        gateway: Arc<dyn ClusterGateway>,
        ledger: Arc<dyn LedgerStore>,
    ) -> Self {
        let names = NameGenerator::new(config.name_prefix.clone());
        Self {
            config,
            catalog,
            names,
            gateway,
            ledger,
        }
    }

    /// Plan id → description.
    pub fn plans(&self) -> BTreeMap<String, String> {
        self.catalog.descriptions()
    }

    /// Create a cluster for `request.plan`, tag it, and record it.
    pub async fn provision(&self, request: ProvisionRequest) -> BrokerResult<Provisioned> {
        let plan_id = request.plan.as_str();
        debug!(plan = %plan_id, stage = %ProvisionStage::Validating, "provision requested");
        let Some(plan) = self.catalog.get(plan_id) else {
            warn!(plan = %plan_id, "unknown plan");
            return Err(BrokerError::InvalidPlan(plan_id.to_string()));
        };

        debug!(plan = %plan_id, stage = %ProvisionStage::Resolving, "resolving topology");
        let topology = resolve(plan);

        let name = self.create(plan_id, &topology).await?;

        debug!(%name, plan = %plan_id, stage = %ProvisionStage::Tagging, "tagging cluster");
        let arn = self.config.domain_arn(&name);
        if let Err(e) = self
            .gateway
            .add_tag(&arn, BILLING_TAG, &request.billingcode)
            .await
        {
            error!(%name, plan = %plan_id, error = %e, "cluster created but not tagged; orphaned until reconciled");
            return Err(BrokerError::at(ProvisionStage::Tagging, e));
        }

        debug!(%name, plan = %plan_id, stage = %ProvisionStage::Persisting, "recording cluster");
        if let Err(e) = self.ledger.insert(&NewLedgerRow::claimed(&name, plan_id)).await {
            error!(%name, plan = %plan_id, error = %e, "cluster created but not recorded; orphaned until reconciled");
            return Err(BrokerError::at(ProvisionStage::Persisting, e));
        }

        info!(%name, plan = %plan_id, "cluster provisioned");
        Ok(Provisioned { name })
    }

    /// Generate a name and ask the provider to create the cluster.
    ///
    /// A name the provider already knows is regenerated once; nothing was
    /// created in that case. A timeout or transport failure leaves the outcome
    /// unknown: the provider may have created the cluster anyway.
    async fn create(&self, plan_id: &str, topology: &Topology) -> BrokerResult<String> {
        let mut regenerated = false;
        loop {
            let name = self
                .names
                .generate()
                .map_err(|e| BrokerError::at(ProvisionStage::Creating, e))?;
            debug!(%name, plan = %plan_id, stage = %ProvisionStage::Creating, shape = ?topology.shape, "creating cluster");

            let request = create_request(&self.config, &name, topology);
            match self.gateway.create_cluster(&request).await {
                Ok(()) => return Ok(name),
                Err(GatewayError::AlreadyExists(message)) if !regenerated => {
                    warn!(%name, %message, "generated name already taken, regenerating");
                    regenerated = true;
                }
                Err(e @ (GatewayError::Timeout(_) | GatewayError::Transport(_))) => {
                    error!(%name, plan = %plan_id, error = %e, "cluster creation outcome unknown; possibly orphaned until reconciled");
                    return Err(BrokerError::at(
                        ProvisionStage::Creating,
                        format!("outcome unknown for cluster {name}: {e}"),
                    ));
                }
                Err(e) => {
                    error!(%name, plan = %plan_id, error = %e, "cluster creation failed");
                    return Err(BrokerError::at(ProvisionStage::Creating, e));
                }
            }
        }
    }

    /// Delete the cluster, then its ledger row.
    ///
    /// The ledger is only touched once the provider has accepted the delete,
    /// or reports the cluster gone after a retried attempt.
    pub async fn deprovision(&self, name: &str) -> BrokerResult<()> {
        if let Err(e) = self.gateway.delete_cluster(name).await {
            warn!(%name, error = %e, "provider rejected delete; ledger untouched");
            return Err(BrokerError::DeleteFailed(e.to_string()));
        }

        match self.ledger.delete(name).await {
            Ok(true) => {}
            Ok(false) => warn!(%name, "deleted cluster had no ledger row"),
            Err(e) => {
                error!(%name, error = %e, "cluster deleted but ledger row kept");
                return Err(BrokerError::DeleteFailed(e.to_string()));
            }
        }

        info!(%name, "cluster deprovisioned");
        Ok(())
    }

    /// Live lookup of the cluster's URLs.
    pub async fn status(&self, name: &str) -> BrokerResult<ClusterUrls> {
        let description = self
            .gateway
            .describe_cluster(name)
            .await
            .map_err(|e| BrokerError::StatusFailed(e.to_string()))?;

        if description.deleted {
            debug!(%name, "cluster is being deleted");
            return Err(BrokerError::StatusFailed(format!("cluster {name} is being deleted")));
        }

        match description.vpc_endpoint {
            Some(endpoint) => Ok(ClusterUrls::from_endpoint(&endpoint)),
            None => {
                debug!(%name, processing = description.processing, "no endpoint published yet");
                Err(BrokerError::NotAvailable(name.to_string()))
            }
        }
    }

    /// Attach a caller-supplied tag to an existing cluster.
    pub async fn tag(&self, request: TagRequest) -> BrokerResult<()> {
        let arn = self.config.domain_arn(&request.resource);
        self.gateway
            .add_tag(&arn, &request.name, &request.value)
            .await
            .map_err(|e| {
                warn!(resource = %request.resource, key = %request.name, error = %e, "tagging failed");
                BrokerError::TagFailed(e.to_string())
            })?;
        info!(resource = %request.resource, key = %request.name, "tag added");
        Ok(())
    }
}
