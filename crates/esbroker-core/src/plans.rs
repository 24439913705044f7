//! Plan catalog: the fixed set of plans a tenant can provision.
//!
//! The catalog is built once at startup, either from the `[[plans]]` tables of
//! the config file or from the built-in defaults, and is immutable afterwards.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Classification that decides which creation-request shape a plan uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    /// Single node, no dedicated master, no encryption at rest.
    Base,
    /// Single node, no dedicated master, encryption at rest.
    Encrypted,
    /// Dedicated masters plus several data nodes across zones, encrypted.
    Premium,
}

/// A named tier and the sizing it maps to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub description: String,
    pub tier: PlanTier,
    /// Instance class of the data nodes.
    pub instance_type: String,
    /// EBS volume size per data node, in GB.
    pub volume_size_gb: u32,
    #[serde(default = "default_volume_type")]
    pub volume_type: String,
    /// Data node count (premium only).
    #[serde(default)]
    pub data_nodes: u32,
    /// Dedicated master instance class (premium only).
    #[serde(default)]
    pub master_instance_type: Option<String>,
    /// Dedicated master count (premium only).
    #[serde(default)]
    pub master_count: u32,
}

fn default_volume_type() -> String {
    "gp2".to_string()
}

impl Plan {
    fn single_node(id: &str, description: &str, tier: PlanTier, instance: &str, volume: u32) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            tier,
            instance_type: instance.to_string(),
            volume_size_gb: volume,
            volume_type: default_volume_type(),
            data_nodes: 0,
            master_instance_type: None,
            master_count: 0,
        }
    }

    fn check(&self) -> ConfigResult<()> {
        let invalid = |reason: &str| ConfigError::Plan {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("plan id must not be empty"));
        }
        if self.instance_type.is_empty() {
            return Err(invalid("instance_type must not be empty"));
        }
        if self.volume_size_gb == 0 {
            return Err(invalid("volume_size_gb must be positive"));
        }
        if self.tier == PlanTier::Premium {
            if self.data_nodes == 0 {
                return Err(invalid("premium plans need data_nodes > 0"));
            }
            if self.master_count == 0 {
                return Err(invalid("premium plans need master_count > 0"));
            }
            if self.master_instance_type.as_deref().is_none_or(str::is_empty) {
                return Err(invalid("premium plans need master_instance_type"));
            }
        }
        Ok(())
    }
}

/// Immutable lookup table from plan id to plan.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: BTreeMap<String, Plan>,
}

impl PlanCatalog {
    /// Build a catalog, rejecting duplicate ids and inconsistent sizing.
    pub fn new(plans: Vec<Plan>) -> ConfigResult<Self> {
        if plans.is_empty() {
            return Err(ConfigError::Missing("plans"));
        }

        let mut seen = HashSet::new();
        let mut table = BTreeMap::new();
        for plan in plans {
            plan.check()?;
            if !seen.insert(plan.id.clone()) {
                return Err(ConfigError::Plan {
                    id: plan.id,
                    reason: "duplicate plan id".to_string(),
                });
            }
            table.insert(plan.id.clone(), plan);
        }
        Ok(Self { plans: table })
    }

    /// The default catalog shipped with the broker.
    pub fn builtin() -> Self {
        let plans = vec![
            Plan::single_node(
                "micro",
                "Micro - 1xCPU - 2 GB RAM - 10 GB Disk",
                PlanTier::Base,
                "t2.small.elasticsearch",
                10,
            ),
            Plan::single_node(
                "small",
                "Small - 2xCPU - 4 GB RAM - 20 GB Disk",
                PlanTier::Base,
                "t2.medium.elasticsearch",
                20,
            ),
            Plan::single_node(
                "medium",
                "Medium - 2xCPU - 8 GB RAM - 40 GB Disk - Encryption at Rest",
                PlanTier::Encrypted,
                "m4.large.elasticsearch",
                40,
            ),
            Plan::single_node(
                "large",
                "Large - 4xCPU - 16 GB RAM - 80 GB Disk - Encryption at Rest",
                PlanTier::Encrypted,
                "m4.xlarge.elasticsearch",
                80,
            ),
            Plan {
                id: "premium-0".to_string(),
                description: "Production - 3 masters - 4 data nodes - multi-AZ - 2xCPU - 8 GB RAM - 100 GB Disk each - Encryption at Rest".to_string(),
                tier: PlanTier::Premium,
                instance_type: "m4.large.elasticsearch".to_string(),
                volume_size_gb: 100,
                volume_type: default_volume_type(),
                data_nodes: 4,
                master_instance_type: Some("m4.large.elasticsearch".to_string()),
                master_count: 3,
            },
        ];

        Self {
            plans: plans.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Look up a plan by id. Ids are case-sensitive.
    pub fn get(&self, id: &str) -> Option<&Plan> {
        self.plans.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.plans.contains_key(id)
    }

    /// Plan id → human-readable description, ordered by id.
    pub fn descriptions(&self) -> BTreeMap<String, String> {
        self.plans
            .values()
            .map(|p| (p.id.clone(), p.description.clone()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plan> {
        self.plans.values()
    }
}
