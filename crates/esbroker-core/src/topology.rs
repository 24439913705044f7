//! Topology resolver: plan → concrete cluster shape.
//!
//! Pure and deterministic: the same plan always resolves to the same
//! topology. The three creation shapes are mutually exclusive and selected
//! solely from the plan tier.

use serde::{Deserialize, Serialize};

use crate::plans::{Plan, PlanTier};

/// Which form of creation request the provider receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationShape {
    /// One data node, no encryption.
    Standard,
    /// One data node with encryption at rest.
    Encrypted,
    /// Dedicated masters, several data nodes, zone aware, encrypted.
    DedicatedMaster,
}

impl CreationShape {
    pub fn for_tier(tier: PlanTier) -> Self {
        match tier {
            PlanTier::Base => CreationShape::Standard,
            PlanTier::Encrypted => CreationShape::Encrypted,
            PlanTier::Premium => CreationShape::DedicatedMaster,
        }
    }
}

/// Dedicated master node group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedicatedMaster {
    pub instance_type: String,
    pub count: u32,
}

/// Concrete resource shape derived from a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub shape: CreationShape,
    pub instance_type: String,
    pub instance_count: u32,
    pub dedicated_master: Option<DedicatedMaster>,
    pub volume_size_gb: u32,
    pub volume_type: String,
    pub encryption_at_rest: bool,
    pub zone_awareness: bool,
}

/// Resolve a validated plan into its topology.
pub fn resolve(plan: &Plan) -> Topology {
    let shape = CreationShape::for_tier(plan.tier);
    let (instance_count, dedicated_master) = match shape {
        CreationShape::Standard | CreationShape::Encrypted => (1, None),
        CreationShape::DedicatedMaster => (
            plan.data_nodes,
            Some(DedicatedMaster {
                instance_type: plan
                    .master_instance_type
                    .clone()
                    .unwrap_or_else(|| plan.instance_type.clone()),
                count: plan.master_count,
            }),
        ),
    };

    Topology {
        shape,
        instance_type: plan.instance_type.clone(),
        instance_count,
        dedicated_master,
        volume_size_gb: plan.volume_size_gb,
        volume_type: plan.volume_type.clone(),
        encryption_at_rest: shape != CreationShape::Standard,
        zone_awareness: shape == CreationShape::DedicatedMaster,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::PlanCatalog;

    fn resolve_builtin(id: &str) -> Topology {
        let catalog = PlanCatalog::builtin();
        resolve(catalog.get(id).unwrap())
    }

    #[test]
    fn test_every_builtin_plan_has_storage() {
        for plan in PlanCatalog::builtin().iter() {
            let topology = resolve(plan);
            assert!(topology.volume_size_gb > 0, "{} has no storage", plan.id);
            assert_eq!(topology.shape, CreationShape::for_tier(plan.tier));
        }
    }

    #[test]
    fn test_base_plans_are_single_unencrypted_node() {
        for id in ["micro", "small"] {
            let t = resolve_builtin(id);
            assert_eq!(t.shape, CreationShape::Standard);
            assert_eq!(t.instance_count, 1);
            assert!(t.dedicated_master.is_none());
            assert!(!t.encryption_at_rest);
            assert!(!t.zone_awareness);
        }
    }

    #[test]
    fn test_mid_plans_are_encrypted_single_node() {
        for id in ["medium", "large"] {
            let t = resolve_builtin(id);
            assert_eq!(t.shape, CreationShape::Encrypted);
            assert_eq!(t.instance_count, 1);
            assert!(t.dedicated_master.is_none());
            assert!(t.encryption_at_rest);
            assert!(!t.zone_awareness);
        }
    }

    #[test]
    fn test_premium_has_dedicated_masters() {
        let t = resolve_builtin("premium-0");
        assert_eq!(t.shape, CreationShape::DedicatedMaster);
        assert_eq!(t.instance_count, 4);
        assert_eq!(
            t.dedicated_master,
            Some(DedicatedMaster {
                instance_type: "m4.large.elasticsearch".to_string(),
                count: 3,
            })
        );
        assert!(t.encryption_at_rest);
        assert!(t.zone_awareness);
        assert_eq!(t.volume_size_gb, 100);
    }

    #[test]
    fn test_micro_sizing() {
        let t = resolve_builtin("micro");
        assert_eq!(t.volume_size_gb, 10);
        assert_eq!(t.volume_type, "gp2");
        assert_eq!(t.instance_type, "t2.small.elasticsearch");
    }

    #[test]
    fn test_resolve_is_deterministic() {
        assert_eq!(resolve_builtin("large"), resolve_builtin("large"));
    }
}
