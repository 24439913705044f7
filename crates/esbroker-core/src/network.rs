//! Subnet placement policy.

use serde::{Deserialize, Serialize};

use crate::config::NetworkConfig;
use crate::topology::CreationShape;

/// Subnets and security groups handed to the provider on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcPlacement {
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
}

/// Choose the network placement for a creation shape.
///
/// Dedicated-master clusters span every configured subnet. Single-node
/// shapes skip the first subnet when `reserve_first_subnet` is set, unless
/// it is the only one configured.
pub fn placement(shape: CreationShape, network: &NetworkConfig) -> VpcPlacement {
    let subnets = &network.subnet_ids;
    let subnet_ids = match shape {
        CreationShape::DedicatedMaster => subnets.clone(),
        CreationShape::Standard | CreationShape::Encrypted
            if network.reserve_first_subnet && subnets.len() > 1 =>
        {
            subnets[1..].to_vec()
        }
        CreationShape::Standard | CreationShape::Encrypted => subnets.clone(),
    };

    VpcPlacement {
        subnet_ids,
        security_group_ids: vec![network.security_group_id.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network(subnets: &[&str], reserve: bool) -> NetworkConfig {
        NetworkConfig {
            subnet_ids: subnets.iter().map(|s| s.to_string()).collect(),
            security_group_id: "sg-1".to_string(),
            reserve_first_subnet: reserve,
        }
    }

    #[test]
    fn test_single_node_skips_first_subnet() {
        let net = network(&["subnet-a", "subnet-b", "subnet-c"], true);
        for shape in [CreationShape::Standard, CreationShape::Encrypted] {
            let p = placement(shape, &net);
            assert_eq!(p.subnet_ids, vec!["subnet-b", "subnet-c"]);
            assert_eq!(p.security_group_ids, vec!["sg-1"]);
        }
    }

    #[test]
    fn test_dedicated_master_uses_all_subnets() {
        let net = network(&["subnet-a", "subnet-b", "subnet-c"], true);
        let p = placement(CreationShape::DedicatedMaster, &net);
        assert_eq!(p.subnet_ids, vec!["subnet-a", "subnet-b", "subnet-c"]);
    }

    #[test]
    fn test_single_subnet_is_never_dropped() {
        let net = network(&["subnet-a"], true);
        let p = placement(CreationShape::Standard, &net);
        assert_eq!(p.subnet_ids, vec!["subnet-a"]);
    }

    #[test]
    fn test_reservation_can_be_disabled() {
        let net = network(&["subnet-a", "subnet-b"], false);
        let p = placement(CreationShape::Encrypted, &net);
        assert_eq!(p.subnet_ids, vec!["subnet-a", "subnet-b"]);
    }
}
