//! Builds the provider creation request for a resolved topology.

use esbroker_core::{BrokerConfig, Topology, placement};
use esbroker_gateway::{
    ClusterConfig, CreateClusterRequest, EbsOptions, EncryptionAtRestOptions, VpcOptions,
};

pub fn create_request(config: &BrokerConfig, name: &str, topology: &Topology) -> CreateClusterRequest {
    let vpc = placement(topology.shape, &config.network);
    let master = topology.dedicated_master.as_ref();

    CreateClusterRequest {
        domain_name: name.to_string(),
        elasticsearch_version: config.es_version.clone(),
        access_policies: config.access_policy(name),
        ebs_options: EbsOptions {
            ebs_enabled: true,
            volume_size: topology.volume_size_gb,
            volume_type: topology.volume_type.clone(),
        },
        elasticsearch_cluster_config: ClusterConfig {
            dedicated_master_enabled: master.is_some(),
            dedicated_master_count: master.map(|m| m.count),
            dedicated_master_type: master.map(|m| m.instance_type.clone()),
            instance_count: topology.instance_count,
            instance_type: topology.instance_type.clone(),
            zone_awareness_enabled: topology.zone_awareness,
        },
        encryption_at_rest_options: topology.encryption_at_rest.then(|| EncryptionAtRestOptions {
            enabled: true,
            kms_key_id: config.kms_key_id.clone(),
        }),
        vpc_options: VpcOptions {
            subnet_ids: vpc.subnet_ids,
            security_group_ids: vpc.security_group_ids,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esbroker_core::{NetworkConfig, PlanCatalog, resolve};

    fn config() -> BrokerConfig {
        BrokerConfig {
            region: "us-west-2".into(),
            account_id: "123456789012".into(),
            es_version: "6.2".into(),
            name_prefix: "dev-".into(),
            kms_key_id: Some("kms-key".into()),
            network: NetworkConfig {
                subnet_ids: vec!["subnet-a".into(), "subnet-b".into()],
                security_group_id: "sg-1".into(),
                reserve_first_subnet: true,
            },
            ..BrokerConfig::default()
        }
    }

    fn request_for(plan: &str) -> CreateClusterRequest {
        let catalog = PlanCatalog::builtin();
        let topology = resolve(catalog.get(plan).unwrap());
        create_request(&config(), "dev-1234abcd", &topology)
    }

    #[test]
    fn micro_is_standard() {
        let request = request_for("micro");
        assert_eq!(request.domain_name, "dev-1234abcd");
        assert_eq!(request.elasticsearch_version, "6.2");
        assert_eq!(request.ebs_options.volume_size, 10);
        assert_eq!(request.elasticsearch_cluster_config.instance_count, 1);
        assert!(!request.elasticsearch_cluster_config.dedicated_master_enabled);
        assert!(request.encryption_at_rest_options.is_none());
        assert_eq!(request.vpc_options.subnet_ids, vec!["subnet-b".to_string()]);
        assert_eq!(request.vpc_options.security_group_ids, vec!["sg-1".to_string()]);
        assert!(request.access_policies.contains("domain/dev-1234abcd/*"));
    }

    #[test]
    fn medium_is_encrypted_with_configured_key() {
        let request = request_for("medium");
        let encryption = request.encryption_at_rest_options.unwrap();
        assert!(encryption.enabled);
        assert_eq!(encryption.kms_key_id.as_deref(), Some("kms-key"));
        assert_eq!(request.elasticsearch_cluster_config.instance_count, 1);
    }

    #[test]
    fn premium_uses_dedicated_masters_in_every_subnet() {
        let request = request_for("premium-0");
        let cluster = &request.elasticsearch_cluster_config;
        assert!(cluster.dedicated_master_enabled);
        assert_eq!(cluster.dedicated_master_count, Some(3));
        assert_eq!(cluster.dedicated_master_type.as_deref(), Some("m4.large.elasticsearch"));
        assert_eq!(cluster.instance_count, 4);
        assert!(cluster.zone_awareness_enabled);
        assert_eq!(request.ebs_options.volume_size, 100);
        assert!(request.encryption_at_rest_options.is_some());
        assert_eq!(request.vpc_options.subnet_ids.len(), 2);
    }
}
