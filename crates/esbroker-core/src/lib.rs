//! esbroker-core: configuration and pure provisioning logic.
//!
//! Nothing in this crate performs I/O beyond reading the configuration file:
//! the plan catalog, topology resolver, subnet placement policy, and name
//! generator are all deterministic (apart from the random name token) so the
//! orchestrator can be exercised against stub collaborators.

pub mod config;
pub mod error;
pub mod naming;
pub mod network;
pub mod plans;
pub mod topology;

pub use config::{BrokerConfig, LedgerConfig, NetworkConfig, ProviderBackend, ProviderConfig};
pub use error::{ConfigError, ConfigResult, NameError};
pub use naming::NameGenerator;
pub use network::{VpcPlacement, placement};
pub use plans::{Plan, PlanCatalog, PlanTier};
pub use topology::{CreationShape, DedicatedMaster, Topology, resolve};
