//! esbroker-orchestrator: provisioning, deletion, status and tagging.
//!
//! Sequences the calls of one broker operation across the two external
//! collaborators. Per-request errors are returned to the caller as
//! [`BrokerError`]; nothing is retried here (the gateway applies its own
//! retry policy) and partial provisioning is never rolled back.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator
//!   ├── PlanCatalog + resolve()      (esbroker-core, pure)
//!   ├── NameGenerator                (esbroker-core)
//!   ├── Arc<dyn ClusterGateway>      (esbroker-gateway)
//!   └── Arc<dyn LedgerStore>         (esbroker-ledger)
//! ```

pub mod error;
pub mod orchestrator;
pub mod request;
pub mod types;

pub use error::{BrokerError, BrokerResult, ProvisionStage};
pub use orchestrator::{BILLING_TAG, Orchestrator};
pub use request::create_request;
pub use types::{ClusterUrls, ProvisionRequest, Provisioned, TagRequest};
