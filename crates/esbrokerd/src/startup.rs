//! Startup: assembles the orchestrator from configuration.
//!
//! Any failure here is fatal: the process logs it and exits non-zero.

use std::path::Path;
use std::sync::Arc;

use esbroker_core::{BrokerConfig, ConfigError};
use esbroker_gateway::GatewayError;
use esbroker_ledger::LedgerError;
use esbroker_orchestrator::Orchestrator;
use thiserror::Error;
use tracing::info;

/// Unrecoverable startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("ledger unavailable: {0}")]
    Ledger(#[from] LedgerError),

    #[error("provider client: {0}")]
    Provider(#[from] GatewayError),
}

/// Load and validate the configuration, applying environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<BrokerConfig, StartupError> {
    let config = BrokerConfig::load(path)?;
    info!(
        region = %config.region,
        es_version = %config.es_version,
        subnets = config.network.subnet_ids.len(),
        "configuration loaded"
    );
    Ok(config)
}

/// Connect the ledger, build the gateway, and wire the orchestrator.
pub async fn assemble(config: BrokerConfig) -> Result<Arc<Orchestrator>, StartupError> {
    let catalog = config.catalog()?;
    info!(plans = catalog.iter().count(), "plan catalog ready");

    let ledger = esbroker_ledger::connect(config.ledger_config()?).await?;
    let gateway = esbroker_gateway::build(&config)?;

    Ok(Arc::new(Orchestrator::new(
        Arc::new(config),
        catalog,
        gateway,
        ledger,
    )))
}
