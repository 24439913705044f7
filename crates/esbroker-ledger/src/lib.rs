//! esbroker-ledger: the broker's record of which clusters it believes exist.
//!
//! One row per live instance: `(name, plan, claimed, make_date)`. A row is
//! written right after a cluster is created and tagged, and removed right
//! after the provider accepts its deletion.
//!
//! # Backends
//!
//! - [`PgLedger`]: the `provision` table in PostgreSQL (via sqlx), the
//!   production backend.
//! - [`EmbeddedLedger`]: a redb file (or in-memory database) with the same
//!   semantics, used for single-host installs and tests.
//!
//! Both are reached through the object-safe [`LedgerStore`] trait and are
//! `Send + Sync`, so one handle is shared by every request task.

pub mod embedded;
pub mod error;
pub mod ledger;
pub mod postgres;
pub mod tables;
pub mod types;

use std::sync::Arc;

use esbroker_core::LedgerConfig;
use tracing::info;

pub use embedded::EmbeddedLedger;
pub use error::{LedgerError, LedgerResult};
pub use ledger::LedgerStore;
pub use postgres::PgLedger;
pub use types::{CLAIMED, LedgerRow, NewLedgerRow};

/// Open the configured backend and make sure its schema exists.
pub async fn connect(config: &LedgerConfig) -> LedgerResult<Arc<dyn LedgerStore>> {
    let ledger: Arc<dyn LedgerStore> = match config {
        LedgerConfig::Postgres {
            url,
            max_connections,
        } => Arc::new(PgLedger::connect(url, *max_connections).await?),
        LedgerConfig::Embedded { path } => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LedgerError::Open(format!("{}: {e}", parent.display())))?;
            }
            Arc::new(EmbeddedLedger::open(path)?)
        }
    };
    ledger.ensure_schema().await?;
    info!(backend = ledger.backend(), "ledger ready");
    Ok(ledger)
}
