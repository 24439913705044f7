//! EmbeddedLedger: redb-backed ledger.
//!
//! Rows are JSON-serialized into redb's `&[u8]` value column, keyed by
//! instance name. Supports on-disk and in-memory backends (the latter for
//! testing).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::LedgerStore;
use crate::tables::PROVISION;
use crate::types::{LedgerRow, NewLedgerRow};

/// Convert any `Display` error into a `LedgerError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| LedgerError::$variant(e.to_string())
    };
}

/// Thread-safe ledger backed by redb.
#[derive(Clone)]
pub struct EmbeddedLedger {
    db: Arc<Database>,
}

impl EmbeddedLedger {
    /// Open (or create) a persistent ledger at the given path.
    pub fn open(path: &Path) -> LedgerResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let ledger = Self { db: Arc::new(db) };
        ledger.create_table()?;
        debug!(?path, "embedded ledger opened");
        Ok(ledger)
    }

    /// Create an ephemeral in-memory ledger (for testing).
    pub fn open_in_memory() -> LedgerResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let ledger = Self { db: Arc::new(db) };
        ledger.create_table()?;
        debug!("in-memory ledger opened");
        Ok(ledger)
    }

    fn create_table(&self) -> LedgerResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(PROVISION).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn insert_row(&self, row: &NewLedgerRow) -> LedgerResult<()> {
        let stored = LedgerRow {
            name: row.name.clone(),
            plan: row.plan.clone(),
            claimed: row.claimed.clone(),
            make_date: Some(Utc::now().naive_utc()),
        };
        let value = serde_json::to_vec(&stored).map_err(map_err!(Serialize))?;

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(PROVISION).map_err(map_err!(Table))?;
            if table.get(row.name.as_str()).map_err(map_err!(Read))?.is_some() {
                return Err(LedgerError::Duplicate(row.name.clone()));
            }
            table
                .insert(row.name.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(name = %row.name, plan = %row.plan, "ledger row stored");
        Ok(())
    }

    fn delete_row(&self, name: &str) -> LedgerResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(PROVISION).map_err(map_err!(Table))?;
            existed = table.remove(name).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%name, existed, "ledger row deleted");
        Ok(existed)
    }

    fn get_row(&self, name: &str) -> LedgerResult<Option<LedgerRow>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PROVISION).map_err(map_err!(Table))?;
        match table.get(name).map_err(map_err!(Read))? {
            Some(guard) => {
                let row: LedgerRow =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    fn list_rows(&self) -> LedgerResult<Vec<LedgerRow>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PROVISION).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let row: LedgerRow =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(row);
        }
        results.sort_by(|a, b| a.make_date.cmp(&b.make_date).then_with(|| a.name.cmp(&b.name)));
        Ok(results)
    }
}

#[async_trait]
impl LedgerStore for EmbeddedLedger {
    fn backend(&self) -> &'static str {
        "embedded"
    }

    async fn ensure_schema(&self) -> LedgerResult<()> {
        self.create_table()
    }

    async fn insert(&self, row: &NewLedgerRow) -> LedgerResult<()> {
        self.insert_row(row)
    }

    async fn delete(&self, name: &str) -> LedgerResult<bool> {
        self.delete_row(name)
    }

    async fn get(&self, name: &str) -> LedgerResult<Option<LedgerRow>> {
        self.get_row(name)
    }

    async fn list(&self) -> LedgerResult<Vec<LedgerRow>> {
        self.list_rows()
    }
}
