//! The ledger interface consumed by the orchestrator.

use async_trait::async_trait;

use crate::error::LedgerResult;
use crate::types::{LedgerRow, NewLedgerRow};

/// Persistent name → plan → claim record.
///
/// Each call is a single statement against the backing store; nothing is
/// retried here.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Create the ledger table if it does not exist yet. Idempotent.
    async fn ensure_schema(&self) -> LedgerResult<()>;

    /// Insert a row. Fails with `Duplicate` if the name is already recorded.
    async fn insert(&self, row: &NewLedgerRow) -> LedgerResult<()>;

    /// Delete the row for `name`. Returns true if it existed.
    async fn delete(&self, name: &str) -> LedgerResult<bool>;

    /// Fetch the row for `name`.
    async fn get(&self, name: &str) -> LedgerResult<Option<LedgerRow>>;

    /// All rows, oldest first.
    async fn list(&self) -> LedgerResult<Vec<LedgerRow>>;
}
