//! Ledger row types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Value of the `claimed` column for every row the broker writes.
pub const CLAIMED: &str = "yes";

/// A row about to be inserted; `make_date` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerRow {
    pub name: String,
    pub plan: String,
    pub claimed: String,
}

impl NewLedgerRow {
    /// A freshly provisioned, claimed instance.
    pub fn claimed(name: impl Into<String>, plan: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plan: plan.into(),
            claimed: CLAIMED.to_string(),
        }
    }
}

/// A stored ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LedgerRow {
    pub name: String,
    pub plan: String,
    pub claimed: String,
    /// Creation time (UTC, no zone), as the `make_date` column stores it.
    pub make_date: Option<NaiveDateTime>,
}
