//! redb table definitions for the embedded ledger.

use redb::TableDefinition;

/// Ledger rows keyed by instance name; values are JSON-serialized `LedgerRow`s.
pub const PROVISION: TableDefinition<&str, &[u8]> = TableDefinition::new("provision");
