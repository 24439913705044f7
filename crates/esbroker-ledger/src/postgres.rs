//! PgLedger: the `provision` table in PostgreSQL.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, error};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::LedgerStore;
use crate::types::{LedgerRow, NewLedgerRow};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS public.provision ( \
    name character varying(200) NOT NULL, \
    plan character varying(200), \
    claimed character varying(200), \
    make_date timestamp without time zone DEFAULT now(), \
    CONSTRAINT name_pkey PRIMARY KEY (name) )";

const SELECT_COLUMNS: &str =
    "SELECT name, COALESCE(plan, '') AS plan, COALESCE(claimed, '') AS claimed, make_date FROM provision";

/// How long a request waits for a pooled connection before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pooled PostgreSQL ledger. Cloning shares the pool.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    /// Connect a pool of at most `max_connections` connections.
    pub async fn connect(url: &str, max_connections: u32) -> LedgerResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await
            .map_err(|e| LedgerError::Connect(e.to_string()))?;
        debug!(max_connections, "ledger pool connected");
        Ok(Self { pool })
    }
}

#[async_trait]
impl LedgerStore for PgLedger {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ensure_schema(&self) -> LedgerResult<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "unable to set up ledger table");
                LedgerError::Schema(e.to_string())
            })?;
        Ok(())
    }

    async fn insert(&self, row: &NewLedgerRow) -> LedgerResult<()> {
        let result = sqlx::query("INSERT INTO provision(name, plan, claimed) VALUES ($1, $2, $3)")
            .bind(&row.name)
            .bind(&row.plan)
            .bind(&row.claimed)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {
                debug!(name = %row.name, plan = %row.plan, "ledger row stored");
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(LedgerError::Duplicate(row.name.clone()))
            }
            Err(e) => Err(LedgerError::Write(e.to_string())),
        }
    }

    async fn delete(&self, name: &str) -> LedgerResult<bool> {
        let result = sqlx::query("DELETE FROM provision WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Write(e.to_string()))?;
        let existed = result.rows_affected() > 0;
        debug!(%name, existed, "ledger row deleted");
        Ok(existed)
    }

    async fn get(&self, name: &str) -> LedgerResult<Option<LedgerRow>> {
        let sql = format!("{SELECT_COLUMNS} WHERE name = $1");
        sqlx::query_as::<_, LedgerRow>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LedgerError::Read(e.to_string()))
    }

    async fn list(&self) -> LedgerResult<Vec<LedgerRow>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY make_date, name");
        sqlx::query_as::<_, LedgerRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| LedgerError::Read(e.to_string()))
    }
}
