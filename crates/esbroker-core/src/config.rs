//! esbroker.toml configuration parser.
//!
//! The config file is optional; every deployment-specific setting can also be
//! supplied through the environment variables the broker has always used
//! (`REGION`, `ACCOUNTNUMBER`, `SUBNET_ID`, ...). Environment values win over
//! file values. The result is validated once and then shared read-only.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::plans::{Plan, PlanCatalog};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Cloud region the clusters live in.
    #[serde(default)]
    pub region: String,
    /// Account identifier used to build resource ARNs.
    #[serde(default)]
    pub account_id: String,
    /// Search engine version requested on create (e.g. "6.2").
    #[serde(default)]
    pub es_version: String,
    /// Environment-specific prefix for generated instance names.
    #[serde(default)]
    pub name_prefix: String,
    /// KMS key for encryption at rest; the provider default key when unset.
    #[serde(default)]
    pub kms_key_id: Option<String>,
    #[serde(default)]
    pub network: NetworkConfig,
    /// Where the ledger lives. Required: either a `[ledger]` table or
    /// `BROKERDB_URL`/`DATABASE_URL`.
    #[serde(default)]
    pub ledger: Option<LedgerConfig>,
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Replaces the built-in plan catalog when non-empty.
    #[serde(default)]
    pub plans: Vec<Plan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub subnet_ids: Vec<String>,
    #[serde(default)]
    pub security_group_id: String,
    /// Keep the first subnet out of single-node placements.
    #[serde(default = "default_true")]
    pub reserve_first_subnet: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            subnet_ids: Vec::new(),
            security_group_id: String::new(),
            reserve_first_subnet: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum LedgerConfig {
    /// The `provision` table in PostgreSQL.
    Postgres {
        url: String,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
    /// A local redb file, for development and single-host installs.
    Embedded { path: PathBuf },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderBackend {
    #[default]
    Aws,
    /// In-process fake; clusters become available immediately.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub backend: ProviderBackend,
    /// Overrides `https://es.<region>.amazonaws.com`.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts for idempotent calls (describe, delete).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: ProviderBackend::default(),
            endpoint: None,
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    20
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    200
}

impl BrokerConfig {
    /// Load the file (if any), apply environment overrides, and validate.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(?path, "config file loaded");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (tests pass a map).
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("REGION") {
            self.region = v;
        }
        if let Some(v) = get("ACCOUNTNUMBER") {
            self.account_id = v;
        }
        if let Some(v) = get("ES_VERSION") {
            self.es_version = v;
        }
        if let Some(v) = get("NAME_PREFIX") {
            self.name_prefix = v;
        }
        if let Some(v) = get("KMSKEYID") {
            self.kms_key_id = Some(v);
        }
        if let Some(v) = get("SUBNET_ID") {
            self.network.subnet_ids = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = get("SECURITY_GROUP_ID") {
            self.network.security_group_id = v;
        }
        if let Some(url) = get("BROKERDB_URL").or_else(|| get("DATABASE_URL")) {
            let max_connections = match &self.ledger {
                Some(LedgerConfig::Postgres { max_connections, .. }) => *max_connections,
                _ => default_max_connections(),
            };
            self.ledger = Some(LedgerConfig::Postgres {
                url,
                max_connections,
            });
        }
    }

    /// Check that every setting the orchestrator depends on is present.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.region.is_empty() {
            return Err(ConfigError::Missing("region"));
        }
        if self.account_id.is_empty() {
            return Err(ConfigError::Missing("account_id"));
        }
        if self.es_version.is_empty() {
            return Err(ConfigError::Missing("es_version"));
        }
        if self.network.subnet_ids.is_empty() {
            return Err(ConfigError::Missing("network.subnet_ids"));
        }
        if self.network.security_group_id.is_empty() {
            return Err(ConfigError::Missing("network.security_group_id"));
        }
        match self.ledger_config()? {
            LedgerConfig::Postgres { url, .. } if url.is_empty() => {
                return Err(ConfigError::Missing("ledger.url"));
            }
            LedgerConfig::Postgres {
                max_connections: 0, ..
            } => {
                return Err(ConfigError::Invalid {
                    key: "ledger.max_connections",
                    reason: "must be positive".to_string(),
                });
            }
            _ => {}
        }
        if self.provider.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "provider.max_attempts",
                reason: "must be positive".to_string(),
            });
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "provider.timeout_secs",
                reason: "must be positive".to_string(),
            });
        }
        self.catalog().map(|_| ())
    }

    /// The configured ledger backend.
    pub fn ledger_config(&self) -> ConfigResult<&LedgerConfig> {
        self.ledger.as_ref().ok_or(ConfigError::Missing("ledger"))
    }

    /// The plan catalog this configuration selects.
    pub fn catalog(&self) -> ConfigResult<PlanCatalog> {
        if self.plans.is_empty() {
            Ok(PlanCatalog::builtin())
        } else {
            PlanCatalog::new(self.plans.clone())
        }
    }

    /// Resource ARN of a cluster domain.
    pub fn domain_arn(&self, name: &str) -> String {
        format!("arn:aws:es:{}:{}:domain/{}", self.region, self.account_id, name)
    }

    /// Access policy attached to a new domain: any principal may call
    /// `es:*` on the domain's own sub-resources.
    pub fn access_policy(&self, name: &str) -> String {
        serde_json::json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "AWS": "*" },
                "Action": "es:*",
                "Resource": format!("{}/*", self.domain_arn(name)),
            }]
        })
        .to_string()
    }
}
