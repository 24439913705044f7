//! Orchestrator error types.

use std::fmt;

use thiserror::Error;

/// Provisioning steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStage {
    Validating,
    Resolving,
    Creating,
    Tagging,
    Persisting,
}

impl fmt::Display for ProvisionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            ProvisionStage::Validating => "validating",
            ProvisionStage::Resolving => "resolving",
            ProvisionStage::Creating => "creating",
            ProvisionStage::Tagging => "tagging",
            ProvisionStage::Persisting => "persisting",
        };
        f.write_str(stage)
    }
}

/// Errors surfaced to callers of the orchestrator.
///
/// The HTTP layer renders `to_string()` verbatim, so messages carry the
/// underlying provider or ledger error text.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("invalid plan: {0:?}")]
    InvalidPlan(String),

    #[error("provisioning failed while {stage}: {message}")]
    ProvisionFailed {
        stage: ProvisionStage,
        message: String,
    },

    #[error("delete failed: {0}")]
    DeleteFailed(String),

    #[error("cluster {0} is not available yet")]
    NotAvailable(String),

    #[error("status lookup failed: {0}")]
    StatusFailed(String),

    #[error("tagging failed: {0}")]
    TagFailed(String),
}

impl BrokerError {
    pub(crate) fn at(stage: ProvisionStage, err: impl fmt::Display) -> Self {
        BrokerError::ProvisionFailed {
            stage,
            message: err.to_string(),
        }
    }

    /// The stage a provisioning failure happened in, if any.
    pub fn stage(&self) -> Option<ProvisionStage> {
        match self {
            BrokerError::InvalidPlan(_) => Some(ProvisionStage::Validating),
            BrokerError::ProvisionFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type BrokerResult<T> = Result<T, BrokerError>;
