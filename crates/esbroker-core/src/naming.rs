//! Instance name generation.

use uuid::Builder;

use crate::error::NameError;

/// Produces `<prefix><token>` names, where the token is the first segment
/// of a random v4 UUID (8 lowercase hex characters).
#[derive(Debug, Clone)]
pub struct NameGenerator {
    prefix: String,
}

impl NameGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Generate a fresh name. Uniqueness is not checked here.
    pub fn generate(&self) -> Result<String, NameError> {
        let mut bytes = [0u8; 16];
        getrandom::getrandom(&mut bytes).map_err(|e| NameError(e.to_string()))?;
        Ok(self.name_from_bytes(bytes))
    }

    /// Deterministic half of [`generate`](Self::generate).
    pub fn name_from_bytes(&self, bytes: [u8; 16]) -> String {
        let token = Builder::from_random_bytes(bytes).into_uuid().to_string();
        let segment = token.split('-').next().unwrap_or_default();
        format!("{}{}", self.prefix, segment)
    }
}
