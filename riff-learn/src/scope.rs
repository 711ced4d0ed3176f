//! Ownership scope for index entries

use serde::{Deserialize, Serialize};

use crate::LearnError;

/// Who an indexed example belongs to.
///
/// Retrieval defaults to `Global`; multi-tenant deployments scope entries
/// per owner so one account's successes never leak into another's prompts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Shared across all owners.
    Global,
    /// Specific to one owner account.
    Owner(String),
}

impl Scope {
    /// Convert to storage string format (`global` or `owner:<id>`).
    pub fn to_db_string(&self) -> String {
        match self {
            Scope::Global => "global".to_string(),
            Scope::Owner(id) => format!("owner:{id}"),
        }
    }

    /// Parse from storage string format.
    pub fn from_db_string(s: &str) -> Result<Self, LearnError> {
        if s == "global" {
            return Ok(Scope::Global);
        }
        if let Some(id) = s.strip_prefix("owner:") {
            return Ok(Scope::Owner(id.to_string()));
        }
        Err(LearnError::InvalidScope(s.to_string()))
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Global
    }
}
