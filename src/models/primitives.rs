//! Primitive types and newtypes for type-safe API interactions.
//!
//! Identifiers travel as strings on the wire; the newtypes keep a contract
//! id from being passed where an issue id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A brokerage contract identifier.
///
/// Most account-level endpoints are keyed by contract id. The id is numeric
/// but the services expect it as a string.
///
/// # Example
///
/// ```
/// use gbm::ContractId;
///
/// let contract = ContractId::new("123456");
/// assert_eq!(contract.as_str(), "123456");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(String);

impl ContractId {
    /// Create a new contract id.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the contract id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ContractId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ContractId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ContractId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for ContractId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

/// A listed issue, as the exchange names it (e.g. `"AC *"`, `"GFINBUR O"`).
///
/// Issue ids contain spaces and punctuation, so they are percent-encoded
/// whenever they become part of a URL path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(String);

impl IssueId {
    /// Create a new issue id.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the issue id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for IssueId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for IssueId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_id_serializes_as_string() {
        let contract = ContractId::from(4512u64);
        assert_eq!(serde_json::to_value(&contract).unwrap(), "4512");
        assert_eq!(contract.to_string(), "4512");
    }

    #[test]
    fn test_issue_id_round_trip() {
        let issue: IssueId = serde_json::from_str("\"GFINBUR O\"").unwrap();
        assert_eq!(issue.as_str(), "GFINBUR O");
    }
}
