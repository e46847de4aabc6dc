use serde::{Deserialize, Serialize};

use crate::domain::api_key::{validate_identifier, IdentifierValidationError};

/// Account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Create a new AccountId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, IdentifierValidationError> {
        let id = id.into();
        validate_identifier("Account", &id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = IdentifierValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_roundtrips_through_serde() {
        let id = AccountId::new("acme-corp").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"acme-corp\"");
    }

    #[test]
    fn test_account_id_rejects_invalid_input() {
        assert!(AccountId::new("").is_err());
        assert!(serde_json::from_str::<AccountId>("\"acme corp\"").is_err());
    }
}
