use std::collections::BTreeSet;

use serde::Serialize;

use super::ability::AbilitySet;
use crate::domain::account::AccountId;
use crate::domain::api_key::ApiKeyId;

/// Identity resolved from an API key for the lifetime of one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub account_id: AccountId,
    pub api_key_id: ApiKeyId,
    /// Scopes exactly as issued, not expanded
    pub granted_scopes: BTreeSet<String>,
}

impl Principal {
    pub fn new(account_id: AccountId, api_key_id: ApiKeyId, granted_scopes: BTreeSet<String>) -> Self {
        Self {
            account_id,
            api_key_id,
            granted_scopes,
        }
    }

    pub fn abilities(&self) -> AbilitySet {
        AbilitySet::compile(&self.granted_scopes)
    }
}
