//! Resource ownership domain
//!
//! Ownership facts tie a subscriber or list id to the account that owns it.
//! Lookups are served by the persistence collaborator.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::account::AccountId;
use crate::domain::authorization::ResourceType;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Resolves the owning account of a resource
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OwnershipLookup: Send + Sync {
    /// Returns `None` when no resource with this id exists
    async fn owner_of(
        &self,
        resource_type: ResourceType,
        resource_id: &str,
    ) -> Result<Option<AccountId>, DomainError>;
}

/// A confirmed `(resource, account)` pairing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnershipFact {
    pub resource_type: ResourceType,
    pub resource_id: String,
    pub account_id: AccountId,
}
