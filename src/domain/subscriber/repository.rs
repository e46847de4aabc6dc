//! Subscriber persistence boundary

use async_trait::async_trait;

use super::entity::{List, Page, Subscriber, SubscriberList};
use crate::domain::account::AccountId;
use crate::domain::DomainError;

/// Storage for subscribers, lists and memberships
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Subscriber>, DomainError>;

    /// Subscribers of an account, oldest first
    async fn list_by_account(
        &self,
        account_id: &AccountId,
        page: Page,
    ) -> Result<Vec<Subscriber>, DomainError>;

    async fn count_by_account(&self, account_id: &AccountId) -> Result<u64, DomainError>;

    /// Insert or replace a subscriber
    async fn save(&self, subscriber: Subscriber) -> Result<Subscriber, DomainError>;

    async fn get_list(&self, id: &str) -> Result<Option<List>, DomainError>;

    async fn save_list(&self, list: List) -> Result<List, DomainError>;

    /// Memberships of a subscriber, oldest first
    async fn memberships(
        &self,
        subscriber_id: &str,
        page: Page,
    ) -> Result<Vec<SubscriberList>, DomainError>;

    async fn find_membership(
        &self,
        subscriber_id: &str,
        list_id: &str,
    ) -> Result<Option<SubscriberList>, DomainError>;

    /// Insert a new membership; `Conflict` if the pair already exists
    async fn create_membership(
        &self,
        membership: SubscriberList,
    ) -> Result<SubscriberList, DomainError>;

    /// Insert or replace a membership
    async fn save_membership(&self, membership: SubscriberList) -> Result<SubscriberList, DomainError>;

    /// Returns `false` when no such membership existed
    async fn delete_membership(&self, subscriber_id: &str, list_id: &str) -> Result<bool, DomainError>;
}
