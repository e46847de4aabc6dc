//! In-memory subscriber store
//!
//! Also answers ownership lookups for the guard chain.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::authorization::ResourceType;
use crate::domain::ownership::OwnershipLookup;
use crate::domain::subscriber::{List, Page, Subscriber, SubscriberList, SubscriberRepository};
use crate::domain::{AccountId, DomainError};

/// Row with its insertion sequence, used to break creation-time ties
#[derive(Debug, Clone)]
struct Row<T> {
    seq: u64,
    value: T,
}

#[derive(Debug, Default)]
struct SubscriberTable {
    next_seq: u64,
    subscribers: HashMap<String, Row<Subscriber>>,
    lists: HashMap<String, List>,
    memberships: HashMap<(String, String), Row<SubscriberList>>,
}

impl SubscriberTable {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// In-memory implementation of SubscriberRepository
#[derive(Debug, Default)]
pub struct InMemorySubscriberRepository {
    table: RwLock<SubscriberTable>,
}

impl InMemorySubscriberRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriberRepository for InMemorySubscriberRepository {
    async fn get(&self, id: &str) -> Result<Option<Subscriber>, DomainError> {
        Ok(self
            .table
            .read()
            .await
            .subscribers
            .get(id)
            .map(|row| row.value.clone()))
    }

    async fn list_by_account(
        &self,
        account_id: &AccountId,
        page: Page,
    ) -> Result<Vec<Subscriber>, DomainError> {
        let table = self.table.read().await;
        let mut rows: Vec<_> = table
            .subscribers
            .values()
            .filter(|row| &row.value.account_id == account_id)
            .collect();
        rows.sort_by_key(|row| (row.value.created_at, row.seq));

        Ok(page.slice(rows.into_iter().map(|row| row.value.clone())))
    }

    async fn count_by_account(&self, account_id: &AccountId) -> Result<u64, DomainError> {
        let table = self.table.read().await;
        Ok(table
            .subscribers
            .values()
            .filter(|row| &row.value.account_id == account_id)
            .count() as u64)
    }

    async fn save(&self, subscriber: Subscriber) -> Result<Subscriber, DomainError> {
        let mut table = self.table.write().await;

        let seq = match table.subscribers.get(&subscriber.id) {
            Some(existing) => existing.seq,
            None => table.seq(),
        };
        table.subscribers.insert(
            subscriber.id.clone(),
            Row {
                seq,
                value: subscriber.clone(),
            },
        );

        Ok(subscriber)
    }

    async fn get_list(&self, id: &str) -> Result<Option<List>, DomainError> {
        Ok(self.table.read().await.lists.get(id).cloned())
    }

    async fn save_list(&self, list: List) -> Result<List, DomainError> {
        self.table
            .write()
            .await
            .lists
            .insert(list.id.clone(), list.clone());
        Ok(list)
    }

    async fn memberships(
        &self,
        subscriber_id: &str,
        page: Page,
    ) -> Result<Vec<SubscriberList>, DomainError> {
        let table = self.table.read().await;
        let mut rows: Vec<_> = table
            .memberships
            .values()
            .filter(|row| row.value.subscriber_id == subscriber_id)
            .collect();
        rows.sort_by_key(|row| (row.value.created_at, row.seq));

        Ok(page.slice(rows.into_iter().map(|row| row.value.clone())))
    }

    async fn find_membership(
        &self,
        subscriber_id: &str,
        list_id: &str,
    ) -> Result<Option<SubscriberList>, DomainError> {
        let key = (subscriber_id.to_string(), list_id.to_string());
        Ok(self
            .table
            .read()
            .await
            .memberships
            .get(&key)
            .map(|row| row.value.clone()))
    }

    async fn create_membership(
        &self,
        membership: SubscriberList,
    ) -> Result<SubscriberList, DomainError> {
        let mut table = self.table.write().await;
        let key = (membership.subscriber_id.clone(), membership.list_id.clone());

        if table.memberships.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "Subscriber '{}' is already on list '{}'",
                key.0, key.1
            )));
        }

        let seq = table.seq();
        table.memberships.insert(
            key,
            Row {
                seq,
                value: membership.clone(),
            },
        );

        Ok(membership)
    }

    async fn save_membership(
        &self,
        membership: SubscriberList,
    ) -> Result<SubscriberList, DomainError> {
        let mut table = self.table.write().await;
        let key = (membership.subscriber_id.clone(), membership.list_id.clone());

        let seq = match table.memberships.get(&key) {
            Some(existing) => existing.seq,
            None => table.seq(),
        };
        table.memberships.insert(
            key,
            Row {
                seq,
                value: membership.clone(),
            },
        );

        Ok(membership)
    }

    async fn delete_membership(
        &self,
        subscriber_id: &str,
        list_id: &str,
    ) -> Result<bool, DomainError> {
        let key = (subscriber_id.to_string(), list_id.to_string());
        Ok(self.table.write().await.memberships.remove(&key).is_some())
    }
}

#[async_trait]
impl OwnershipLookup for InMemorySubscriberRepository {
    async fn owner_of(
        &self,
        resource_type: ResourceType,
        resource_id: &str,
    ) -> Result<Option<AccountId>, DomainError> {
        let table = self.table.read().await;
        let owner = match resource_type {
            ResourceType::Subscriber => table
                .subscribers
                .get(resource_id)
                .map(|row| row.value.account_id.clone()),
            ResourceType::List => table
                .lists
                .get(resource_id)
                .map(|list| list.account_id.clone()),
        };
        Ok(owner)
    }
}
