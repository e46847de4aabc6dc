//! In-memory API key repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct KeyTable {
    keys: HashMap<ApiKeyId, ApiKey>,
    by_prefix: HashMap<String, ApiKeyId>,
}

/// In-memory implementation of ApiKeyRepository
#[derive(Debug, Default)]
pub struct InMemoryApiKeyRepository {
    table: RwLock<KeyTable>,
}

impl InMemoryApiKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        Ok(self.table.read().await.keys.get(id).cloned())
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Option<ApiKey>, DomainError> {
        let table = self.table.read().await;
        Ok(table
            .by_prefix
            .get(prefix)
            .and_then(|id| table.keys.get(id))
            .cloned())
    }

    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
        let mut table = self.table.write().await;

        if table.keys.contains_key(api_key.id()) {
            return Err(DomainError::conflict(format!(
                "API key with ID '{}' already exists",
                api_key.id()
            )));
        }

        if table.by_prefix.contains_key(api_key.key_prefix()) {
            return Err(DomainError::conflict(format!(
                "API key with prefix '{}' already exists",
                api_key.key_prefix()
            )));
        }

        table
            .by_prefix
            .insert(api_key.key_prefix().to_string(), api_key.id().clone());
        table.keys.insert(api_key.id().clone(), api_key.clone());

        Ok(api_key)
    }

    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, DomainError> {
        let mut table = self.table.write().await;

        let Some(existing) = table.keys.get_mut(api_key.id()) else {
            return Err(DomainError::not_found(format!(
                "API key '{}' not found",
                api_key.id()
            )));
        };

        if existing.key_prefix() != api_key.key_prefix() {
            return Err(DomainError::validation("API key prefix cannot change"));
        }

        *existing = api_key.clone();
        Ok(api_key.clone())
    }
}
