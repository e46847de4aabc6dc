//! API Key service
//!
//! Issuance and lifecycle management for API keys.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository, ApiKeyStatus};
use crate::domain::authorization::ScopeGrant;
use crate::domain::{AccountId, DomainError};
use crate::infrastructure::throttle::ThrottleLimiter;

use super::generator::ApiKeyGenerator;

/// Result of issuing a new API key
#[derive(Debug)]
pub struct IssuedApiKey {
    pub api_key: ApiKey,
    /// Full secret, only returned once
    pub secret: String,
}

/// API Key service
#[derive(Debug)]
pub struct ApiKeyService<R>
where
    R: ApiKeyRepository + ?Sized,
{
    repository: Arc<R>,
    generator: ApiKeyGenerator,
    limiter: Option<Arc<ThrottleLimiter>>,
}

impl<R: ApiKeyRepository + ?Sized> ApiKeyService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            generator: ApiKeyGenerator::live(),
            limiter: None,
        }
    }

    pub fn with_generator(mut self, generator: ApiKeyGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Throttle windows of revoked keys are dropped from this limiter
    pub fn with_limiter(mut self, limiter: Arc<ThrottleLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Issue a new key with a random secret
    pub async fn issue(
        &self,
        id: ApiKeyId,
        account_id: AccountId,
        name: impl Into<String>,
        scopes: BTreeSet<String>,
    ) -> Result<IssuedApiKey, DomainError> {
        let issued = self.generator.issue();
        self.store(id, account_id, name.into(), scopes, issued.secret, issued.prefix, issued.hash)
            .await
    }

    /// Issue a key around a known random part (bootstrap keys)
    pub async fn issue_with_secret(
        &self,
        id: ApiKeyId,
        account_id: AccountId,
        name: impl Into<String>,
        secret: &str,
        scopes: BTreeSet<String>,
    ) -> Result<IssuedApiKey, DomainError> {
        let issued = self.generator.from_secret(secret);
        if ApiKeyGenerator::extract_prefix(&issued.secret).is_none() {
            return Err(DomainError::validation(format!(
                "Secret for API key '{}' must be at least 8 ASCII characters",
                id
            )));
        }

        self.store(id, account_id, name.into(), scopes, issued.secret, issued.prefix, issued.hash)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn store(
        &self,
        id: ApiKeyId,
        account_id: AccountId,
        name: String,
        scopes: BTreeSet<String>,
        secret: String,
        prefix: String,
        hash: String,
    ) -> Result<IssuedApiKey, DomainError> {
        warn_unknown_scopes(&id, &scopes);
        info!(api_key_id = %id, account_id = %account_id, "Issuing API key");

        let api_key = ApiKey::new(id, account_id, name, hash, prefix).with_scopes(scopes);
        let created = self.repository.create(api_key).await?;

        Ok(IssuedApiKey {
            api_key: created,
            secret,
        })
    }

    pub async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        self.repository.get(id).await
    }

    pub async fn revoke(&self, id: &ApiKeyId) -> Result<ApiKey, DomainError> {
        info!(api_key_id = %id, "Revoking API key");
        let key = self.modify(id, ApiKey::revoke).await?;

        if let Some(limiter) = &self.limiter {
            limiter.reset_key(id).await;
        }

        Ok(key)
    }

    pub async fn suspend(&self, id: &ApiKeyId) -> Result<ApiKey, DomainError> {
        info!(api_key_id = %id, "Suspending API key");
        self.modify(id, ApiKey::suspend).await
    }

    /// Reactivate a suspended key. Revoked keys stay revoked.
    pub async fn activate(&self, id: &ApiKeyId) -> Result<ApiKey, DomainError> {
        let key = self.require(id).await?;
        if key.status() != ApiKeyStatus::Suspended {
            return Err(DomainError::validation("Only suspended keys can be activated"));
        }

        info!(api_key_id = %id, "Activating API key");
        self.modify(id, ApiKey::activate).await
    }

    pub async fn update_scopes(
        &self,
        id: &ApiKeyId,
        scopes: BTreeSet<String>,
    ) -> Result<ApiKey, DomainError> {
        warn_unknown_scopes(id, &scopes);
        info!(api_key_id = %id, "Updating API key scopes");
        self.modify(id, |key| key.set_scopes(scopes)).await
    }

    async fn require(&self, id: &ApiKeyId) -> Result<ApiKey, DomainError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))
    }

    async fn modify(
        &self,
        id: &ApiKeyId,
        change: impl FnOnce(&mut ApiKey),
    ) -> Result<ApiKey, DomainError> {
        let mut key = self.require(id).await?;
        change(&mut key);
        self.repository.update(&key).await
    }
}

fn warn_unknown_scopes(id: &ApiKeyId, scopes: &BTreeSet<String>) {
    for scope in scopes.iter().filter(|s| ScopeGrant::parse(s).is_none()) {
        warn!(api_key_id = %id, scope = %scope, "Scope is not recognised by this deployment");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::guard::RouteId;
    use crate::domain::throttle::{ThrottleKey, ThrottlePolicy};
    use crate::infrastructure::api_key::{ApiKeyPrincipalResolver, InMemoryApiKeyRepository};
    use std::time::Duration;

    fn scopes(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn create_service() -> ApiKeyService<InMemoryApiKeyRepository> {
        ApiKeyService::new(Arc::new(InMemoryApiKeyRepository::new()))
            .with_generator(ApiKeyGenerator::test())
    }

    #[tokio::test]
    async fn test_issue_api_key() {
        let service = create_service();

        let issued = service
            .issue(
                ApiKeyId::new("key-1").unwrap(),
                AccountId::new("acme").unwrap(),
                "CRM sync",
                scopes(&["subscriber:read"]),
            )
            .await
            .unwrap();

        assert!(issued.secret.starts_with("bsk_test_"));
        assert!(issued.api_key.is_valid());
        assert!(issued.api_key.scopes().contains("subscriber:read"));
    }

    #[tokio::test]
    async fn test_revoked_key_stops_resolving() {
        let repo = Arc::new(InMemoryApiKeyRepository::new());
        let service = ApiKeyService::new(repo.clone()).with_generator(ApiKeyGenerator::test());
        let resolver = ApiKeyPrincipalResolver::new(repo, Duration::from_secs(1));
        let id = ApiKeyId::new("key-1").unwrap();

        let issued = service
            .issue(id.clone(), AccountId::new("acme").unwrap(), "CRM", scopes(&[]))
            .await
            .unwrap();
        assert!(resolver.resolve(Some(&issued.secret)).await.is_ok());

        let revoked = service.revoke(&id).await.unwrap();
        assert_eq!(revoked.status(), ApiKeyStatus::Revoked);
        assert!(resolver.resolve(Some(&issued.secret)).await.is_err());
    }

    #[tokio::test]
    async fn test_revoke_clears_throttle_windows() {
        let limiter = Arc::new(ThrottleLimiter::new());
        let service = create_service().with_limiter(limiter.clone());
        let id = ApiKeyId::new("key-1").unwrap();
        service
            .issue(id.clone(), AccountId::new("acme").unwrap(), "CRM", scopes(&[]))
            .await
            .unwrap();

        let key = ThrottleKey::new(id.clone(), RouteId::GetSubscriber);
        limiter.check(&key, ThrottlePolicy::DEFAULT).await.unwrap();
        assert_eq!(limiter.count(&key).await, Some(1));

        service.revoke(&id).await.unwrap();
        assert_eq!(limiter.count(&key).await, None);
    }

    #[tokio::test]
    async fn test_suspend_and_activate() {
        let service = create_service();
        let id = ApiKeyId::new("key-1").unwrap();
        service
            .issue(id.clone(), AccountId::new("acme").unwrap(), "CRM", scopes(&[]))
            .await
            .unwrap();

        let suspended = service.suspend(&id).await.unwrap();
        assert_eq!(suspended.status(), ApiKeyStatus::Suspended);

        let activated = service.activate(&id).await.unwrap();
        assert_eq!(activated.status(), ApiKeyStatus::Active);
    }

    #[tokio::test]
    async fn test_revoked_key_cannot_be_activated() {
        let service = create_service();
        let id = ApiKeyId::new("key-1").unwrap();
        service
            .issue(id.clone(), AccountId::new("acme").unwrap(), "CRM", scopes(&[]))
            .await
            .unwrap();
        service.revoke(&id).await.unwrap();

        assert!(matches!(
            service.activate(&id).await,
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_scopes() {
        let service = create_service();
        let id = ApiKeyId::new("key-1").unwrap();
        service
            .issue(id.clone(), AccountId::new("acme").unwrap(), "CRM", scopes(&["list:read"]))
            .await
            .unwrap();

        let updated = service
            .update_scopes(&id, scopes(&["list:manage", "subscriber:manage"]))
            .await
            .unwrap();

        assert_eq!(updated.scopes(), &scopes(&["list:manage", "subscriber:manage"]));
    }

    #[tokio::test]
    async fn test_issue_with_secret_rejects_unusable_secrets() {
        let service = create_service();

        for secret in ["abc123", "ключключключ"] {
            let result = service
                .issue_with_secret(
                    ApiKeyId::new("key-1").unwrap(),
                    AccountId::new("acme").unwrap(),
                    "Bootstrap",
                    secret,
                    scopes(&[]),
                )
                .await;
            assert!(matches!(result, Err(DomainError::Validation { .. })), "{secret}");
        }
        assert!(service.get(&ApiKeyId::new("key-1").unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_issue_with_secret_resolves() {
        let repo = Arc::new(InMemoryApiKeyRepository::new());
        let service = ApiKeyService::new(repo.clone()).with_generator(ApiKeyGenerator::test());
        let resolver = ApiKeyPrincipalResolver::new(repo, Duration::from_secs(1));

        let issued = service
            .issue_with_secret(
                ApiKeyId::new("key-1").unwrap(),
                AccountId::new("acme").unwrap(),
                "Bootstrap",
                "abcdefgh",
                scopes(&[]),
            )
            .await
            .unwrap();

        assert_eq!(issued.secret, "bsk_test_abcdefgh");
        assert!(resolver.resolve(Some(&issued.secret)).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_key_operations() {
        let service = create_service();
        let id = ApiKeyId::new("ghost").unwrap();

        assert!(matches!(service.revoke(&id).await, Err(DomainError::NotFound { .. })));
        assert!(service.get(&id).await.unwrap().is_none());
    }
}
