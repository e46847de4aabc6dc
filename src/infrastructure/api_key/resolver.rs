//! API key to Principal resolution

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::generator::ApiKeyGenerator;
use crate::domain::api_key::ApiKeyRepository;
use crate::domain::authorization::Principal;
use crate::domain::guard::GuardError;

/// Resolves presented API keys into Principals
///
/// Only reads the credential store; calling it twice with the same key yields
/// the same Principal.
#[derive(Debug, Clone)]
pub struct ApiKeyPrincipalResolver {
    repository: Arc<dyn ApiKeyRepository>,
    lookup_timeout: Duration,
}

impl ApiKeyPrincipalResolver {
    pub fn new(repository: Arc<dyn ApiKeyRepository>, lookup_timeout: Duration) -> Self {
        Self {
            repository,
            lookup_timeout,
        }
    }

    pub async fn resolve(&self, credential: Option<&str>) -> Result<Principal, GuardError> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                GuardError::unauthenticated(
                    "API key required. Provide via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header",
                )
            })?;

        let prefix = ApiKeyGenerator::extract_prefix(credential)
            .ok_or_else(|| GuardError::unauthenticated("Malformed API key"))?;

        debug!(key_prefix = %prefix, "Resolving API key");

        let lookup = tokio::time::timeout(self.lookup_timeout, self.repository.get_by_prefix(prefix))
            .await
            .map_err(|_| GuardError::unavailable("credential store", "lookup timed out"))?
            .map_err(|e| GuardError::unavailable("credential store", e.to_string()))?;

        let api_key = lookup.ok_or_else(|| GuardError::unauthenticated("Invalid API key"))?;

        if !ApiKeyGenerator::verify(credential, api_key.secret_hash()) {
            debug!(key_prefix = %prefix, "API key hash verification failed");
            return Err(GuardError::unauthenticated("Invalid API key"));
        }

        if !api_key.is_valid() {
            debug!(api_key_id = %api_key.id(), status = ?api_key.status(), "API key not usable");
            return Err(GuardError::unauthenticated(
                "API key is not active or has expired",
            ));
        }

        Ok(Principal::new(
            api_key.account_id().clone(),
            api_key.id().clone(),
            api_key.scopes().clone(),
        ))
    }
}
