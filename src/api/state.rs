//! Application state for shared services

use std::sync::Arc;

use crate::domain::api_key::ApiKeyRepository;
use crate::domain::ownership::OwnershipLookup;
use crate::domain::subscriber::SubscriberRepository;
use crate::infrastructure::api_key::ApiKeyService;
use crate::infrastructure::guard::GuardChain;
use crate::infrastructure::subscriber::SubscriberApiService;
use crate::infrastructure::throttle::ThrottleLimiter;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub guard_chain: Arc<GuardChain>,
    pub subscribers: SubscriberApiService,
    pub api_keys: Arc<ApiKeyService<dyn ApiKeyRepository>>,
    pub limiter: Arc<ThrottleLimiter>,
    pub credential_store: Arc<dyn ApiKeyRepository>,
    pub subscriber_store: Arc<dyn SubscriberRepository>,
    pub ownership: Arc<dyn OwnershipLookup>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("guard_chain", &self.guard_chain)
            .finish_non_exhaustive()
    }
}
