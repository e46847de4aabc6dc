//! Subscriber Gateway
//!
//! Authorization pipeline in front of a subscriber management API:
//! - API key authentication
//! - Per key, per route throttling
//! - Scope to ability compilation and policy evaluation
//! - Resource ownership checks for subscribers and lists

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use api::state::AppState;
use config::BootstrapConfig;
use domain::{AccountId, ApiKeyId, ApiKeyRepository, RouteRegistry};
use infrastructure::{
    api_key::{
        ApiKeyPrincipalResolver, ApiKeyService, CachedApiKeyRepository, InMemoryApiKeyRepository,
    },
    guard::GuardChain,
    subscriber::{InMemorySubscriberRepository, SubscriberApiService},
    throttle::ThrottleLimiter,
};

const DEMO_ACCOUNT: &str = "demo-account";

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Wire stores, limiter and guard chain, then load bootstrap data
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let credential_store: Arc<dyn ApiKeyRepository> = match config.guard.credential_cache_ttl() {
        Some(ttl) => {
            info!(ttl_secs = ttl.as_secs(), "Using cached credential store");
            Arc::new(CachedApiKeyRepository::new(InMemoryApiKeyRepository::new(), ttl))
        }
        None => Arc::new(InMemoryApiKeyRepository::new()),
    };

    let limiter = Arc::new(ThrottleLimiter::with_sweep_interval(
        config.throttle.sweep_interval(),
    ));
    let api_keys: Arc<ApiKeyService<dyn ApiKeyRepository>> =
        Arc::new(ApiKeyService::new(credential_store.clone()).with_limiter(limiter.clone()));

    let subscriber_store = Arc::new(InMemorySubscriberRepository::new());
    let subscribers = SubscriberApiService::new(subscriber_store.clone());

    let lookup_timeout = config.guard.lookup_timeout();
    let guard_chain = GuardChain::standard(
        RouteRegistry::standard(),
        ApiKeyPrincipalResolver::new(credential_store.clone(), lookup_timeout),
        limiter.clone(),
        subscriber_store.clone(),
        lookup_timeout,
    )
    .with_concealment(config.guard.conceal_foreign_resources);

    let state = AppState {
        guard_chain: Arc::new(guard_chain),
        subscribers,
        api_keys,
        limiter,
        credential_store,
        subscriber_store: subscriber_store.clone(),
        ownership: subscriber_store,
    };

    seed_bootstrap_keys(&state, &config.bootstrap).await?;
    if config.bootstrap.demo_data {
        seed_demo_data(&state, &config.bootstrap).await?;
    }

    Ok(state)
}

async fn seed_bootstrap_keys(state: &AppState, bootstrap: &BootstrapConfig) -> anyhow::Result<()> {
    for key in &bootstrap.keys {
        let id = ApiKeyId::new(&key.id).with_context(|| format!("bootstrap key '{}'", key.id))?;
        let account_id = AccountId::new(&key.account_id)
            .with_context(|| format!("bootstrap key '{}' account", key.id))?;
        let scopes: BTreeSet<String> = key.scopes.iter().cloned().collect();

        let issued = state
            .api_keys
            .issue_with_secret(
                id,
                account_id,
                key.name.clone().unwrap_or_else(|| key.id.clone()),
                &key.secret,
                scopes,
            )
            .await
            .with_context(|| format!("failed to load bootstrap key '{}'", key.id))?;

        info!(
            api_key_id = %issued.api_key.id(),
            account_id = %issued.api_key.account_id(),
            key_prefix = %issued.api_key.key_prefix(),
            "Loaded bootstrap API key"
        );
    }

    Ok(())
}

/// A list and a few subscribers for every bootstrap account
async fn seed_demo_data(state: &AppState, bootstrap: &BootstrapConfig) -> anyhow::Result<()> {
    let mut accounts: Vec<&str> = Vec::new();
    let mut seen = HashSet::new();
    for key in &bootstrap.keys {
        if seen.insert(key.account_id.as_str()) {
            accounts.push(key.account_id.as_str());
        }
    }
    if accounts.is_empty() {
        accounts.push(DEMO_ACCOUNT);
    }

    let people = [
        ("Ada", "Lovelace"),
        ("Grace", "Hopper"),
        ("Alan", "Turing"),
    ];

    for account in accounts {
        let account_id = AccountId::new(account)?;

        let list = state
            .subscribers
            .create_list(account_id.clone(), "Newsletter")
            .await?;
        info!(account_id = %account_id, list_id = %list.id, "Seeded demo list");

        for (first_name, last_name) in people {
            let email = format!(
                "{}.{}@{}.example",
                first_name.to_lowercase(),
                last_name.to_lowercase(),
                account
            );
            let subscriber = state
                .subscribers
                .create_subscriber(account_id.clone(), &email, first_name, last_name)
                .await?;
            info!(account_id = %account_id, subscriber_id = %subscriber.id, "Seeded demo subscriber");
        }
    }

    Ok(())
}
