//! Guard chain orchestration
//!
//! Runs the guards in their fixed order
//! (authenticate, throttle, ownership, policy) and turns a context that made
//! it through all of them into a [`RequestContext`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::guards::{AuthenticationGuard, Guard, OwnershipGuard, PolicyGuard, ThrottleGuard};
use crate::domain::guard::{
    ForbiddenReason, GuardContext, GuardError, GuardRequest, GuardStage, RequestContext,
    RouteRegistry,
};
use crate::domain::ownership::OwnershipLookup;
use crate::infrastructure::api_key::ApiKeyPrincipalResolver;
use crate::infrastructure::observability::record_guard_decision;
use crate::infrastructure::throttle::ThrottleLimiter;

/// Ordered guard list plus the route table it enforces
#[derive(Debug, Clone)]
pub struct GuardChain {
    routes: Arc<RouteRegistry>,
    guards: Vec<Arc<dyn Guard>>,
    conceal_foreign_resources: bool,
}

impl GuardChain {
    pub fn new(routes: RouteRegistry, guards: Vec<Arc<dyn Guard>>) -> Self {
        Self {
            routes: Arc::new(routes),
            guards,
            conceal_foreign_resources: true,
        }
    }

    /// The standard authenticate, throttle, ownership, policy chain
    pub fn standard(
        routes: RouteRegistry,
        resolver: ApiKeyPrincipalResolver,
        limiter: Arc<ThrottleLimiter>,
        ownership: Arc<dyn OwnershipLookup>,
        lookup_timeout: Duration,
    ) -> Self {
        Self::new(
            routes,
            vec![
                Arc::new(AuthenticationGuard::new(resolver)),
                Arc::new(ThrottleGuard::new(limiter)),
                Arc::new(OwnershipGuard::new(ownership, lookup_timeout)),
                Arc::new(PolicyGuard),
            ],
        )
    }

    /// Report resources owned by other accounts as not found
    pub fn with_concealment(mut self, conceal: bool) -> Self {
        self.conceal_foreign_resources = conceal;
        self
    }

    pub fn routes(&self) -> &RouteRegistry {
        &self.routes
    }

    /// Run every applicable guard; the first failure ends the chain
    #[instrument(skip_all, fields(route = %request.route))]
    pub async fn admit(&self, request: GuardRequest) -> Result<RequestContext, GuardError> {
        let spec = *self.routes.get(request.route).ok_or_else(|| {
            GuardError::unavailable(
                "route registry",
                format!("route '{}' is not registered", request.route),
            )
        })?;

        let mut ctx = GuardContext::new(request, spec);

        for guard in &self.guards {
            if !guard.applies(&ctx) {
                debug!(guard = guard.name(), "Guard skipped");
                continue;
            }

            match guard.check(ctx).await {
                Ok(next) => {
                    record_guard_decision(guard.name(), "pass");
                    ctx = next;
                    ctx.stage = guard.stage();
                }
                Err(err) => {
                    record_guard_decision(guard.name(), err.kind());
                    if err.is_retryable() {
                        warn!(guard = guard.name(), error = %err, "Guard could not decide");
                    } else {
                        info!(guard = guard.name(), error = %err, "Request denied");
                    }
                    return Err(self.conceal(err));
                }
            }
        }

        ctx.stage = GuardStage::Admitted;
        let admitted = ctx
            .admit()
            .ok_or_else(|| GuardError::unauthenticated("Request has not been authenticated"))?;

        debug!(account_id = %admitted.principal.account_id, "Request admitted");
        Ok(admitted)
    }

    fn conceal(&self, err: GuardError) -> GuardError {
        match err {
            GuardError::Forbidden {
                reason:
                    ForbiddenReason::NotOwner {
                        resource_type,
                        resource_id,
                    },
            } if self.conceal_foreign_resources => GuardError::ResourceNotFound {
                resource_type,
                resource_id: Some(resource_id),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
    use crate::domain::authorization::{ResourceType, ScopeGrant};
    use crate::domain::guard::RouteId;
    use crate::domain::ownership::MockOwnershipLookup;
    use crate::domain::throttle::{ThrottleKey, ThrottlePolicy};
    use crate::domain::{AccountId, DomainError};
    use crate::infrastructure::api_key::{ApiKeyGenerator, InMemoryApiKeyRepository};
    use async_trait::async_trait;
    use mockall::predicate::eq;
    use tokio::sync::Notify;

    const ACME_SECRET: &str = "acmekey1-0000000000";
    const GLOBEX_SECRET: &str = "globexk1-0000000000";

    struct Fixture {
        limiter: Arc<ThrottleLimiter>,
        repository: Arc<InMemoryApiKeyRepository>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                limiter: Arc::new(ThrottleLimiter::new()),
                repository: Arc::new(InMemoryApiKeyRepository::new()),
            }
        }

        async fn key(&self, id: &str, account: &str, secret: &str, scopes: &[&str]) -> String {
            let issued = ApiKeyGenerator::test().from_secret(secret);
            let key = ApiKey::new(
                ApiKeyId::new(id).unwrap(),
                AccountId::new(account).unwrap(),
                id,
                &issued.hash,
                &issued.prefix,
            )
            .with_scopes(scopes.iter().copied());
            self.repository.create(key).await.unwrap();
            issued.secret
        }

        fn chain(&self, ownership: impl OwnershipLookup + 'static) -> GuardChain {
            self.chain_with(RouteRegistry::standard(), ownership)
        }

        fn chain_with(
            &self,
            routes: RouteRegistry,
            ownership: impl OwnershipLookup + 'static,
        ) -> GuardChain {
            GuardChain::standard(
                routes,
                ApiKeyPrincipalResolver::new(self.repository.clone(), Duration::from_secs(1)),
                self.limiter.clone(),
                Arc::new(ownership),
                Duration::from_secs(1),
            )
        }

        async fn charged(&self, id: &str, route: RouteId) -> Option<u32> {
            self.limiter
                .count(&ThrottleKey::new(ApiKeyId::new(id).unwrap(), route))
                .await
        }
    }

    fn owned_by(account: &'static str) -> MockOwnershipLookup {
        let mut lookup = MockOwnershipLookup::new();
        lookup
            .expect_owner_of()
            .returning(move |_, _| Ok(Some(AccountId::new(account).unwrap())));
        lookup
    }

    fn request(route: RouteId, secret: &str) -> GuardRequest {
        GuardRequest::new(route)
            .with_credential(Some(secret.to_string()))
            .with_subscriber("sub-1")
    }

    #[tokio::test]
    async fn test_admits_owner_with_scope() {
        let fixture = Fixture::new();
        let secret = fixture
            .key("acme-key", "acme", ACME_SECRET, &["subscriber:manage"])
            .await;
        let chain = fixture.chain(owned_by("acme"));

        let ctx = chain
            .admit(request(RouteId::GetSubscriber, &secret))
            .await
            .unwrap();

        assert_eq!(ctx.route, RouteId::GetSubscriber);
        assert_eq!(ctx.principal.account_id.as_str(), "acme");
        assert!(ctx.abilities.can(&ScopeGrant::read(ResourceType::Subscriber)));
        assert_eq!(ctx.resolved_ownership.get(&ResourceType::Subscriber), Some(&true));
        assert_eq!(ctx.owned_id(ResourceType::Subscriber), Some("sub-1"));
        assert_eq!(ctx.throttle.unwrap().remaining, 149);
    }

    #[tokio::test]
    async fn test_invalid_key_stops_before_throttle_and_ownership() {
        let fixture = Fixture::new();
        fixture
            .key("acme-key", "acme", ACME_SECRET, &["subscriber:manage"])
            .await;

        let mut lookup = MockOwnershipLookup::new();
        lookup.expect_owner_of().times(0);
        let chain = fixture.chain(lookup);

        let forged = format!("bsk_test_{}", "acmekey1-forged0000");
        let err = chain
            .admit(request(RouteId::GetSubscriber, &forged))
            .await
            .unwrap_err();

        assert!(matches!(err, GuardError::Unauthenticated { .. }));
        assert_eq!(fixture.charged("acme-key", RouteId::GetSubscriber).await, None);
    }

    #[tokio::test]
    async fn test_missing_credential_is_unauthenticated() {
        let fixture = Fixture::new();
        let mut lookup = MockOwnershipLookup::new();
        lookup.expect_owner_of().times(0);
        let chain = fixture.chain(lookup);

        let err = chain
            .admit(GuardRequest::new(RouteId::CountSubscribers))
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_foreign_subscriber_is_concealed() {
        let fixture = Fixture::new();
        let secret = fixture
            .key("globex-key", "globex", GLOBEX_SECRET, &["subscriber:manage"])
            .await;
        let chain = fixture.chain(owned_by("acme"));

        let err = chain
            .admit(request(RouteId::UpdateSubscriber, &secret))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GuardError::not_found(ResourceType::Subscriber, Some("sub-1"))
        );
    }

    #[tokio::test]
    async fn test_foreign_subscriber_without_concealment() {
        let fixture = Fixture::new();
        let secret = fixture
            .key("globex-key", "globex", GLOBEX_SECRET, &["subscriber:manage"])
            .await;
        let chain = fixture.chain(owned_by("acme")).with_concealment(false);

        let err = chain
            .admit(request(RouteId::UpdateSubscriber, &secret))
            .await
            .unwrap_err();

        assert_eq!(err, GuardError::not_owner(ResourceType::Subscriber, "sub-1"));
    }

    #[tokio::test]
    async fn test_requirements_are_conjunctive() {
        let fixture = Fixture::new();
        let secret = fixture
            .key("acme-key", "acme", ACME_SECRET, &["subscriber:manage"])
            .await;
        let chain = fixture.chain(owned_by("acme"));

        let err = chain
            .admit(
                request(RouteId::AddSubscriberToList, &secret)
                    .with_list(Some("list-1".to_string())),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GuardError::missing_scope(ScopeGrant::manage(ResourceType::List))
        );
    }

    #[tokio::test]
    async fn test_both_ownership_checks_run() {
        let fixture = Fixture::new();
        let secret = fixture
            .key("acme-key", "acme", ACME_SECRET, &["subscriber:manage", "list:manage"])
            .await;

        let mut lookup = MockOwnershipLookup::new();
        lookup
            .expect_owner_of()
            .with(eq(ResourceType::Subscriber), eq("sub-1"))
            .times(1)
            .returning(|_, _| Ok(None));
        lookup
            .expect_owner_of()
            .with(eq(ResourceType::List), eq("list-1"))
            .times(1)
            .returning(|_, _| Ok(Some(AccountId::new("globex").unwrap())));
        let chain = fixture.chain(lookup).with_concealment(false);

        let err = chain
            .admit(
                request(RouteId::RemoveSubscriberFromList, &secret)
                    .with_list(Some("list-1".to_string())),
            )
            .await
            .unwrap_err();

        // Declaration order decides which failure is reported
        assert_eq!(
            err,
            GuardError::not_found(ResourceType::Subscriber, Some("sub-1"))
        );
    }

    #[tokio::test]
    async fn test_missing_list_id_is_not_found() {
        let fixture = Fixture::new();
        let secret = fixture
            .key("acme-key", "acme", ACME_SECRET, &["subscriber:manage", "list:manage"])
            .await;

        let mut lookup = MockOwnershipLookup::new();
        lookup
            .expect_owner_of()
            .with(eq(ResourceType::Subscriber), eq("sub-1"))
            .times(1)
            .returning(|_, _| Ok(Some(AccountId::new("acme").unwrap())));
        let chain = fixture.chain(lookup);

        let err = chain
            .admit(request(RouteId::AddSubscriberToList, &secret))
            .await
            .unwrap_err();

        assert_eq!(err, GuardError::not_found(ResourceType::List, None));
    }

    #[tokio::test]
    async fn test_collection_routes_skip_ownership() {
        let fixture = Fixture::new();
        let secret = fixture
            .key("acme-key", "acme", ACME_SECRET, &["subscriber:read"])
            .await;

        let mut lookup = MockOwnershipLookup::new();
        lookup.expect_owner_of().times(0);
        let chain = fixture.chain(lookup);

        let ctx = chain
            .admit(GuardRequest::new(RouteId::ListSubscribers).with_credential(Some(secret)))
            .await
            .unwrap();

        assert!(ctx.resolved_ownership.is_empty());
        assert_eq!(ctx.throttle.unwrap().limit, 700);
    }

    #[tokio::test]
    async fn test_rate_limited_call_skips_later_guards() {
        let fixture = Fixture::new();
        let secret = fixture
            .key("acme-key", "acme", ACME_SECRET, &["subscriber:read"])
            .await;

        let mut lookup = MockOwnershipLookup::new();
        lookup
            .expect_owner_of()
            .times(1)
            .returning(|_, _| Ok(Some(AccountId::new("acme").unwrap())));
        let routes = RouteRegistry::standard()
            .with_throttle(RouteId::GetSubscriber, ThrottlePolicy::new(1, 60));
        let chain = fixture.chain_with(routes, lookup);

        chain
            .admit(request(RouteId::GetSubscriber, &secret))
            .await
            .unwrap();
        let err = chain
            .admit(request(RouteId::GetSubscriber, &secret))
            .await
            .unwrap_err();

        assert!(matches!(err, GuardError::RateLimited { limit: 1, .. }));
    }

    #[derive(Debug)]
    struct StalledLookup {
        entered: Arc<Notify>,
    }

    #[async_trait]
    impl OwnershipLookup for StalledLookup {
        async fn owner_of(
            &self,
            _resource_type: ResourceType,
            _resource_id: &str,
        ) -> Result<Option<AccountId>, DomainError> {
            self.entered.notify_one();
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_timeout_is_unavailable_and_stays_charged() {
        let fixture = Fixture::new();
        let secret = fixture
            .key("acme-key", "acme", ACME_SECRET, &["subscriber:read"])
            .await;
        let chain = fixture.chain(StalledLookup {
            entered: Arc::new(Notify::new()),
        });

        let err = chain
            .admit(request(RouteId::GetSubscriber, &secret))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GuardError::unavailable("ownership lookup", "lookup timed out")
        );
        assert_eq!(fixture.charged("acme-key", RouteId::GetSubscriber).await, Some(1));
    }

    #[tokio::test]
    async fn test_aborted_request_keeps_throttle_charge() {
        let fixture = Fixture::new();
        let secret = fixture
            .key("acme-key", "acme", ACME_SECRET, &["subscriber:read"])
            .await;
        let entered = Arc::new(Notify::new());
        let chain = fixture.chain(StalledLookup {
            entered: entered.clone(),
        });

        let handle = tokio::spawn(async move {
            chain.admit(request(RouteId::GetSubscriber, &secret)).await
        });

        entered.notified().await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        assert_eq!(fixture.charged("acme-key", RouteId::GetSubscriber).await, Some(1));
    }
}
