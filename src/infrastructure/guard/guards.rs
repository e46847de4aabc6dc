//! The four request guards
//!
//! Every guard takes the context by value and hands it back enriched, or
//! fails with the [`GuardError`] that ends the chain.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

use crate::domain::authorization::{evaluate, PolicyDecision, Principal, ResourceType};
use crate::domain::guard::{GuardContext, GuardError, GuardStage};
use crate::domain::ownership::{OwnershipFact, OwnershipLookup};
use crate::domain::throttle::ThrottleKey;
use crate::domain::AccountId;
use crate::infrastructure::api_key::ApiKeyPrincipalResolver;
use crate::infrastructure::throttle::ThrottleLimiter;

/// One step of the guard chain
#[async_trait]
pub trait Guard: Send + Sync + std::fmt::Debug {
    /// Label used in logs and metrics
    fn name(&self) -> &'static str;

    /// Stage the context reaches once this guard passes
    fn stage(&self) -> GuardStage;

    fn applies(&self, _ctx: &GuardContext) -> bool {
        true
    }

    async fn check(&self, ctx: GuardContext) -> Result<GuardContext, GuardError>;
}

fn require_principal(ctx: &GuardContext) -> Result<&Principal, GuardError> {
    ctx.principal
        .as_ref()
        .ok_or_else(|| GuardError::unauthenticated("Request has not been authenticated"))
}

/// Resolves the presented API key into a principal
#[derive(Debug, Clone)]
pub struct AuthenticationGuard {
    resolver: ApiKeyPrincipalResolver,
}

impl AuthenticationGuard {
    pub fn new(resolver: ApiKeyPrincipalResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Guard for AuthenticationGuard {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn stage(&self) -> GuardStage {
        GuardStage::Authenticated
    }

    async fn check(&self, mut ctx: GuardContext) -> Result<GuardContext, GuardError> {
        let principal = self
            .resolver
            .resolve(ctx.request.credential.as_deref())
            .await?;

        debug!(
            account_id = %principal.account_id,
            api_key_id = %principal.api_key_id,
            "Principal resolved"
        );

        ctx.principal = Some(principal);
        Ok(ctx)
    }
}

/// Charges the call against the route's throttle window
#[derive(Debug, Clone)]
pub struct ThrottleGuard {
    limiter: Arc<ThrottleLimiter>,
}

impl ThrottleGuard {
    pub fn new(limiter: Arc<ThrottleLimiter>) -> Self {
        Self { limiter }
    }
}

#[async_trait]
impl Guard for ThrottleGuard {
    fn name(&self) -> &'static str {
        "throttle"
    }

    fn stage(&self) -> GuardStage {
        GuardStage::ThrottleChecked
    }

    async fn check(&self, mut ctx: GuardContext) -> Result<GuardContext, GuardError> {
        let key = ThrottleKey::new(require_principal(&ctx)?.api_key_id.clone(), ctx.spec.id);
        let status = self.limiter.check(&key, ctx.spec.throttle).await?;

        ctx.throttle = Some(status);
        Ok(ctx)
    }
}

/// Confirms the caller's account owns every resource the route addresses
///
/// All lookups run to completion; the first failure in declaration order is
/// reported.
#[derive(Clone)]
pub struct OwnershipGuard {
    lookup: Arc<dyn OwnershipLookup>,
    lookup_timeout: Duration,
}

impl std::fmt::Debug for OwnershipGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnershipGuard")
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

impl OwnershipGuard {
    pub fn new(lookup: Arc<dyn OwnershipLookup>, lookup_timeout: Duration) -> Self {
        Self {
            lookup,
            lookup_timeout,
        }
    }

    async fn confirm(
        &self,
        account_id: &AccountId,
        resource_type: ResourceType,
        resource_id: Option<&str>,
    ) -> Result<OwnershipFact, GuardError> {
        let resource_id =
            resource_id.ok_or_else(|| GuardError::not_found(resource_type, None))?;

        let owner = tokio::time::timeout(
            self.lookup_timeout,
            self.lookup.owner_of(resource_type, resource_id),
        )
        .await
        .map_err(|_| GuardError::unavailable("ownership lookup", "lookup timed out"))?
        .map_err(|e| GuardError::unavailable("ownership lookup", e.to_string()))?
        .ok_or_else(|| GuardError::not_found(resource_type, Some(resource_id)))?;

        if &owner != account_id {
            debug!(
                resource_type = %resource_type,
                resource_id = %resource_id,
                "Resource belongs to another account"
            );
            return Err(GuardError::not_owner(resource_type, resource_id));
        }

        Ok(OwnershipFact {
            resource_type,
            resource_id: resource_id.to_string(),
            account_id: owner,
        })
    }
}

#[async_trait]
impl Guard for OwnershipGuard {
    fn name(&self) -> &'static str {
        "ownership"
    }

    fn stage(&self) -> GuardStage {
        GuardStage::OwnershipChecked
    }

    fn applies(&self, ctx: &GuardContext) -> bool {
        ctx.spec.is_resource_scoped()
    }

    async fn check(&self, mut ctx: GuardContext) -> Result<GuardContext, GuardError> {
        let account_id = require_principal(&ctx)?.account_id.clone();

        let outcomes = join_all(ctx.spec.resources.iter().map(|resource_type| {
            self.confirm(
                &account_id,
                *resource_type,
                ctx.request.resource_id(*resource_type),
            )
        }))
        .await;

        let facts = outcomes.into_iter().collect::<Result<Vec<_>, _>>()?;
        ctx.ownership = facts;
        Ok(ctx)
    }
}

/// Evaluates the route's requirements against the caller's abilities
#[derive(Debug, Clone, Default)]
pub struct PolicyGuard;

#[async_trait]
impl Guard for PolicyGuard {
    fn name(&self) -> &'static str {
        "policy"
    }

    fn stage(&self) -> GuardStage {
        GuardStage::PolicyChecked
    }

    async fn check(&self, ctx: GuardContext) -> Result<GuardContext, GuardError> {
        let abilities = require_principal(&ctx)?.abilities();

        match evaluate(&abilities, ctx.spec.requirements) {
            PolicyDecision::Allow => Ok(ctx),
            PolicyDecision::Deny(missing) => Err(GuardError::missing_scope(missing)),
        }
    }
}
