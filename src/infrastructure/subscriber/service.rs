//! Subscriber API service
//!
//! Business operations behind the guarded routes. Every operation takes the
//! [`RequestContext`] produced by the guard chain and works on the resource
//! ids it confirmed; nothing here re-resolves keys or ownership.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::authorization::ResourceType;
use crate::domain::guard::RequestContext;
use crate::domain::subscriber::{
    EmailConsent, EmailStatus, List, Page, Subscriber, SubscriberList, SubscriberRepository,
};
use crate::domain::{AccountId, DomainError};

/// Partial update of a subscriber's profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriberPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl SubscriberPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }
}

#[derive(Clone)]
pub struct SubscriberApiService {
    repository: Arc<dyn SubscriberRepository>,
}

impl std::fmt::Debug for SubscriberApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberApiService").finish_non_exhaustive()
    }
}

impl SubscriberApiService {
    pub fn new(repository: Arc<dyn SubscriberRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_subscriber(&self, ctx: &RequestContext) -> Result<Subscriber, DomainError> {
        self.owned_subscriber(ctx).await
    }

    pub async fn list_subscribers(
        &self,
        ctx: &RequestContext,
        page: Page,
    ) -> Result<Vec<Subscriber>, DomainError> {
        self.repository
            .list_by_account(&ctx.principal.account_id, page)
            .await
    }

    pub async fn count_subscribers(&self, ctx: &RequestContext) -> Result<u64, DomainError> {
        self.repository
            .count_by_account(&ctx.principal.account_id)
            .await
    }

    pub async fn update_subscriber(
        &self,
        ctx: &RequestContext,
        patch: SubscriberPatch,
    ) -> Result<Subscriber, DomainError> {
        let mut subscriber = self.owned_subscriber(ctx).await?;
        if patch.is_empty() {
            return Ok(subscriber);
        }

        if let Some(email) = patch.email {
            subscriber.email = email;
        }
        if let Some(first_name) = patch.first_name {
            subscriber.first_name = Some(first_name);
        }
        if let Some(last_name) = patch.last_name {
            subscriber.last_name = Some(last_name);
        }
        subscriber.touch();

        info!(subscriber_id = %subscriber.id, "Updating subscriber");
        self.repository.save(subscriber).await
    }

    pub async fn update_email_status(
        &self,
        ctx: &RequestContext,
        email_status: EmailStatus,
    ) -> Result<Subscriber, DomainError> {
        let mut subscriber = self.owned_subscriber(ctx).await?;
        subscriber.email_status = email_status;
        subscriber.touch();

        info!(subscriber_id = %subscriber.id, status = ?email_status, "Updating email status");
        self.repository.save(subscriber).await
    }

    pub async fn subscriber_lists(
        &self,
        ctx: &RequestContext,
        page: Page,
    ) -> Result<Vec<SubscriberList>, DomainError> {
        let subscriber_id = owned_id(ctx, ResourceType::Subscriber)?;
        self.repository.memberships(subscriber_id, page).await
    }

    /// Conflict if the subscriber is already on the list
    pub async fn add_to_list(
        &self,
        ctx: &RequestContext,
        email_consent: EmailConsent,
    ) -> Result<SubscriberList, DomainError> {
        let subscriber_id = owned_id(ctx, ResourceType::Subscriber)?;
        let list_id = owned_id(ctx, ResourceType::List)?;

        info!(subscriber_id = %subscriber_id, list_id = %list_id, "Adding subscriber to list");
        self.repository
            .create_membership(SubscriberList::new(subscriber_id, list_id, email_consent))
            .await
    }

    pub async fn remove_from_list(&self, ctx: &RequestContext) -> Result<(), DomainError> {
        let subscriber_id = owned_id(ctx, ResourceType::Subscriber)?;
        let list_id = owned_id(ctx, ResourceType::List)?;

        if !self
            .repository
            .delete_membership(subscriber_id, list_id)
            .await?
        {
            return Err(not_a_member(subscriber_id, list_id));
        }

        info!(subscriber_id = %subscriber_id, list_id = %list_id, "Removed subscriber from list");
        Ok(())
    }

    pub async fn update_email_consent(
        &self,
        ctx: &RequestContext,
        email_consent: EmailConsent,
    ) -> Result<SubscriberList, DomainError> {
        let subscriber_id = owned_id(ctx, ResourceType::Subscriber)?;
        let list_id = owned_id(ctx, ResourceType::List)?;

        let mut membership = self
            .repository
            .find_membership(subscriber_id, list_id)
            .await?
            .ok_or_else(|| not_a_member(subscriber_id, list_id))?;

        membership.email_consent = email_consent;
        membership.updated_at = chrono::Utc::now();

        debug!(subscriber_id = %subscriber_id, list_id = %list_id, consent = ?email_consent, "Updating consent");
        self.repository.save_membership(membership).await
    }

    /// Unguarded provisioning used for seeding
    pub async fn create_subscriber(
        &self,
        account_id: AccountId,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Subscriber, DomainError> {
        self.repository
            .save(Subscriber::new(account_id, email).with_name(first_name, last_name))
            .await
    }

    /// Unguarded provisioning used for seeding
    pub async fn create_list(&self, account_id: AccountId, name: &str) -> Result<List, DomainError> {
        self.repository.save_list(List::new(account_id, name)).await
    }

    async fn owned_subscriber(&self, ctx: &RequestContext) -> Result<Subscriber, DomainError> {
        let subscriber_id = owned_id(ctx, ResourceType::Subscriber)?;
        self.repository
            .get(subscriber_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Subscriber '{}' not found", subscriber_id)))
    }
}

fn owned_id(ctx: &RequestContext, resource_type: ResourceType) -> Result<&str, DomainError> {
    ctx.owned_id(resource_type).ok_or_else(|| {
        DomainError::internal(format!(
            "route '{}' was admitted without a confirmed {}",
            ctx.route, resource_type
        ))
    })
}

fn not_a_member(subscriber_id: &str, list_id: &str) -> DomainError {
    DomainError::not_found(format!(
        "Subscriber '{}' is not on list '{}'",
        subscriber_id, list_id
    ))
}
