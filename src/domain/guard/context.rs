use std::collections::HashMap;

use serde::Serialize;

use super::route::{RouteId, RouteSpec};
use crate::domain::authorization::{AbilitySet, Principal, ResourceType};
use crate::domain::ownership::OwnershipFact;
use crate::domain::throttle::ThrottleStatus;

/// Progress of a request through the guard chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardStage {
    Start,
    Authenticated,
    ThrottleChecked,
    OwnershipChecked,
    PolicyChecked,
    Admitted,
}

/// What an inbound request presents to the guard chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRequest {
    pub route: RouteId,
    pub credential: Option<String>,
    pub subscriber_id: Option<String>,
    pub list_id: Option<String>,
}

impl GuardRequest {
    pub fn new(route: RouteId) -> Self {
        Self {
            route,
            credential: None,
            subscriber_id: None,
            list_id: None,
        }
    }

    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_subscriber(mut self, subscriber_id: impl Into<String>) -> Self {
        self.subscriber_id = Some(subscriber_id.into());
        self
    }

    pub fn with_list(mut self, list_id: Option<String>) -> Self {
        self.list_id = list_id;
        self
    }

    pub fn resource_id(&self, resource_type: ResourceType) -> Option<&str> {
        match resource_type {
            ResourceType::Subscriber => self.subscriber_id.as_deref(),
            ResourceType::List => self.list_id.as_deref(),
        }
    }
}

/// State threaded through the guards; each guard fills in its part
#[derive(Debug, Clone)]
pub struct GuardContext {
    pub request: GuardRequest,
    pub spec: RouteSpec,
    pub stage: GuardStage,
    pub principal: Option<Principal>,
    pub ownership: Vec<OwnershipFact>,
    pub throttle: Option<ThrottleStatus>,
}

impl GuardContext {
    pub fn new(request: GuardRequest, spec: RouteSpec) -> Self {
        Self {
            request,
            spec,
            stage: GuardStage::Start,
            principal: None,
            ownership: Vec::new(),
            throttle: None,
        }
    }

    /// Finish the chain. `None` if no principal was ever attached.
    pub fn admit(self) -> Option<RequestContext> {
        let principal = self.principal?;
        let abilities = principal.abilities();
        let resolved_ownership = self
            .spec
            .resources
            .iter()
            .map(|resource_type| {
                let owned = self
                    .ownership
                    .iter()
                    .any(|fact| fact.resource_type == *resource_type);
                (*resource_type, owned)
            })
            .collect();

        Some(RequestContext {
            route: self.spec.id,
            principal,
            abilities,
            resolved_ownership,
            owned: self.ownership,
            throttle: self.throttle,
        })
    }
}

/// Context handed to business logic once a request is admitted
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub route: RouteId,
    pub principal: Principal,
    pub abilities: AbilitySet,
    pub resolved_ownership: HashMap<ResourceType, bool>,
    pub owned: Vec<OwnershipFact>,
    pub throttle: Option<ThrottleStatus>,
}

impl RequestContext {
    /// Id of an ownership-confirmed resource of the given type
    pub fn owned_id(&self, resource_type: ResourceType) -> Option<&str> {
        self.owned
            .iter()
            .find(|fact| fact.resource_type == resource_type)
            .map(|fact| fact.resource_id.as_str())
    }
}
