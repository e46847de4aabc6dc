//! Per-route guard declarations
//!
//! Each guarded endpoint is identified by a [`RouteId`] and described by a
//! [`RouteSpec`]: which resources it addresses, which grants it requires and
//! which throttle budget it draws from. The table is built once at startup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::authorization::{PolicyRequirement, ResourceType, ScopeGrant};
use crate::domain::throttle::ThrottlePolicy;

const SUBSCRIBER_READ: ScopeGrant = ScopeGrant::read(ResourceType::Subscriber);
const SUBSCRIBER_MANAGE: ScopeGrant = ScopeGrant::manage(ResourceType::Subscriber);
const LIST_READ: ScopeGrant = ScopeGrant::read(ResourceType::List);
const LIST_MANAGE: ScopeGrant = ScopeGrant::manage(ResourceType::List);

/// Guarded endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteId {
    GetSubscriber,
    ListSubscribers,
    CountSubscribers,
    UpdateSubscriber,
    UpdateEmailStatus,
    GetSubscriberLists,
    AddSubscriberToList,
    RemoveSubscriberFromList,
    UpdateEmailConsent,
}

impl RouteId {
    pub const ALL: [RouteId; 9] = [
        Self::GetSubscriber,
        Self::ListSubscribers,
        Self::CountSubscribers,
        Self::UpdateSubscriber,
        Self::UpdateEmailStatus,
        Self::GetSubscriberLists,
        Self::AddSubscriberToList,
        Self::RemoveSubscriberFromList,
        Self::UpdateEmailConsent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetSubscriber => "get_subscriber",
            Self::ListSubscribers => "list_subscribers",
            Self::CountSubscribers => "count_subscribers",
            Self::UpdateSubscriber => "update_subscriber",
            Self::UpdateEmailStatus => "update_email_status",
            Self::GetSubscriberLists => "get_subscriber_lists",
            Self::AddSubscriberToList => "add_subscriber_to_list",
            Self::RemoveSubscriberFromList => "remove_subscriber_from_list",
            Self::UpdateEmailConsent => "update_email_consent",
        }
    }
}

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guard declaration for one route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    pub id: RouteId,
    pub method: &'static str,
    pub path: &'static str,
    /// Resources whose ownership must be confirmed, in check order
    pub resources: &'static [ResourceType],
    /// Grants required, evaluated in order
    pub requirements: &'static [PolicyRequirement],
    pub throttle: ThrottlePolicy,
}

impl RouteSpec {
    pub fn is_resource_scoped(&self) -> bool {
        !self.resources.is_empty()
    }
}

const STANDARD_ROUTES: [RouteSpec; 9] = [
    RouteSpec {
        id: RouteId::GetSubscriber,
        method: "GET",
        path: "/api/subscriber/{subscriber_id}",
        resources: &[ResourceType::Subscriber],
        requirements: &[SUBSCRIBER_READ],
        throttle: ThrottlePolicy::DEFAULT,
    },
    RouteSpec {
        id: RouteId::ListSubscribers,
        method: "GET",
        path: "/api/subscriber",
        resources: &[],
        requirements: &[SUBSCRIBER_READ],
        throttle: ThrottlePolicy::BULK,
    },
    RouteSpec {
        id: RouteId::CountSubscribers,
        method: "GET",
        path: "/api/subscriber/count",
        resources: &[],
        requirements: &[SUBSCRIBER_READ],
        throttle: ThrottlePolicy::DEFAULT,
    },
    RouteSpec {
        id: RouteId::UpdateSubscriber,
        method: "PATCH",
        path: "/api/subscriber/{subscriber_id}",
        resources: &[ResourceType::Subscriber],
        requirements: &[SUBSCRIBER_MANAGE],
        throttle: ThrottlePolicy::BULK,
    },
    RouteSpec {
        id: RouteId::UpdateEmailStatus,
        method: "PATCH",
        path: "/api/subscriber/{subscriber_id}/email-status",
        resources: &[ResourceType::Subscriber],
        requirements: &[SUBSCRIBER_MANAGE],
        throttle: ThrottlePolicy::DEFAULT,
    },
    RouteSpec {
        id: RouteId::GetSubscriberLists,
        method: "GET",
        path: "/api/subscriber/{subscriber_id}/list",
        resources: &[ResourceType::Subscriber],
        requirements: &[SUBSCRIBER_READ, LIST_READ],
        throttle: ThrottlePolicy::DEFAULT,
    },
    RouteSpec {
        id: RouteId::AddSubscriberToList,
        method: "POST",
        path: "/api/subscriber/{subscriber_id}/list",
        resources: &[ResourceType::Subscriber, ResourceType::List],
        requirements: &[SUBSCRIBER_MANAGE, LIST_MANAGE],
        throttle: ThrottlePolicy::DEFAULT,
    },
    RouteSpec {
        id: RouteId::RemoveSubscriberFromList,
        method: "DELETE",
        path: "/api/subscriber/{subscriber_id}/list",
        resources: &[ResourceType::Subscriber, ResourceType::List],
        requirements: &[SUBSCRIBER_MANAGE, LIST_MANAGE],
        throttle: ThrottlePolicy::DEFAULT,
    },
    RouteSpec {
        id: RouteId::UpdateEmailConsent,
        method: "PATCH",
        path: "/api/subscriber/{subscriber_id}/list",
        resources: &[ResourceType::Subscriber, ResourceType::List],
        requirements: &[SUBSCRIBER_MANAGE, LIST_MANAGE],
        throttle: ThrottlePolicy::DEFAULT,
    },
];

/// Lookup table of route declarations
#[derive(Debug, Clone)]
pub struct RouteRegistry {
    routes: HashMap<RouteId, RouteSpec>,
}

impl RouteRegistry {
    /// The subscriber API route table
    pub fn standard() -> Self {
        Self {
            routes: STANDARD_ROUTES.iter().map(|spec| (spec.id, *spec)).collect(),
        }
    }

    /// Replace a route's throttle budget
    pub fn with_throttle(mut self, id: RouteId, policy: ThrottlePolicy) -> Self {
        if let Some(spec) = self.routes.get_mut(&id) {
            spec.throttle = policy;
        }
        self
    }

    pub fn get(&self, id: RouteId) -> Option<&RouteSpec> {
        self.routes.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteSpec> {
        self.routes.values()
    }
}

impl Default for RouteRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_is_declared() {
        let registry = RouteRegistry::standard();
        for id in RouteId::ALL {
            let spec = registry.get(id).expect("route declared");
            assert_eq!(spec.id, id);
            assert!(!spec.requirements.is_empty());
        }
    }

    #[test]
    fn test_bulk_routes_use_bulk_budget() {
        let registry = RouteRegistry::standard();
        assert_eq!(
            registry.get(RouteId::ListSubscribers).unwrap().throttle,
            ThrottlePolicy::new(700, 60)
        );
        assert_eq!(
            registry.get(RouteId::UpdateSubscriber).unwrap().throttle,
            ThrottlePolicy::new(700, 60)
        );
        assert_eq!(
            registry.get(RouteId::GetSubscriber).unwrap().throttle,
            ThrottlePolicy::new(150, 60)
        );
    }

    #[test]
    fn test_list_association_routes_require_both_resources() {
        let registry = RouteRegistry::standard();
        for id in [
            RouteId::AddSubscriberToList,
            RouteId::RemoveSubscriberFromList,
            RouteId::UpdateEmailConsent,
        ] {
            let spec = registry.get(id).unwrap();
            assert_eq!(spec.resources, &[ResourceType::Subscriber, ResourceType::List]);
            assert_eq!(spec.requirements, &[SUBSCRIBER_MANAGE, LIST_MANAGE]);
        }
    }

    #[test]
    fn test_collection_routes_are_not_resource_scoped() {
        let registry = RouteRegistry::standard();
        assert!(!registry.get(RouteId::ListSubscribers).unwrap().is_resource_scoped());
        assert!(!registry.get(RouteId::CountSubscribers).unwrap().is_resource_scoped());
        assert!(registry.get(RouteId::GetSubscriberLists).unwrap().is_resource_scoped());
    }

    #[test]
    fn test_throttle_override() {
        let registry =
            RouteRegistry::standard().with_throttle(RouteId::CountSubscribers, ThrottlePolicy::new(5, 10));
        assert_eq!(
            registry.get(RouteId::CountSubscribers).unwrap().throttle,
            ThrottlePolicy::new(5, 10)
        );
    }

    #[test]
    fn test_route_id_names() {
        assert_eq!(RouteId::UpdateEmailConsent.to_string(), "update_email_consent");
        let parsed: RouteId = serde_json::from_str("\"count_subscribers\"").unwrap();
        assert_eq!(parsed, RouteId::CountSubscribers);
    }
}
