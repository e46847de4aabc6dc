//! Scope grammar: `resourceType:action`

use std::fmt;

use serde::{Deserialize, Serialize};

pub const SUBSCRIBER_READ: &str = "subscriber:read";
pub const SUBSCRIBER_MANAGE: &str = "subscriber:manage";
pub const LIST_READ: &str = "list:read";
pub const LIST_MANAGE: &str = "list:manage";

/// What a grant allows on a resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    /// Implies `Read` on the same resource type
    Manage,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Manage => "manage",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "read" => Some(Self::Read),
            "manage" => Some(Self::Manage),
            _ => None,
        }
    }
}

/// Resource types protected by scopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Subscriber,
    List,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subscriber => "subscriber",
            Self::List => "list",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "subscriber" => Some(Self::Subscriber),
            "list" => Some(Self::List),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `(action, resource type)` grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeGrant {
    pub resource_type: ResourceType,
    pub action: Action,
}

impl ScopeGrant {
    pub const fn new(action: Action, resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            action,
        }
    }

    pub const fn read(resource_type: ResourceType) -> Self {
        Self::new(Action::Read, resource_type)
    }

    pub const fn manage(resource_type: ResourceType) -> Self {
        Self::new(Action::Manage, resource_type)
    }

    /// Parse a raw scope string. Returns `None` for anything not in the grammar.
    pub fn parse(raw: &str) -> Option<Self> {
        let (resource, action) = raw.split_once(':')?;
        Some(Self::new(Action::parse(action)?, ResourceType::parse(resource)?))
    }

    /// The grant implied by this one, if any
    pub fn implied(&self) -> Option<Self> {
        match self.action {
            Action::Manage => Some(Self::read(self.resource_type)),
            Action::Read => None,
        }
    }
}

impl fmt::Display for ScopeGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type.as_str(), self.action.as_str())
    }
}
