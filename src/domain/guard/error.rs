use thiserror::Error;

use crate::domain::authorization::{ResourceType, ScopeGrant};

/// Why an authenticated caller was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForbiddenReason {
    MissingScope(ScopeGrant),
    NotOwner {
        resource_type: ResourceType,
        resource_id: String,
    },
}

impl std::fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingScope(grant) => write!(f, "missing required scope '{}'", grant),
            Self::NotOwner {
                resource_type,
                resource_id,
            } => write!(
                f,
                "{} '{}' belongs to another account",
                resource_type, resource_id
            ),
        }
    }
}

/// Guard chain failures. Each one terminates the chain.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("Unauthenticated: {reason}")]
    Unauthenticated { reason: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: ForbiddenReason },

    #[error("Rate limit exceeded: {limit} requests per window, retry in {retry_after_secs}s")]
    RateLimited { limit: u32, retry_after_secs: u64 },

    #[error("{resource_type} not found")]
    ResourceNotFound {
        resource_type: ResourceType,
        resource_id: Option<String>,
    },

    #[error("{component} unavailable: {message}")]
    Unavailable {
        component: &'static str,
        message: String,
    },
}

impl GuardError {
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Unauthenticated {
            reason: reason.into(),
        }
    }

    pub fn missing_scope(grant: ScopeGrant) -> Self {
        Self::Forbidden {
            reason: ForbiddenReason::MissingScope(grant),
        }
    }

    pub fn not_owner(resource_type: ResourceType, resource_id: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: ForbiddenReason::NotOwner {
                resource_type,
                resource_id: resource_id.into(),
            },
        }
    }

    pub fn not_found(resource_type: ResourceType, resource_id: Option<&str>) -> Self {
        Self::ResourceNotFound {
            resource_type,
            resource_id: resource_id.map(str::to_string),
        }
    }

    pub fn unavailable(component: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            component,
            message: message.into(),
        }
    }

    /// Stable label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated { .. } => "unauthenticated",
            Self::Forbidden { .. } => "forbidden",
            Self::RateLimited { .. } => "rate_limited",
            Self::ResourceNotFound { .. } => "resource_not_found",
            Self::Unavailable { .. } => "unavailable",
        }
    }

    /// Only `Unavailable` is safe for a client to retry unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_messages() {
        let err = GuardError::missing_scope(ScopeGrant::manage(ResourceType::List));
        assert_eq!(err.to_string(), "Forbidden: missing required scope 'list:manage'");

        let err = GuardError::not_owner(ResourceType::Subscriber, "sub-1");
        assert_eq!(
            err.to_string(),
            "Forbidden: subscriber 'sub-1' belongs to another account"
        );
    }

    #[test]
    fn test_not_found_message_omits_id() {
        let err = GuardError::not_found(ResourceType::List, Some("list-9"));
        assert_eq!(err.to_string(), "list not found");
    }

    #[test]
    fn test_kinds_and_retryability() {
        assert_eq!(GuardError::unauthenticated("x").kind(), "unauthenticated");
        assert!(!GuardError::unauthenticated("x").is_retryable());
        assert!(GuardError::unavailable("credential store", "timeout").is_retryable());
        assert!(
            !GuardError::RateLimited {
                limit: 1,
                retry_after_secs: 5
            }
            .is_retryable()
        );
    }
}
