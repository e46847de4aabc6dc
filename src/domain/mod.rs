//! Domain layer
//!
//! Entities, value objects and the traits the infrastructure layer implements.

pub mod account;
pub mod api_key;
pub mod authorization;
pub mod error;
pub mod guard;
pub mod ownership;
pub mod subscriber;
pub mod throttle;

pub use account::AccountId;
pub use api_key::{ApiKey, ApiKeyId, ApiKeyRepository, ApiKeyStatus};
pub use authorization::{AbilitySet, Action, PolicyDecision, Principal, ResourceType, ScopeGrant};
pub use error::DomainError;
pub use guard::{GuardError, GuardRequest, GuardStage, RequestContext, RouteId, RouteRegistry};
pub use ownership::{OwnershipFact, OwnershipLookup};
pub use throttle::{ThrottleKey, ThrottlePolicy, ThrottleStatus};
