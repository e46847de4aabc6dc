//! Authorization domain
//!
//! Scope grammar, ability compilation and the policy evaluator. Everything in
//! here is pure: no I/O, no shared state.

mod ability;
mod policy;
mod principal;
pub mod scope;

pub use ability::{compile, AbilitySet};
pub use policy::{evaluate, PolicyDecision, PolicyRequirement};
pub use principal::Principal;
pub use scope::{Action, ResourceType, ScopeGrant};
