//! Policy evaluation
//!
//! A route declares an ordered list of [`PolicyRequirement`]s. The request is
//! allowed only when the caller's abilities satisfy every one of them.

use super::ability::AbilitySet;
use super::scope::ScopeGrant;

/// A grant a route requires from the caller
pub type PolicyRequirement = ScopeGrant;

/// Outcome of evaluating a requirement list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    /// First requirement (in declaration order) the caller does not hold
    Deny(PolicyRequirement),
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Evaluate requirements against compiled abilities
pub fn evaluate(abilities: &AbilitySet, requirements: &[PolicyRequirement]) -> PolicyDecision {
    requirements
        .iter()
        .find(|requirement| !abilities.can(requirement))
        .map_or(PolicyDecision::Allow, |missing| PolicyDecision::Deny(*missing))
}
