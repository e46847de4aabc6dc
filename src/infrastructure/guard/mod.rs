//! Guard chain infrastructure
//!
//! Concrete guards and the orchestrator that runs them in front of every
//! subscriber route.

mod chain;
mod guards;

pub use chain::GuardChain;
pub use guards::{AuthenticationGuard, Guard, OwnershipGuard, PolicyGuard, ThrottleGuard};
