//! Guard chain domain types
//!
//! Route declarations, the per-request guard context and the error taxonomy
//! shared by every guard.

mod context;
mod error;
mod route;

pub use context::{GuardContext, GuardRequest, GuardStage, RequestContext};
pub use error::{ForbiddenReason, GuardError};
pub use route::{RouteId, RouteRegistry, RouteSpec};
