//! Infrastructure layer - Implementations of the domain traits

pub mod api_key;
pub mod guard;
pub mod logging;
pub mod observability;
pub mod subscriber;
pub mod throttle;
