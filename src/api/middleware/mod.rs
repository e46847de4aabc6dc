//! API middleware components

pub mod auth;
pub mod metrics;

pub use auth::ApiCredential;
pub use metrics::metrics_middleware;
