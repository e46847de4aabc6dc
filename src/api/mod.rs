//! API layer - HTTP endpoints and middleware

pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod subscriber;
pub mod types;

pub use middleware::ApiCredential;
pub use router::create_router;
pub use state::AppState;
