//! Subscriber infrastructure
//!
//! In-memory persistence and the business service behind the guarded routes.

mod repository;
mod service;

pub use repository::InMemorySubscriberRepository;
pub use service::{SubscriberApiService, SubscriberPatch};
