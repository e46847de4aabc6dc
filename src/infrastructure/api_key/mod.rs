//! API Key infrastructure implementations
//!
//! Key generation, storage, credential caching, principal resolution and
//! lifecycle management.

mod cached_repository;
mod generator;
mod repository;
mod resolver;
mod service;

pub use cached_repository::CachedApiKeyRepository;
pub use generator::{hash_key, ApiKeyGenerator, IssuedKey, KeyEnvironment};
pub use repository::InMemoryApiKeyRepository;
pub use resolver::ApiKeyPrincipalResolver;
pub use service::{ApiKeyService, IssuedApiKey};
