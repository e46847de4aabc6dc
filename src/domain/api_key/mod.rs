//! API Key domain
//!
//! Stored credentials: who a key belongs to, which raw scopes it was issued
//! with and whether it can still authenticate requests.

mod entity;
mod repository;
mod validation;

pub use entity::{ApiKey, ApiKeyId, ApiKeyStatus};
pub use repository::ApiKeyRepository;
pub use validation::{validate_api_key_id, validate_identifier, IdentifierValidationError};

#[cfg(test)]
pub use repository::mock;
