//! Identifier validation shared by API keys and accounts

use thiserror::Error;

/// Errors that can occur while validating an identifier
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IdentifierValidationError {
    #[error("{kind} ID cannot be empty")]
    Empty { kind: &'static str },

    #[error("{kind} ID exceeds maximum length of {max} characters")]
    TooLong { kind: &'static str, max: usize },

    #[error("{kind} ID must start and end with a letter or number")]
    InvalidBoundary { kind: &'static str },

    #[error("{kind} ID contains invalid character: '{found}'. Only alphanumeric characters, hyphens and underscores are allowed")]
    InvalidCharacter { kind: &'static str, found: char },
}

const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Validate an identifier
///
/// Rules:
/// - Cannot be empty
/// - Maximum 64 characters
/// - Only ASCII alphanumerics, `-` and `_`
/// - Must start and end with an alphanumeric character
pub fn validate_identifier(kind: &'static str, id: &str) -> Result<(), IdentifierValidationError> {
    if id.is_empty() {
        return Err(IdentifierValidationError::Empty { kind });
    }

    if id.len() > MAX_IDENTIFIER_LENGTH {
        return Err(IdentifierValidationError::TooLong {
            kind,
            max: MAX_IDENTIFIER_LENGTH,
        });
    }

    if let Some(found) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(IdentifierValidationError::InvalidCharacter { kind, found });
    }

    let first = id.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let last = id.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());

    if !first || !last {
        return Err(IdentifierValidationError::InvalidBoundary { kind });
    }

    Ok(())
}

/// Validate an API key ID
pub fn validate_api_key_id(id: &str) -> Result<(), IdentifierValidationError> {
    validate_identifier("API key", id)
}
