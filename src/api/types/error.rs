//! JSON error envelope shared by every endpoint

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use crate::domain::guard::{ForbiddenReason, GuardError};
use crate::domain::DomainError;

/// Error categories reported in `error.type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    AuthenticationError,
    PermissionError,
    NotFoundError,
    ConflictError,
    RateLimitError,
    ServerError,
    ServiceUnavailableError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::AuthenticationError => write!(f, "authentication_error"),
            Self::PermissionError => write!(f, "permission_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::ConflictError => write!(f, "conflict_error"),
            Self::RateLimitError => write!(f, "rate_limit_error"),
            Self::ServerError => write!(f, "server_error"),
            Self::ServiceUnavailableError => write!(f, "service_unavailable_error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// API error with status code and extra response headers
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    param: None,
                    code: None,
                },
            },
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.response.error.param = Some(param.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    pub fn with_header(mut self, name: &'static str, value: impl ToString) -> Self {
        if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiErrorType::InvalidRequestError,
            message,
        )
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ApiErrorType::AuthenticationError, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ApiErrorType::PermissionError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, ApiErrorType::ConflictError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, ApiErrorType::RateLimitError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorType::ServiceUnavailableError,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.headers, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Validation { message } => Self::bad_request(message),
            DomainError::InvalidId { message } => Self::bad_request(message).with_param("id"),
            DomainError::Conflict { message } => Self::conflict(message),
            DomainError::Storage { message } | DomainError::Internal { message } => {
                tracing::error!(error = %message, "Request failed");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        let message = err.to_string();

        match err {
            GuardError::Unauthenticated { reason } => Self::unauthorized(reason),
            GuardError::Forbidden {
                reason: ForbiddenReason::MissingScope(grant),
            } => Self::forbidden(message)
                .with_param(grant.to_string())
                .with_code("insufficient_scope"),
            GuardError::Forbidden {
                reason: ForbiddenReason::NotOwner { .. },
            } => Self::forbidden(message).with_code("not_owner"),
            GuardError::ResourceNotFound { resource_type, .. } => {
                Self::not_found(message).with_param(resource_type.as_str())
            }
            GuardError::RateLimited {
                limit,
                retry_after_secs,
            } => Self::rate_limited(message)
                .with_header("retry-after", retry_after_secs)
                .with_header("x-ratelimit-limit", limit)
                .with_header("x-ratelimit-remaining", 0)
                .with_header("x-ratelimit-reset", retry_after_secs),
            GuardError::Unavailable { component, .. } => {
                Self::unavailable(format!("{} is temporarily unavailable", component))
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .min()
            .map(|field| field.to_string());

        let err = Self::bad_request(format!("Validation failed: {}", errors));
        match field {
            Some(field) => err.with_param(field),
            None => err,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::authorization::{ResourceType, ScopeGrant};

    #[test]
    fn test_guard_error_statuses() {
        let cases = [
            (GuardError::unauthenticated("no key"), StatusCode::UNAUTHORIZED),
            (
                GuardError::missing_scope(ScopeGrant::read(ResourceType::List)),
                StatusCode::FORBIDDEN,
            ),
            (
                GuardError::not_owner(ResourceType::Subscriber, "sub-1"),
                StatusCode::FORBIDDEN,
            ),
            (
                GuardError::not_found(ResourceType::List, None),
                StatusCode::NOT_FOUND,
            ),
            (
                GuardError::RateLimited {
                    limit: 150,
                    retry_after_secs: 12,
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                GuardError::unavailable("ownership lookup", "timed out"),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_rate_limited_headers() {
        let err = ApiError::from(GuardError::RateLimited {
            limit: 150,
            retry_after_secs: 12,
        });

        assert_eq!(err.response.error.error_type, ApiErrorType::RateLimitError);
        assert_eq!(err.headers["retry-after"], "12");
        assert_eq!(err.headers["x-ratelimit-limit"], "150");
        assert_eq!(err.headers["x-ratelimit-remaining"], "0");
    }

    #[test]
    fn test_missing_scope_names_the_grant() {
        let err = ApiError::from(GuardError::missing_scope(ScopeGrant::manage(
            ResourceType::Subscriber,
        )));

        assert_eq!(err.response.error.error_type, ApiErrorType::PermissionError);
        assert_eq!(err.response.error.param.as_deref(), Some("subscriber:manage"));
        assert_eq!(err.response.error.code.as_deref(), Some("insufficient_scope"));
    }

    #[test]
    fn test_unavailable_hides_details() {
        let err = ApiError::from(GuardError::unavailable("credential store", "conn refused"));
        assert!(!err.response.error.message.contains("conn refused"));
    }

    #[test]
    fn test_domain_error_conversion() {
        assert_eq!(
            ApiError::from(DomainError::conflict("already on list")).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(DomainError::not_found("gone")).status,
            StatusCode::NOT_FOUND
        );

        let internal = ApiError::from(DomainError::storage("disk full"));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.response.error.message, "Internal server error");
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::unauthorized("Invalid API key");
        let json = serde_json::to_value(&err.response).unwrap();

        assert_eq!(json["error"]["type"], "authentication_error");
        assert_eq!(json["error"]["message"], "Invalid API key");
        assert!(json["error"].get("param").is_none());
    }
}
