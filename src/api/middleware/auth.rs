//! API key credential extraction
//!
//! Only pulls the presented key out of the headers. Whether it is any good is
//! decided by the guard chain, so extraction itself never rejects.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

/// The API key presented with a request, if any
///
/// Read from either:
/// - Authorization header: `Bearer <api_key>`
/// - X-API-Key header: `<api_key>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiCredential(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for ApiCredential {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(extract_api_key_from_headers(&parts.headers)))
    }
}

fn extract_api_key_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer bsk_test_abc".parse().unwrap());

        assert_eq!(
            extract_api_key_from_headers(&headers),
            Some("bsk_test_abc".to_string())
        );
    }

    #[test]
    fn test_extract_x_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "bsk_test_67890".parse().unwrap());

        assert_eq!(
            extract_api_key_from_headers(&headers),
            Some("bsk_test_67890".to_string())
        );
    }

    #[test]
    fn test_bearer_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer from-bearer".parse().unwrap());
        headers.insert("x-api-key", "from-header".parse().unwrap());

        assert_eq!(
            extract_api_key_from_headers(&headers),
            Some("from-bearer".to_string())
        );
    }

    #[test]
    fn test_missing_or_unusable_headers() {
        assert_eq!(extract_api_key_from_headers(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert_eq!(extract_api_key_from_headers(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "   ".parse().unwrap());
        assert_eq!(extract_api_key_from_headers(&headers), None);
    }

    #[test]
    fn test_trimmed_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer   bsk_test_x   ".parse().unwrap());

        assert_eq!(
            extract_api_key_from_headers(&headers),
            Some("bsk_test_x".to_string())
        );
    }
}
