//! JSON response wrapper and deferred body parsing
//!
//! Guarded handlers read the raw body and only decode it once the request
//! has been admitted, so a malformed payload from an unauthenticated caller
//! still gets a 401 rather than a 400.

use axum::{
    body::Bytes,
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::error::ApiError;

/// JSON response body
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> IntoResponse for Json<T>
where
    T: serde::Serialize,
{
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

impl<T> From<T> for Json<T> {
    fn from(value: T) -> Self {
        Json(value)
    }
}

/// Decode a JSON request body
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        use serde_json::error::Category;

        let err = match e.classify() {
            Category::Data => ApiError::unprocessable(format!("Invalid JSON data: {}", e)),
            Category::Syntax | Category::Eof | Category::Io => {
                ApiError::bad_request(format!("Invalid JSON syntax: {}", e))
            }
        };
        err.with_code("json_parse_error")
    })
}

/// Decode a JSON request body and run its validation rules
pub fn parse_validated<T: DeserializeOwned + Validate>(body: &Bytes) -> Result<T, ApiError> {
    let value: T = parse_body(body)?;
    value.validate()?;
    Ok(value)
}
