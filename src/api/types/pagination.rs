//! Offset pagination query parameters

use axum::{extract::Query, http::Uri};
use serde::Deserialize;
use validator::Validate;

use super::error::ApiError;
use crate::domain::subscriber::Page;

/// `?limit=&offset=`
///
/// `page` is accepted in place of `offset`; when both are sent `offset` wins.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PaginationQuery {
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub page: Option<u32>,
}

impl PaginationQuery {
    /// Parse and validate the query string of `uri`
    pub fn from_uri(uri: &Uri) -> Result<Self, ApiError> {
        let Query(query) = Query::<Self>::try_from_uri(uri)
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        query.validate()?;
        Ok(query)
    }

    pub fn page(&self) -> Page {
        Page::new(
            self.limit.unwrap_or(Page::DEFAULT_LIMIT),
            self.offset.or(self.page).unwrap_or(0),
        )
    }
}
