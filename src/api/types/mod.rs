//! HTTP API types

pub mod error;
pub mod json;
pub mod pagination;
pub mod subscriber;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::{parse_body, parse_validated, Json};
pub use pagination::PaginationQuery;
pub use subscriber::{
    AddSubscriberToListRequest, ListIdProbe, RemoveSubscriberFromListRequest,
    SubscriberListResponse, SubscriberResponse, UpdateEmailConsentRequest,
    UpdateEmailStatusRequest, UpdateSubscriberRequest,
};
