//! Subscriber API endpoints
//!
//! Every handler builds a [`GuardRequest`] from the path, the presented
//! credential and (for list routes) the body's `listId`, runs the guard chain,
//! and only then parses the rest of its input.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, Uri},
    routing::get,
    Router,
};

use super::middleware::ApiCredential;
use super::state::AppState;
use super::types::{
    parse_validated, AddSubscriberToListRequest, ApiError, Json, ListIdProbe, PaginationQuery,
    RemoveSubscriberFromListRequest, SubscriberListResponse, SubscriberResponse,
    UpdateEmailConsentRequest, UpdateEmailStatusRequest, UpdateSubscriberRequest,
};
use crate::domain::guard::{GuardRequest, RequestContext, RouteId};

/// Routes under `/api/subscriber`
pub fn create_subscriber_router() -> Router<AppState> {
    Router::new()
        .route("/api/subscriber", get(get_subscribers))
        .route("/api/subscriber/count", get(get_subscriber_count))
        .route(
            "/api/subscriber/{subscriber_id}",
            get(get_subscriber).patch(update_subscriber),
        )
        .route(
            "/api/subscriber/{subscriber_id}/email-status",
            axum::routing::patch(update_email_status),
        )
        .route(
            "/api/subscriber/{subscriber_id}/list",
            get(get_subscriber_lists)
                .post(add_subscriber_to_list)
                .delete(remove_subscriber_from_list)
                .patch(update_email_consent),
        )
}

/// `X-RateLimit-*` headers for an admitted request
fn rate_limit_headers(ctx: &RequestContext) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(status) = ctx.throttle {
        headers.insert("x-ratelimit-limit", HeaderValue::from(status.limit));
        headers.insert("x-ratelimit-remaining", HeaderValue::from(status.remaining));
        headers.insert("x-ratelimit-reset", HeaderValue::from(status.reset_in_secs));
    }
    headers
}

async fn admit(
    state: &AppState,
    route: RouteId,
    credential: Option<String>,
    subscriber_id: Option<String>,
    list_id: Option<String>,
) -> Result<RequestContext, ApiError> {
    let mut request = GuardRequest::new(route)
        .with_credential(credential)
        .with_list(list_id);
    if let Some(subscriber_id) = subscriber_id {
        request = request.with_subscriber(subscriber_id);
    }

    Ok(state.guard_chain.admit(request).await?)
}

/// GET /api/subscriber/{subscriber_id}
pub async fn get_subscriber(
    State(state): State<AppState>,
    ApiCredential(credential): ApiCredential,
    Path(subscriber_id): Path<String>,
) -> Result<(HeaderMap, Json<SubscriberResponse>), ApiError> {
    let ctx = admit(&state, RouteId::GetSubscriber, credential, Some(subscriber_id), None).await?;
    let subscriber = state.subscribers.get_subscriber(&ctx).await?;

    Ok((rate_limit_headers(&ctx), Json(subscriber.into())))
}

/// GET /api/subscriber
pub async fn get_subscribers(
    State(state): State<AppState>,
    ApiCredential(credential): ApiCredential,
    uri: Uri,
) -> Result<(HeaderMap, Json<Vec<SubscriberResponse>>), ApiError> {
    let ctx = admit(&state, RouteId::ListSubscribers, credential, None, None).await?;
    let page = PaginationQuery::from_uri(&uri)?.page();

    let subscribers = state.subscribers.list_subscribers(&ctx, page).await?;
    let body = subscribers.into_iter().map(SubscriberResponse::from).collect();

    Ok((rate_limit_headers(&ctx), Json(body)))
}

/// GET /api/subscriber/count
pub async fn get_subscriber_count(
    State(state): State<AppState>,
    ApiCredential(credential): ApiCredential,
) -> Result<(HeaderMap, Json<u64>), ApiError> {
    let ctx = admit(&state, RouteId::CountSubscribers, credential, None, None).await?;
    let count = state.subscribers.count_subscribers(&ctx).await?;

    Ok((rate_limit_headers(&ctx), Json(count)))
}

/// PATCH /api/subscriber/{subscriber_id}
pub async fn update_subscriber(
    State(state): State<AppState>,
    ApiCredential(credential): ApiCredential,
    Path(subscriber_id): Path<String>,
    body: Bytes,
) -> Result<(HeaderMap, Json<SubscriberResponse>), ApiError> {
    let ctx = admit(&state, RouteId::UpdateSubscriber, credential, Some(subscriber_id), None).await?;
    let request: UpdateSubscriberRequest = parse_validated(&body)?;

    let subscriber = state
        .subscribers
        .update_subscriber(&ctx, request.into())
        .await?;

    Ok((rate_limit_headers(&ctx), Json(subscriber.into())))
}

/// PATCH /api/subscriber/{subscriber_id}/email-status
pub async fn update_email_status(
    State(state): State<AppState>,
    ApiCredential(credential): ApiCredential,
    Path(subscriber_id): Path<String>,
    body: Bytes,
) -> Result<(HeaderMap, Json<SubscriberResponse>), ApiError> {
    let ctx = admit(&state, RouteId::UpdateEmailStatus, credential, Some(subscriber_id), None).await?;
    let request: UpdateEmailStatusRequest = parse_validated(&body)?;

    let subscriber = state
        .subscribers
        .update_email_status(&ctx, request.email_status)
        .await?;

    Ok((rate_limit_headers(&ctx), Json(subscriber.into())))
}

/// GET /api/subscriber/{subscriber_id}/list
pub async fn get_subscriber_lists(
    State(state): State<AppState>,
    ApiCredential(credential): ApiCredential,
    Path(subscriber_id): Path<String>,
    uri: Uri,
) -> Result<(HeaderMap, Json<Vec<SubscriberListResponse>>), ApiError> {
    let ctx = admit(&state, RouteId::GetSubscriberLists, credential, Some(subscriber_id), None).await?;
    let page = PaginationQuery::from_uri(&uri)?.page();

    let lists = state.subscribers.subscriber_lists(&ctx, page).await?;
    let body = lists.into_iter().map(SubscriberListResponse::from).collect();

    Ok((rate_limit_headers(&ctx), Json(body)))
}

/// POST /api/subscriber/{subscriber_id}/list
pub async fn add_subscriber_to_list(
    State(state): State<AppState>,
    ApiCredential(credential): ApiCredential,
    Path(subscriber_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, HeaderMap, Json<SubscriberListResponse>), ApiError> {
    let list_id = ListIdProbe::list_id(&body);
    let ctx = admit(&state, RouteId::AddSubscriberToList, credential, Some(subscriber_id), list_id).await?;
    let request: AddSubscriberToListRequest = parse_validated(&body)?;

    let membership = state
        .subscribers
        .add_to_list(&ctx, request.email_consent)
        .await?;

    Ok((
        StatusCode::CREATED,
        rate_limit_headers(&ctx),
        Json(membership.into()),
    ))
}

/// DELETE /api/subscriber/{subscriber_id}/list
pub async fn remove_subscriber_from_list(
    State(state): State<AppState>,
    ApiCredential(credential): ApiCredential,
    Path(subscriber_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, HeaderMap), ApiError> {
    let list_id = ListIdProbe::list_id(&body);
    let ctx = admit(
        &state,
        RouteId::RemoveSubscriberFromList,
        credential,
        Some(subscriber_id),
        list_id,
    )
    .await?;
    let _request: RemoveSubscriberFromListRequest = parse_validated(&body)?;

    state.subscribers.remove_from_list(&ctx).await?;

    Ok((StatusCode::NO_CONTENT, rate_limit_headers(&ctx)))
}

/// PATCH /api/subscriber/{subscriber_id}/list
pub async fn update_email_consent(
    State(state): State<AppState>,
    ApiCredential(credential): ApiCredential,
    Path(subscriber_id): Path<String>,
    body: Bytes,
) -> Result<(HeaderMap, Json<SubscriberListResponse>), ApiError> {
    let list_id = ListIdProbe::list_id(&body);
    let ctx = admit(&state, RouteId::UpdateEmailConsent, credential, Some(subscriber_id), list_id).await?;
    let request: UpdateEmailConsentRequest = parse_validated(&body)?;

    let membership = state
        .subscribers
        .update_email_consent(&ctx, request.email_consent)
        .await?;

    Ok((rate_limit_headers(&ctx), Json(membership.into())))
}
