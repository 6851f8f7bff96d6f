//! Notification feed handlers.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AckResponse, FeedParams, NotificationListResponse, UnreadCountResponse, UpdatedCountResponse,
};
use crate::app_state::AppState;
use crate::domain::{NotificationId, Session};
use crate::error::{ErrorResponse, MarketError};

/// `GET /notifications` — The caller's feed.
///
/// # Errors
///
/// Returns [`MarketError`] on backend failure.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    summary = "List own notifications",
    params(FeedParams),
    responses(
        (status = 200, description = "Notifications, newest first", body = NotificationListResponse),
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<FeedParams>,
) -> Result<Json<NotificationListResponse>, MarketError> {
    let feed = state
        .notifications
        .list(&session, params.unread_only, params.limit)
        .await?;
    Ok(Json(feed.into()))
}

/// `GET /notifications/unread-count` — Unread badge count.
///
/// # Errors
///
/// Returns [`MarketError`] on backend failure.
#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    tag = "Notifications",
    summary = "Count unread notifications",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
    )
)]
pub async fn unread_count(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<UnreadCountResponse>, MarketError> {
    let unread = state.notifications.unread_count(&session).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// `POST /notifications/{id}/read` — Mark one notification read.
///
/// # Errors
///
/// Returns [`MarketError::NotificationNotFound`] for ids the caller does
/// not own.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    tag = "Notifications",
    summary = "Mark a notification read",
    params(("id" = NotificationId, Path, description = "Notification identifier")),
    responses(
        (status = 200, description = "Marked read", body = AckResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse),
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<NotificationId>,
) -> Result<Json<AckResponse>, MarketError> {
    state.notifications.mark_read(&session, id).await?;
    Ok(Json(AckResponse::OK))
}

/// `POST /notifications/read-all` — Mark the whole feed read.
///
/// # Errors
///
/// Returns [`MarketError`] on backend failure.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    tag = "Notifications",
    summary = "Mark all notifications read",
    responses(
        (status = 200, description = "Number of notifications changed", body = UpdatedCountResponse),
    )
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<UpdatedCountResponse>, MarketError> {
    let updated = state.notifications.mark_all_read(&session).await?;
    Ok(Json(UpdatedCountResponse { updated }))
}

/// Notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{id}/read", post(mark_read))
}
