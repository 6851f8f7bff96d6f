//! Notification feed DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Notification, NotificationId, NotificationKind, OfferId, UserId};

/// A notification as returned by the API and pushed over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationDto {
    /// Notification identifier.
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Category.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Text.
    pub message: String,
    /// Offer that triggered it.
    pub related_exchange_id: Option<OfferId>,
    /// Read flag.
    pub read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDto {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            user_id: n.user_id,
            kind: n.kind,
            message: n.message,
            related_exchange_id: n.related_exchange_id,
            read: n.read,
            created_at: n.created_at,
        }
    }
}

/// Response body for `GET /notifications`.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationListResponse {
    /// Notifications, newest first.
    pub data: Vec<NotificationDto>,
    /// Number of entries in `data`.
    pub total: usize,
}

impl From<Vec<Notification>> for NotificationListResponse {
    fn from(notifications: Vec<Notification>) -> Self {
        let data: Vec<NotificationDto> = notifications
            .into_iter()
            .map(NotificationDto::from)
            .collect();
        Self {
            total: data.len(),
            data,
        }
    }
}

/// Response body for `GET /notifications/unread-count`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    /// Unread notifications of the caller.
    pub unread: u64,
}

/// Query parameters for `GET /notifications`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedParams {
    /// Only unread notifications.
    #[serde(default)]
    pub unread_only: bool,
    /// Page size, default 50, max 200.
    #[serde(default)]
    pub limit: Option<usize>,
}
