//! Notification service: stores generated notifications and serves the
//! per-user feed.

use std::sync::Arc;

use crate::domain::{EventBus, MarketEvent, Notification, NotificationId, Session};
use crate::error::MarketError;
use crate::persistence::Backend;

/// Page size used when the caller gives none.
pub const DEFAULT_FEED_LIMIT: usize = 50;
/// Largest page a caller may request.
pub const MAX_FEED_LIMIT: usize = 200;

/// Feed reads and best-effort notification delivery.
#[derive(Debug, Clone)]
pub struct NotificationService {
    backend: Arc<dyn Backend>,
    event_bus: EventBus,
}

impl NotificationService {
    /// Creates a new `NotificationService`.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, event_bus: EventBus) -> Self {
        Self { backend, event_bus }
    }

    /// Stores each notification and publishes the stored ones on the event
    /// bus. A failed insert is logged and skipped; returns how many were
    /// stored.
    pub async fn dispatch(&self, notifications: Vec<Notification>) -> usize {
        let mut stored = 0;
        for notification in notifications {
            if let Err(err) = self.backend.insert_notification(&notification).await {
                tracing::warn!(
                    user_id = %notification.user_id,
                    kind = notification.kind.as_str(),
                    error = %err,
                    "notification insert failed"
                );
                continue;
            }
            stored += 1;
            let _ = self
                .event_bus
                .publish(MarketEvent::NotificationCreated { notification });
        }
        stored
    }

    /// Lists the caller's notifications, newest first.
    ///
    /// `limit` defaults to [`DEFAULT_FEED_LIMIT`] and is clamped to
    /// `1..=MAX_FEED_LIMIT`.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn list(
        &self,
        session: &Session,
        unread_only: bool,
        limit: Option<usize>,
    ) -> Result<Vec<Notification>, MarketError> {
        let limit = limit
            .unwrap_or(DEFAULT_FEED_LIMIT)
            .clamp(1, MAX_FEED_LIMIT);
        self.backend
            .list_notifications(session.user_id(), unread_only, limit)
            .await
    }

    /// Counts the caller's unread notifications.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn unread_count(&self, session: &Session) -> Result<u64, MarketError> {
        self.backend
            .count_unread_notifications(session.user_id())
            .await
    }

    /// Marks one of the caller's notifications read.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotificationNotFound`] if the id does not
    /// exist or belongs to someone else.
    pub async fn mark_read(
        &self,
        session: &Session,
        id: NotificationId,
    ) -> Result<(), MarketError> {
        if self
            .backend
            .mark_notification_read(id, session.user_id())
            .await?
        {
            Ok(())
        } else {
            Err(MarketError::NotificationNotFound(id.into()))
        }
    }

    /// Marks all of the caller's notifications read and returns how many
    /// changed.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn mark_all_read(&self, session: &Session) -> Result<u64, MarketError> {
        let changed = self
            .backend
            .mark_all_notifications_read(session.user_id())
            .await?;
        tracing::debug!(user_id = %session.user_id(), changed, "notifications marked read");
        Ok(changed)
    }
}
