//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::persistence::{Backend, BlobStore};
use crate::service::{ExchangeService, ListingService, NotificationService, ProfileService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Plant listings.
    pub listings: ListingService,
    /// User profiles.
    pub profiles: ProfileService,
    /// Exchange negotiation.
    pub exchanges: ExchangeService,
    /// Notification feed.
    pub notifications: NotificationService,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires every service over one row store, one blob store and one bus.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, blobs: Arc<dyn BlobStore>, event_bus: EventBus) -> Self {
        let notifications = NotificationService::new(Arc::clone(&backend), event_bus.clone());
        Self {
            listings: ListingService::new(Arc::clone(&backend), Arc::clone(&blobs)),
            profiles: ProfileService::new(Arc::clone(&backend), blobs),
            exchanges: ExchangeService::new(backend, notifications.clone(), event_bus.clone()),
            notifications,
            event_bus,
        }
    }
}
