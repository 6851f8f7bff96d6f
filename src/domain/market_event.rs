//! Domain events pushed to connected clients.
//!
//! Every stored notification and every offer transition emits a
//! [`MarketEvent`] through the [`super::EventBus`]. WebSocket connections
//! forward the events addressed to their user.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ExchangeOffer, Notification, OfferId, OfferStatus, UserId};

/// Domain event emitted after a state change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// A notification was stored for a user.
    NotificationCreated {
        /// The stored notification.
        notification: Notification,
    },

    /// An offer was created or changed status.
    OfferUpdated {
        /// Offer identifier.
        offer_id: OfferId,
        /// Proposing user.
        sender_id: UserId,
        /// Receiving user.
        receiver_id: UserId,
        /// Status before the change; absent on creation.
        previous_status: Option<OfferStatus>,
        /// Status after the change.
        status: OfferStatus,
        /// Time of the change.
        timestamp: DateTime<Utc>,
    },
}

impl MarketEvent {
    /// Builds an [`MarketEvent::OfferUpdated`] from the offer's new state.
    #[must_use]
    pub fn offer_updated(offer: &ExchangeOffer, previous_status: Option<OfferStatus>) -> Self {
        Self::OfferUpdated {
            offer_id: offer.id,
            sender_id: offer.sender_id,
            receiver_id: offer.receiver_id,
            previous_status,
            status: offer.status,
            timestamp: offer.updated_at,
        }
    }

    /// Returns `true` if the event should be delivered to `user_id`.
    #[must_use]
    pub fn is_addressed_to(&self, user_id: UserId) -> bool {
        match self {
            Self::NotificationCreated { notification } => notification.user_id == user_id,
            Self::OfferUpdated {
                sender_id,
                receiver_id,
                ..
            } => *sender_id == user_id || *receiver_id == user_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::NotificationCreated { .. } => "notification_created",
            Self::OfferUpdated { .. } => "offer_updated",
        }
    }
}
