//! Notifications and the table of which offer transitions produce them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ExchangeOffer, NotificationId, OfferId, OfferStatus, UserId};
use crate::error::MarketError;

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone wants one of your plants.
    ExchangeRequest,
    /// The receiver picked plants from your inventory.
    ExchangeSelection,
    /// An exchange you are part of was completed.
    ExchangeCompleted,
    /// The other party cancelled an exchange.
    ExchangeCancelled,
}

impl NotificationKind {
    /// Returns the kind as its stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ExchangeRequest => "exchange_request",
            Self::ExchangeSelection => "exchange_selection",
            Self::ExchangeCompleted => "exchange_completed",
            Self::ExchangeCancelled => "exchange_cancelled",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exchange_request" => Ok(Self::ExchangeRequest),
            "exchange_selection" => Ok(Self::ExchangeSelection),
            "exchange_completed" => Ok(Self::ExchangeCompleted),
            "exchange_cancelled" => Ok(Self::ExchangeCancelled),
            other => Err(MarketError::InvalidRequest(format!(
                "unknown notification type: {other}"
            ))),
        }
    }
}

/// A message delivered to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// Recipient and owner.
    pub user_id: UserId,
    /// Category.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Human-readable text.
    pub message: String,
    /// Offer that triggered the notification.
    pub related_exchange_id: Option<OfferId>,
    /// Whether the recipient has seen it.
    pub read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates an unread notification for `user_id`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        message: impl Into<String>,
        related_exchange_id: Option<OfferId>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind,
            message: message.into(),
            related_exchange_id,
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Who receives a notification for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// The user who proposed the offer.
    Sender,
    /// The owner of the requested plant.
    Receiver,
    /// Whichever party did not perform the action.
    CounterpartOfActor,
}

impl Recipient {
    /// Resolves the recipient against a concrete offer and actor.
    #[must_use]
    pub fn resolve(&self, offer: &ExchangeOffer, actor: UserId) -> UserId {
        match self {
            Self::Sender => offer.sender_id,
            Self::Receiver => offer.receiver_id,
            Self::CounterpartOfActor => offer.counterpart_of(actor),
        }
    }
}

/// One row of the notification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationRule {
    /// Status before the transition; `None` when the offer is created.
    pub from: Option<OfferStatus>,
    /// Status after the transition.
    pub to: OfferStatus,
    /// Who is notified.
    pub recipient: Recipient,
    /// Category of the notification.
    pub kind: NotificationKind,
    /// Static message text.
    pub message: &'static str,
}

/// Transition → notification table.
pub const NOTIFICATION_RULES: &[NotificationRule] = &[
    NotificationRule {
        from: None,
        to: OfferStatus::Pending,
        recipient: Recipient::Receiver,
        kind: NotificationKind::ExchangeRequest,
        message: "Someone wants to exchange plants with you.",
    },
    NotificationRule {
        from: Some(OfferStatus::Pending),
        to: OfferStatus::AwaitingConfirmation,
        recipient: Recipient::Sender,
        kind: NotificationKind::ExchangeSelection,
        message: "Your exchange offer got a selection. Review and confirm it.",
    },
    NotificationRule {
        from: Some(OfferStatus::AwaitingConfirmation),
        to: OfferStatus::Completed,
        recipient: Recipient::Sender,
        kind: NotificationKind::ExchangeCompleted,
        message: "Your plant exchange is complete.",
    },
    NotificationRule {
        from: Some(OfferStatus::AwaitingConfirmation),
        to: OfferStatus::Completed,
        recipient: Recipient::Receiver,
        kind: NotificationKind::ExchangeCompleted,
        message: "Your plant exchange is complete.",
    },
    NotificationRule {
        from: Some(OfferStatus::Pending),
        to: OfferStatus::Cancelled,
        recipient: Recipient::CounterpartOfActor,
        kind: NotificationKind::ExchangeCancelled,
        message: "An exchange offer was cancelled.",
    },
    NotificationRule {
        from: Some(OfferStatus::AwaitingConfirmation),
        to: OfferStatus::Cancelled,
        recipient: Recipient::CounterpartOfActor,
        kind: NotificationKind::ExchangeCancelled,
        message: "An exchange offer was cancelled.",
    },
];

/// Returns the rules that fire for a `from → to` transition.
pub fn rules_for(
    from: Option<OfferStatus>,
    to: OfferStatus,
) -> impl Iterator<Item = &'static NotificationRule> {
    NOTIFICATION_RULES
        .iter()
        .filter(move |rule| rule.from == from && rule.to == to)
}

/// Builds the notifications a transition produces for `offer`, which must
/// already be in its new status.
#[must_use]
pub fn notifications_for(
    offer: &ExchangeOffer,
    from: Option<OfferStatus>,
    actor: UserId,
) -> Vec<Notification> {
    rules_for(from, offer.status)
        .map(|rule| {
            Notification::new(
                rule.recipient.resolve(offer, actor),
                rule.kind,
                rule.message,
                Some(offer.id),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlantId;

    fn offer_in(status: OfferStatus) -> ExchangeOffer {
        let mut offer =
            ExchangeOffer::new(UserId::new(), UserId::new(), PlantId::new(), PlantId::new());
        offer.status = status;
        offer
    }

    #[test]
    fn creation_notifies_receiver_once() {
        let offer = offer_in(OfferStatus::Pending);
        let out = notifications_for(&offer, None, offer.sender_id);
        assert_eq!(out.len(), 1);
        assert_eq!(out.first().map(|n| n.user_id), Some(offer.receiver_id));
        assert_eq!(
            out.first().map(|n| n.kind),
            Some(NotificationKind::ExchangeRequest)
        );
    }

    #[test]
    fn selection_notifies_sender_once() {
        let offer = offer_in(OfferStatus::AwaitingConfirmation);
        let out = notifications_for(&offer, Some(OfferStatus::Pending), offer.receiver_id);
        assert_eq!(out.len(), 1);
        assert_eq!(out.first().map(|n| n.user_id), Some(offer.sender_id));
    }

    #[test]
    fn completion_notifies_both_parties() {
        let offer = offer_in(OfferStatus::Completed);
        let out = notifications_for(
            &offer,
            Some(OfferStatus::AwaitingConfirmation),
            offer.sender_id,
        );
        let recipients: Vec<UserId> = out.iter().map(|n| n.user_id).collect();
        assert_eq!(recipients, vec![offer.sender_id, offer.receiver_id]);
        assert!(out.iter().all(|n| !n.read));
        assert!(out.iter().all(|n| n.related_exchange_id == Some(offer.id)));
    }

    #[test]
    fn cancellation_notifies_the_other_party() {
        let offer = offer_in(OfferStatus::Cancelled);
        for from in [OfferStatus::Pending, OfferStatus::AwaitingConfirmation] {
            let by_sender = notifications_for(&offer, Some(from), offer.sender_id);
            assert_eq!(
                by_sender.iter().map(|n| n.user_id).collect::<Vec<_>>(),
                vec![offer.receiver_id]
            );
            let by_receiver = notifications_for(&offer, Some(from), offer.receiver_id);
            assert_eq!(
                by_receiver.iter().map(|n| n.user_id).collect::<Vec<_>>(),
                vec![offer.sender_id]
            );
        }
    }

    #[test]
    fn undefined_transitions_produce_nothing() {
        let offer = offer_in(OfferStatus::Completed);
        assert!(notifications_for(&offer, Some(OfferStatus::Pending), offer.sender_id).is_empty());
    }

    #[test]
    fn kind_round_trips_through_stored_form() {
        for rule in NOTIFICATION_RULES {
            assert_eq!(rule.kind.as_str().parse::<NotificationKind>().ok(), Some(rule.kind));
        }
    }
}
