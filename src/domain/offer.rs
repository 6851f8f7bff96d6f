//! Exchange offers and the negotiation state machine.
//!
//! ```text
//!              select (receiver)            confirm (either)
//!   pending ───────────────────▶ awaiting_confirmation ──────────▶ completed
//!      │                                   │
//!      │ cancel (either)                   │ cancel (either)
//!      ▼                                   ▼
//!  cancelled ◀─────────────────────────────┘
//! ```
//!
//! `completed` and `cancelled` are terminal.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{OfferId, PlantId, Session, UserId};
use crate::error::MarketError;

/// Negotiation status of an exchange offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    /// Waiting for the receiver to pick plants.
    Pending,
    /// Plants picked; waiting for either party to confirm.
    AwaitingConfirmation,
    /// Exchange done. Terminal.
    Completed,
    /// Withdrawn by either party. Terminal.
    Cancelled,
}

impl OfferStatus {
    /// Returns the status as its stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` if no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns the status reached by applying `action`, if the action is
    /// valid from here.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidTransition`] if `action` is not
    /// allowed from this status.
    pub fn next(self, action: OfferAction) -> Result<Self, MarketError> {
        match (self, action) {
            (Self::Pending, OfferAction::Select) => Ok(Self::AwaitingConfirmation),
            (Self::AwaitingConfirmation, OfferAction::Confirm) => Ok(Self::Completed),
            (Self::Pending | Self::AwaitingConfirmation, OfferAction::Cancel) => {
                Ok(Self::Cancelled)
            }
            (from, action) => Err(MarketError::InvalidTransition { from, action }),
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferStatus {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "awaiting_confirmation" => Ok(Self::AwaitingConfirmation),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(MarketError::InvalidRequest(format!(
                "unknown offer status: {other}"
            ))),
        }
    }
}

/// Actions a party can take on an existing offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferAction {
    /// Receiver picks plants from the sender's inventory.
    Select,
    /// Either party completes the exchange.
    Confirm,
    /// Either party withdraws.
    Cancel,
}

impl fmt::Display for OfferAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Select => "select",
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

/// A proposed plant-for-plant trade between two users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeOffer {
    /// Unique offer identifier.
    pub id: OfferId,
    /// User who proposed the exchange.
    pub sender_id: UserId,
    /// Owner of the requested plant.
    pub receiver_id: UserId,
    /// Plant the sender puts forward.
    pub sender_plant_id: PlantId,
    /// Plant the sender wants.
    pub receiver_plant_id: PlantId,
    /// Sender plants the receiver picked. Empty while `pending`.
    pub selected_plant_ids: Vec<PlantId>,
    /// Negotiation status.
    pub status: OfferStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last transition.
    pub updated_at: DateTime<Utc>,
}

impl ExchangeOffer {
    /// Builds a `pending` offer from `sender_plant` towards `receiver_plant`.
    #[must_use]
    pub fn new(
        sender_id: UserId,
        receiver_id: UserId,
        sender_plant_id: PlantId,
        receiver_plant_id: PlantId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OfferId::new(),
            sender_id,
            receiver_id,
            sender_plant_id,
            receiver_plant_id,
            selected_plant_ids: Vec::new(),
            status: OfferStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if `user_id` is the sender or the receiver.
    #[must_use]
    pub fn involves(&self, user_id: UserId) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    /// Returns the other party relative to `user_id`.
    #[must_use]
    pub fn counterpart_of(&self, user_id: UserId) -> UserId {
        if user_id == self.sender_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    /// Every plant that changes hands on completion: the two anchor plants
    /// followed by the selection, without duplicates, in that order.
    #[must_use]
    pub fn traded_plant_ids(&self) -> Vec<PlantId> {
        let mut ids = Vec::with_capacity(2 + self.selected_plant_ids.len());
        for id in [self.sender_plant_id, self.receiver_plant_id]
            .into_iter()
            .chain(self.selected_plant_ids.iter().copied())
        {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// Checks that `session` may perform `action` and that the action is
    /// valid from the current status, returning the resulting status.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Forbidden`] if the actor is not a party (or,
    /// for `Select`, not the receiver) and
    /// [`MarketError::InvalidTransition`] if the status does not allow it.
    pub fn authorize(
        &self,
        session: &Session,
        action: OfferAction,
    ) -> Result<OfferStatus, MarketError> {
        if !self.involves(session.user_id()) {
            return Err(MarketError::Forbidden(
                "only the sender or receiver may act on this offer".to_string(),
            ));
        }
        if action == OfferAction::Select && !session.is(self.receiver_id) {
            return Err(MarketError::Forbidden(
                "only the receiver selects plants".to_string(),
            ));
        }
        self.status.next(action)
    }
}

/// Display-only narrowing of a user's visible offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatusFilter {
    /// No narrowing.
    #[default]
    All,
    /// Only `pending` offers.
    Pending,
    /// Only `awaiting_confirmation` offers.
    AwaitingConfirmation,
    /// Only `completed` offers.
    Completed,
    /// Only `cancelled` offers.
    Cancelled,
}

impl OfferStatusFilter {
    /// Returns `true` if an offer in `status` passes the filter.
    #[must_use]
    pub const fn matches(&self, status: OfferStatus) -> bool {
        matches!(
            (self, status),
            (Self::All, _)
                | (Self::Pending, OfferStatus::Pending)
                | (Self::AwaitingConfirmation, OfferStatus::AwaitingConfirmation)
                | (Self::Completed, OfferStatus::Completed)
                | (Self::Cancelled, OfferStatus::Cancelled)
        )
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const ALL_STATUSES: [OfferStatus; 4] = [
        OfferStatus::Pending,
        OfferStatus::AwaitingConfirmation,
        OfferStatus::Completed,
        OfferStatus::Cancelled,
    ];
    const ALL_ACTIONS: [OfferAction; 3] =
        [OfferAction::Select, OfferAction::Confirm, OfferAction::Cancel];

    fn offer() -> ExchangeOffer {
        ExchangeOffer::new(UserId::new(), UserId::new(), PlantId::new(), PlantId::new())
    }

    #[test]
    fn happy_path_transitions() {
        assert_eq!(
            OfferStatus::Pending.next(OfferAction::Select).ok(),
            Some(OfferStatus::AwaitingConfirmation)
        );
        assert_eq!(
            OfferStatus::AwaitingConfirmation
                .next(OfferAction::Confirm)
                .ok(),
            Some(OfferStatus::Completed)
        );
    }

    #[test]
    fn cancel_allowed_from_both_open_states() {
        for from in [OfferStatus::Pending, OfferStatus::AwaitingConfirmation] {
            assert_eq!(
                from.next(OfferAction::Cancel).ok(),
                Some(OfferStatus::Cancelled)
            );
        }
    }

    #[test]
    fn terminal_states_never_transition() {
        for from in ALL_STATUSES.into_iter().filter(OfferStatus::is_terminal) {
            for action in ALL_ACTIONS {
                assert!(
                    matches!(
                        from.next(action),
                        Err(MarketError::InvalidTransition { .. })
                    ),
                    "{from} allowed {action}"
                );
            }
        }
    }

    #[test]
    fn confirm_requires_a_selection_first() {
        assert!(OfferStatus::Pending.next(OfferAction::Confirm).is_err());
        assert!(
            OfferStatus::AwaitingConfirmation
                .next(OfferAction::Select)
                .is_err()
        );
    }

    #[test]
    fn new_offer_is_pending_with_empty_selection() {
        let o = offer();
        assert_eq!(o.status, OfferStatus::Pending);
        assert!(o.selected_plant_ids.is_empty());
    }

    #[test]
    fn only_receiver_may_select() {
        let o = offer();
        let sender = Session::new(o.sender_id);
        let receiver = Session::new(o.receiver_id);
        assert!(matches!(
            o.authorize(&sender, OfferAction::Select),
            Err(MarketError::Forbidden(_))
        ));
        assert_eq!(
            o.authorize(&receiver, OfferAction::Select).ok(),
            Some(OfferStatus::AwaitingConfirmation)
        );
    }

    #[test]
    fn strangers_are_forbidden() {
        let o = offer();
        let stranger = Session::new(UserId::new());
        for action in ALL_ACTIONS {
            assert!(matches!(
                o.authorize(&stranger, action),
                Err(MarketError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn traded_plants_are_deduplicated_in_order() {
        let mut o = offer();
        let extra = PlantId::new();
        o.selected_plant_ids = vec![o.sender_plant_id, extra, extra];
        assert_eq!(
            o.traded_plant_ids(),
            vec![o.sender_plant_id, o.receiver_plant_id, extra]
        );
    }

    #[test]
    fn counterpart_is_the_other_party() {
        let o = offer();
        assert_eq!(o.counterpart_of(o.sender_id), o.receiver_id);
        assert_eq!(o.counterpart_of(o.receiver_id), o.sender_id);
    }

    #[test]
    fn status_filter_narrows() {
        assert!(OfferStatusFilter::All.matches(OfferStatus::Cancelled));
        assert!(OfferStatusFilter::Pending.matches(OfferStatus::Pending));
        assert!(!OfferStatusFilter::Pending.matches(OfferStatus::Completed));
    }

    #[test]
    fn status_round_trips_through_stored_form() {
        for status in ALL_STATUSES {
            assert_eq!(status.as_str().parse::<OfferStatus>().ok(), Some(status));
        }
    }
}
