//! Database row types and their conversion into domain records.
//!
//! Enumerated columns are stored as `TEXT` and parsed on the way out so a
//! bad value surfaces as a persistence error rather than a panic.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{ExchangeOffer, Notification, Plant, PlantId, Profile};
use crate::error::MarketError;

/// A row of the `plants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlantRow {
    /// Primary key.
    pub id: Uuid,
    /// Owning user.
    pub owner_id: Uuid,
    /// Common name.
    pub name: String,
    /// Species.
    pub species: String,
    /// Optional subspecies.
    pub subspecies: Option<String>,
    /// Location text.
    pub location: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional public image URL.
    pub image_url: Option<String>,
    /// Category.
    pub plant_type: String,
    /// `available` / `pending` / `exchanged`.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PlantRow> for Plant {
    type Error = MarketError;

    fn try_from(row: PlantRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            owner_id: row.owner_id.into(),
            name: row.name,
            species: row.species,
            subspecies: row.subspecies,
            location: row.location,
            description: row.description,
            image_url: row.image_url,
            plant_type: row.plant_type,
            status: row.status.parse().map_err(corrupt("plants.status"))?,
            created_at: row.created_at,
        })
    }
}

/// A row of the `profiles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    /// Primary key, equal to the user id.
    pub id: Uuid,
    /// Unique handle.
    pub username: String,
    /// Display name.
    pub name: Option<String>,
    /// Bio.
    pub bio: Option<String>,
    /// Location text.
    pub location: Option<String>,
    /// Public avatar URL.
    pub avatar_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id.into(),
            username: row.username,
            name: row.name,
            bio: row.bio,
            location: row.location,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
        }
    }
}

/// A row of the `exchange_offers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferRow {
    /// Primary key.
    pub id: Uuid,
    /// Proposing user.
    pub sender_id: Uuid,
    /// Receiving user.
    pub receiver_id: Uuid,
    /// Plant put forward.
    pub sender_plant_id: Uuid,
    /// Plant requested.
    pub receiver_plant_id: Uuid,
    /// Receiver's picks, `uuid[]`.
    pub selected_plant_ids: Vec<Uuid>,
    /// Negotiation status.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last transition timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OfferRow> for ExchangeOffer {
    type Error = MarketError;

    fn try_from(row: OfferRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            sender_id: row.sender_id.into(),
            receiver_id: row.receiver_id.into(),
            sender_plant_id: row.sender_plant_id.into(),
            receiver_plant_id: row.receiver_plant_id.into(),
            selected_plant_ids: row
                .selected_plant_ids
                .into_iter()
                .map(PlantId::from)
                .collect(),
            status: row.status.parse().map_err(corrupt("exchange_offers.status"))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row of the `notifications` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    /// Primary key.
    pub id: Uuid,
    /// Recipient.
    pub user_id: Uuid,
    /// Notification category.
    #[sqlx(rename = "type")]
    pub kind: String,
    /// Text.
    pub message: String,
    /// Related offer, if any.
    pub related_exchange_id: Option<Uuid>,
    /// Read flag.
    pub read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = MarketError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            user_id: row.user_id.into(),
            kind: row.kind.parse().map_err(corrupt("notifications.type"))?,
            message: row.message,
            related_exchange_id: row.related_exchange_id.map(Into::into),
            read: row.read,
            created_at: row.created_at,
        })
    }
}

fn corrupt(column: &'static str) -> impl Fn(MarketError) -> MarketError {
    move |err| MarketError::PersistenceError(format!("bad value in {column}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OfferStatus, PlantStatus};

    fn plant_row(status: &str) -> PlantRow {
        PlantRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Calathea".to_string(),
            species: "Goeppertia orbifolia".to_string(),
            subspecies: None,
            location: "Ghent".to_string(),
            description: None,
            image_url: None,
            plant_type: "houseplant".to_string(),
            status: status.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn plant_row_converts() {
        let plant = Plant::try_from(plant_row("pending"));
        assert!(matches!(plant, Ok(ref p) if p.status == PlantStatus::Pending));
    }

    #[test]
    fn unknown_status_is_a_persistence_error() {
        assert!(matches!(
            Plant::try_from(plant_row("sold")),
            Err(MarketError::PersistenceError(_))
        ));
    }

    #[test]
    fn offer_row_keeps_selection_order() {
        let picks = vec![Uuid::new_v4(), Uuid::new_v4()];
        let row = OfferRow {
            id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            sender_plant_id: Uuid::new_v4(),
            receiver_plant_id: Uuid::new_v4(),
            selected_plant_ids: picks.clone(),
            status: "awaiting_confirmation".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let Ok(offer) = ExchangeOffer::try_from(row) else {
            unreachable!("valid row");
        };
        assert_eq!(offer.status, OfferStatus::AwaitingConfirmation);
        let ids: Vec<Uuid> = offer.selected_plant_ids.into_iter().map(Into::into).collect();
        assert_eq!(ids, picks);
    }
}
