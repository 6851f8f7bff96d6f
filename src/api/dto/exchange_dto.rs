//! Exchange offer DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{ExchangeOffer, OfferId, OfferStatus, OfferStatusFilter, PlantId, UserId};
use crate::service::{ConfirmOutcome, OfferDraft};

/// Request body for `POST /exchanges`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOfferRequest {
    /// The plant the caller wants.
    pub receiver_plant_id: PlantId,
    /// The plant offered. Defaults to the caller's oldest available plant.
    #[serde(default)]
    pub sender_plant_id: Option<PlantId>,
}

impl From<CreateOfferRequest> for OfferDraft {
    fn from(req: CreateOfferRequest) -> Self {
        Self {
            receiver_plant_id: req.receiver_plant_id,
            sender_plant_id: req.sender_plant_id,
        }
    }
}

/// Request body for `POST /exchanges/{id}/select`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SelectPlantsRequest {
    /// Sender plants the receiver wants.
    pub plant_ids: Vec<PlantId>,
}

/// An exchange offer as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OfferDto {
    /// Offer identifier.
    pub id: OfferId,
    /// Proposing user.
    pub sender_id: UserId,
    /// Receiving user.
    pub receiver_id: UserId,
    /// Plant offered.
    pub sender_plant_id: PlantId,
    /// Plant requested.
    pub receiver_plant_id: PlantId,
    /// Receiver's picks.
    pub selected_plant_ids: Vec<PlantId>,
    /// Negotiation status.
    pub status: OfferStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last transition timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<ExchangeOffer> for OfferDto {
    fn from(o: ExchangeOffer) -> Self {
        Self {
            id: o.id,
            sender_id: o.sender_id,
            receiver_id: o.receiver_id,
            sender_plant_id: o.sender_plant_id,
            receiver_plant_id: o.receiver_plant_id,
            selected_plant_ids: o.selected_plant_ids,
            status: o.status,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

/// Response body for `GET /exchanges`.
#[derive(Debug, Serialize, ToSchema)]
pub struct OfferListResponse {
    /// Visible offers, newest first.
    pub data: Vec<OfferDto>,
    /// Number of entries in `data`.
    pub total: usize,
}

impl From<Vec<ExchangeOffer>> for OfferListResponse {
    fn from(offers: Vec<ExchangeOffer>) -> Self {
        let data: Vec<OfferDto> = offers.into_iter().map(OfferDto::from).collect();
        Self {
            total: data.len(),
            data,
        }
    }
}

/// Response body for `POST /exchanges/{id}/confirm`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmResponse {
    /// The completed offer.
    pub offer: OfferDto,
    /// Traded plants that could not be marked `exchanged`.
    pub failed_plant_ids: Vec<PlantId>,
}

impl From<ConfirmOutcome> for ConfirmResponse {
    fn from(outcome: ConfirmOutcome) -> Self {
        Self {
            offer: outcome.offer.into(),
            failed_plant_ids: outcome.failed_plant_ids,
        }
    }
}

/// Query parameters for `GET /exchanges`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OfferListParams {
    /// `all` (default) or one concrete status.
    #[serde(default)]
    pub status: OfferStatusFilter,
}
