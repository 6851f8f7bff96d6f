//! Plant listing DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{ListingFilter, Plant, PlantId, PlantStatus, UserId};
use crate::service::BrowseQuery;

/// A plant listing as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlantDto {
    /// Plant identifier.
    pub id: PlantId,
    /// Listing user.
    pub owner_id: UserId,
    /// Common name.
    pub name: String,
    /// Botanical species.
    pub species: String,
    /// Subspecies or cultivar.
    pub subspecies: Option<String>,
    /// Location text.
    pub location: String,
    /// Description.
    pub description: Option<String>,
    /// Public photo URL.
    pub image_url: Option<String>,
    /// Category.
    pub plant_type: String,
    /// Lifecycle status.
    pub status: PlantStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Plant> for PlantDto {
    fn from(p: Plant) -> Self {
        Self {
            id: p.id,
            owner_id: p.owner_id,
            name: p.name,
            species: p.species,
            subspecies: p.subspecies,
            location: p.location,
            description: p.description,
            image_url: p.image_url,
            plant_type: p.plant_type,
            status: p.status,
            created_at: p.created_at,
        }
    }
}

/// Response body for `GET /plants`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlantListResponse {
    /// Matching plants, newest first.
    pub data: Vec<PlantDto>,
    /// Number of entries in `data`.
    pub total: usize,
}

impl From<Vec<Plant>> for PlantListResponse {
    fn from(plants: Vec<Plant>) -> Self {
        let data: Vec<PlantDto> = plants.into_iter().map(PlantDto::from).collect();
        Self {
            total: data.len(),
            data,
        }
    }
}

/// Query parameters for `GET /plants`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PlantListParams {
    /// Case-insensitive substring of name, species or description.
    #[serde(default)]
    pub search: Option<String>,
    /// Case-insensitive substring of the location.
    #[serde(default)]
    pub location: Option<String>,
    /// Only this user's plants.
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    /// Only plants in this status.
    #[serde(default)]
    pub status: Option<PlantStatus>,
}

impl From<PlantListParams> for BrowseQuery {
    fn from(params: PlantListParams) -> Self {
        Self {
            owner_id: params.owner_id.map(UserId::from),
            status: params.status,
            filter: ListingFilter::new(
                params.search.unwrap_or_default(),
                params.location.unwrap_or_default(),
            ),
        }
    }
}
