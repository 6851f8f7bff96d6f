//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use crate::api::dto::{
    AckResponse, ConfirmResponse, CreateOfferRequest, NotificationDto, NotificationListResponse,
    OfferDto, OfferListResponse, PlantDto, PlantListResponse, ProfileDto, SelectPlantsRequest,
    UnreadCountResponse, UpdatedCountResponse,
};
use crate::api::handlers::system::HealthResponse;
use crate::api::handlers::{exchanges, notifications, plants, profiles, system};
use crate::domain::{
    NewPlant, NewProfile, NotificationId, NotificationKind, OfferId, OfferStatus,
    OfferStatusFilter, PlantId, PlantPatch, PlantStatus, ProfilePatch, UserId,
};
use crate::error::{ErrorBody, ErrorResponse};

/// The service's OpenAPI 3.1 document.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "plant-exchange",
        description = "Peer-to-peer plant exchange: listings, profiles, exchange offers and notifications. \
            Every `/api/v1` route expects the caller's user id in the `x-user-id` header.",
    ),
    paths(
        plants::create_plant,
        plants::list_plants,
        plants::get_plant,
        plants::update_plant,
        plants::delete_plant,
        plants::upload_plant_image,
        profiles::create_profile,
        profiles::get_my_profile,
        profiles::update_my_profile,
        profiles::upload_avatar,
        profiles::get_profile,
        exchanges::create_offer,
        exchanges::list_offers,
        exchanges::get_offer,
        exchanges::list_candidates,
        exchanges::select_plants,
        exchanges::confirm_offer,
        exchanges::cancel_offer,
        notifications::list_notifications,
        notifications::unread_count,
        notifications::mark_read,
        notifications::mark_all_read,
        system::health_handler,
        system::openapi_handler,
    ),
    components(schemas(
        ErrorResponse,
        ErrorBody,
        HealthResponse,
        AckResponse,
        UpdatedCountResponse,
        PlantId,
        UserId,
        OfferId,
        NotificationId,
        PlantStatus,
        OfferStatus,
        OfferStatusFilter,
        NotificationKind,
        NewPlant,
        PlantPatch,
        PlantDto,
        PlantListResponse,
        NewProfile,
        ProfilePatch,
        ProfileDto,
        CreateOfferRequest,
        SelectPlantsRequest,
        OfferDto,
        OfferListResponse,
        ConfirmResponse,
        NotificationDto,
        NotificationListResponse,
        UnreadCountResponse,
    )),
    tags(
        (name = "Plants", description = "Plant listings and photos"),
        (name = "Profiles", description = "User profiles and avatars"),
        (name = "Exchanges", description = "Exchange offers and their negotiation"),
        (name = "Notifications", description = "Per-user notification feed"),
        (name = "System", description = "Health and API documentation"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/v1/plants",
            "/api/v1/plants/{id}",
            "/api/v1/plants/{id}/image",
            "/api/v1/profiles",
            "/api/v1/profiles/me",
            "/api/v1/exchanges",
            "/api/v1/exchanges/{id}/confirm",
            "/api/v1/notifications",
            "/health",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == expected), "missing {expected}");
        }
        assert!(
            doc.components
                .is_some_and(|c| c.schemas.contains_key("ErrorResponse"))
        );
    }
}
