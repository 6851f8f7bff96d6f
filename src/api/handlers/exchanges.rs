//! Exchange offer handlers: create, list, get, candidates and the three
//! negotiation actions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    ConfirmResponse, CreateOfferRequest, OfferDto, OfferListParams, OfferListResponse,
    PlantListResponse, SelectPlantsRequest,
};
use crate::app_state::AppState;
use crate::domain::{OfferId, Session};
use crate::error::{ErrorResponse, MarketError};

/// `POST /exchanges` — Offer one of the caller's plants for another user's.
///
/// # Errors
///
/// Returns [`MarketError`] if the target is unavailable or the caller has
/// nothing to offer.
#[utoipa::path(
    post,
    path = "/api/v1/exchanges",
    tag = "Exchanges",
    summary = "Create an exchange offer",
    description = "Creates a `pending` offer and notifies the owner of the requested plant.",
    request_body = CreateOfferRequest,
    responses(
        (status = 201, description = "Offer created", body = OfferDto),
        (status = 404, description = "Plant not found", body = ErrorResponse),
        (status = 422, description = "No available plant to offer, or target unavailable", body = ErrorResponse),
    )
)]
pub async fn create_offer(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CreateOfferRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let offer = state.exchanges.create(&session, req.into()).await?;
    Ok((StatusCode::CREATED, Json(OfferDto::from(offer))))
}

/// `GET /exchanges` — Offers the caller takes part in.
///
/// # Errors
///
/// Returns [`MarketError`] on backend failure.
#[utoipa::path(
    get,
    path = "/api/v1/exchanges",
    tag = "Exchanges",
    summary = "List own offers",
    params(OfferListParams),
    responses(
        (status = 200, description = "Offers, newest first", body = OfferListResponse),
    )
)]
pub async fn list_offers(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<OfferListParams>,
) -> Result<Json<OfferListResponse>, MarketError> {
    let offers = state.exchanges.list_for(&session, params.status).await?;
    Ok(Json(offers.into()))
}

/// `GET /exchanges/{id}` — One offer.
///
/// # Errors
///
/// Returns [`MarketError`] if missing or the caller is not a party.
#[utoipa::path(
    get,
    path = "/api/v1/exchanges/{id}",
    tag = "Exchanges",
    summary = "Get an offer",
    params(("id" = OfferId, Path, description = "Offer identifier")),
    responses(
        (status = 200, description = "Offer", body = OfferDto),
        (status = 403, description = "Not a party to the offer", body = ErrorResponse),
        (status = 404, description = "Offer not found", body = ErrorResponse),
    )
)]
pub async fn get_offer(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OfferId>,
) -> Result<Json<OfferDto>, MarketError> {
    Ok(Json(state.exchanges.get(&session, id).await?.into()))
}

/// `GET /exchanges/{id}/candidates` — Plants the receiver may select.
///
/// # Errors
///
/// Returns [`MarketError`] if missing or the caller is not a party.
#[utoipa::path(
    get,
    path = "/api/v1/exchanges/{id}/candidates",
    tag = "Exchanges",
    summary = "List selection candidates",
    description = "The sender's currently available plants, oldest first.",
    params(("id" = OfferId, Path, description = "Offer identifier")),
    responses(
        (status = 200, description = "Candidate plants", body = PlantListResponse),
        (status = 403, description = "Not a party to the offer", body = ErrorResponse),
    )
)]
pub async fn list_candidates(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OfferId>,
) -> Result<Json<PlantListResponse>, MarketError> {
    Ok(Json(state.exchanges.candidates(&session, id).await?.into()))
}

/// `POST /exchanges/{id}/select` — Receiver picks sender plants.
///
/// # Errors
///
/// Returns [`MarketError`] on an empty or invalid selection, a wrong
/// actor, or a non-`pending` offer.
#[utoipa::path(
    post,
    path = "/api/v1/exchanges/{id}/select",
    tag = "Exchanges",
    summary = "Select plants",
    params(("id" = OfferId, Path, description = "Offer identifier")),
    request_body = SelectPlantsRequest,
    responses(
        (status = 200, description = "Offer awaiting confirmation", body = OfferDto),
        (status = 403, description = "Caller is not the receiver", body = ErrorResponse),
        (status = 409, description = "Offer is not pending", body = ErrorResponse),
        (status = 422, description = "Empty selection or unavailable plant", body = ErrorResponse),
    )
)]
pub async fn select_plants(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OfferId>,
    Json(req): Json<SelectPlantsRequest>,
) -> Result<Json<OfferDto>, MarketError> {
    let offer = state.exchanges.select(&session, id, &req.plant_ids).await?;
    Ok(Json(offer.into()))
}

/// `POST /exchanges/{id}/confirm` — Complete the exchange.
///
/// # Errors
///
/// Returns [`MarketError`] unless the offer awaits confirmation and the
/// caller is a party.
#[utoipa::path(
    post,
    path = "/api/v1/exchanges/{id}/confirm",
    tag = "Exchanges",
    summary = "Confirm an offer",
    description = "Completes the offer and marks every traded plant `exchanged`. Plants that could not be updated are listed in `failed_plant_ids`.",
    params(("id" = OfferId, Path, description = "Offer identifier")),
    responses(
        (status = 200, description = "Offer completed", body = ConfirmResponse),
        (status = 403, description = "Not a party to the offer", body = ErrorResponse),
        (status = 409, description = "Offer is not awaiting confirmation", body = ErrorResponse),
    )
)]
pub async fn confirm_offer(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OfferId>,
) -> Result<Json<ConfirmResponse>, MarketError> {
    Ok(Json(state.exchanges.confirm(&session, id).await?.into()))
}

/// `POST /exchanges/{id}/cancel` — Withdraw an open offer.
///
/// # Errors
///
/// Returns [`MarketError`] if the offer is already completed or cancelled,
/// or the caller is not a party.
#[utoipa::path(
    post,
    path = "/api/v1/exchanges/{id}/cancel",
    tag = "Exchanges",
    summary = "Cancel an offer",
    params(("id" = OfferId, Path, description = "Offer identifier")),
    responses(
        (status = 200, description = "Offer cancelled", body = OfferDto),
        (status = 403, description = "Not a party to the offer", body = ErrorResponse),
        (status = 409, description = "Offer already closed", body = ErrorResponse),
    )
)]
pub async fn cancel_offer(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OfferId>,
) -> Result<Json<OfferDto>, MarketError> {
    Ok(Json(state.exchanges.cancel(&session, id).await?.into()))
}

/// Exchange routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/exchanges", post(create_offer).get(list_offers))
        .route("/exchanges/{id}", get(get_offer))
        .route("/exchanges/{id}/candidates", get(list_candidates))
        .route("/exchanges/{id}/select", post(select_plants))
        .route("/exchanges/{id}/confirm", post(confirm_offer))
        .route("/exchanges/{id}/cancel", post(cancel_offer))
}
