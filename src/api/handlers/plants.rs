//! Plant listing handlers: create, browse, get, update, delete, image.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{PlantDto, PlantListParams, PlantListResponse};
use crate::app_state::AppState;
use crate::domain::{NewPlant, PlantId, PlantPatch, Session};
use crate::error::{ErrorResponse, MarketError};
use crate::persistence::Bucket;

/// `POST /plants` — List a new plant.
///
/// # Errors
///
/// Returns [`MarketError`] on invalid fields or a missing session.
#[utoipa::path(
    post,
    path = "/api/v1/plants",
    tag = "Plants",
    summary = "List a plant",
    description = "Creates an `available` listing owned by the caller.",
    request_body = NewPlant,
    responses(
        (status = 201, description = "Plant listed", body = PlantDto),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "No session", body = ErrorResponse),
    )
)]
pub async fn create_plant(
    State(state): State<AppState>,
    session: Session,
    Json(draft): Json<NewPlant>,
) -> Result<impl IntoResponse, MarketError> {
    let plant = state.listings.create(&session, draft).await?;
    Ok((StatusCode::CREATED, Json(PlantDto::from(plant))))
}

/// `GET /plants` — Browse listings.
///
/// # Errors
///
/// Returns [`MarketError`] on backend failure.
#[utoipa::path(
    get,
    path = "/api/v1/plants",
    tag = "Plants",
    summary = "Browse plants",
    description = "Lists plants newest first, narrowed by owner and status, then filtered by search term and location substring.",
    params(PlantListParams),
    responses(
        (status = 200, description = "Matching plants", body = PlantListResponse),
        (status = 401, description = "No session", body = ErrorResponse),
    )
)]
pub async fn list_plants(
    State(state): State<AppState>,
    _session: Session,
    Query(params): Query<PlantListParams>,
) -> Result<Json<PlantListResponse>, MarketError> {
    let plants = state.listings.browse(&params.into()).await?;
    Ok(Json(plants.into()))
}

/// `GET /plants/{id}` — Get one listing.
///
/// # Errors
///
/// Returns [`MarketError::PlantNotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/plants/{id}",
    tag = "Plants",
    summary = "Get a plant",
    params(("id" = PlantId, Path, description = "Plant identifier")),
    responses(
        (status = 200, description = "Plant", body = PlantDto),
        (status = 404, description = "Plant not found", body = ErrorResponse),
    )
)]
pub async fn get_plant(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<PlantId>,
) -> Result<Json<PlantDto>, MarketError> {
    Ok(Json(state.listings.get(id).await?.into()))
}

/// `PATCH /plants/{id}` — Edit the caller's listing.
///
/// # Errors
///
/// Returns [`MarketError`] if the caller is not the owner or the edit is
/// invalid.
#[utoipa::path(
    patch,
    path = "/api/v1/plants/{id}",
    tag = "Plants",
    summary = "Edit a plant",
    description = "Absent fields are unchanged; an empty string clears an optional field. `status` may toggle between `available` and `pending`.",
    params(("id" = PlantId, Path, description = "Plant identifier")),
    request_body = PlantPatch,
    responses(
        (status = 200, description = "Updated plant", body = PlantDto),
        (status = 400, description = "Invalid edit", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Plant not found", body = ErrorResponse),
    )
)]
pub async fn update_plant(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<PlantId>,
    Json(patch): Json<PlantPatch>,
) -> Result<Json<PlantDto>, MarketError> {
    Ok(Json(state.listings.update(&session, id, patch).await?.into()))
}

/// `DELETE /plants/{id}` — Remove the caller's listing.
///
/// # Errors
///
/// Returns [`MarketError`] if the caller is not the owner.
#[utoipa::path(
    delete,
    path = "/api/v1/plants/{id}",
    tag = "Plants",
    summary = "Delete a plant",
    params(("id" = PlantId, Path, description = "Plant identifier")),
    responses(
        (status = 204, description = "Plant deleted"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Plant not found", body = ErrorResponse),
    )
)]
pub async fn delete_plant(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<PlantId>,
) -> Result<StatusCode, MarketError> {
    state.listings.delete(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /plants/{id}/image` — Upload the listing photo.
///
/// The request body is the raw image; `Content-Type` selects its format.
///
/// # Errors
///
/// Returns [`MarketError`] on an oversized or non-image body, or if the
/// caller is not the owner.
#[utoipa::path(
    put,
    path = "/api/v1/plants/{id}/image",
    tag = "Plants",
    summary = "Upload a plant photo",
    params(("id" = PlantId, Path, description = "Plant identifier")),
    request_body(content = Vec<u8>, description = "PNG, JPEG, GIF or WebP, at most 10 MB", content_type = "image/*"),
    responses(
        (status = 200, description = "Plant with its new image URL", body = PlantDto),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 413, description = "Image too large", body = ErrorResponse),
        (status = 415, description = "Not an accepted image type", body = ErrorResponse),
    )
)]
pub async fn upload_plant_image(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<PlantId>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PlantDto>, MarketError> {
    let plant = state
        .listings
        .upload_image(&session, id, &body, content_type(&headers))
        .await?;
    Ok(Json(plant.into()))
}

/// `Content-Type` header value, or empty when absent.
pub(crate) fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Plant routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/plants", post(create_plant).get(list_plants))
        .route(
            "/plants/{id}",
            get(get_plant).patch(update_plant).delete(delete_plant),
        )
        .route(
            "/plants/{id}/image",
            put(upload_plant_image).layer(DefaultBodyLimit::max(Bucket::Plants.max_bytes() + 1)),
        )
}
