//! Profile handlers.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use super::plants::content_type;
use crate::api::dto::ProfileDto;
use crate::app_state::AppState;
use crate::domain::{NewProfile, ProfilePatch, Session, UserId};
use crate::error::{ErrorResponse, MarketError};
use crate::persistence::Bucket;

/// `POST /profiles` — Create the caller's profile.
///
/// # Errors
///
/// Returns [`MarketError::Conflict`] if it exists or the username is taken.
#[utoipa::path(
    post,
    path = "/api/v1/profiles",
    tag = "Profiles",
    summary = "Create own profile",
    request_body = NewProfile,
    responses(
        (status = 201, description = "Profile created", body = ProfileDto),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 409, description = "Profile exists or username taken", body = ErrorResponse),
    )
)]
pub async fn create_profile(
    State(state): State<AppState>,
    session: Session,
    Json(draft): Json<NewProfile>,
) -> Result<impl IntoResponse, MarketError> {
    let profile = state.profiles.create(&session, draft).await?;
    Ok((StatusCode::CREATED, Json(ProfileDto::from(profile))))
}

/// `GET /profiles/me` — The caller's profile.
///
/// # Errors
///
/// Returns [`MarketError::ProfileNotFound`] before one is created.
#[utoipa::path(
    get,
    path = "/api/v1/profiles/me",
    tag = "Profiles",
    summary = "Get own profile",
    responses(
        (status = 200, description = "Profile", body = ProfileDto),
        (status = 404, description = "No profile yet", body = ErrorResponse),
    )
)]
pub async fn get_my_profile(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ProfileDto>, MarketError> {
    Ok(Json(state.profiles.me(&session).await?.into()))
}

/// `PATCH /profiles/me` — Edit the caller's profile.
///
/// # Errors
///
/// Returns [`MarketError`] on invalid values or a taken username.
#[utoipa::path(
    patch,
    path = "/api/v1/profiles/me",
    tag = "Profiles",
    summary = "Edit own profile",
    request_body = ProfilePatch,
    responses(
        (status = 200, description = "Updated profile", body = ProfileDto),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 409, description = "Username taken", body = ErrorResponse),
    )
)]
pub async fn update_my_profile(
    State(state): State<AppState>,
    session: Session,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<ProfileDto>, MarketError> {
    Ok(Json(state.profiles.update(&session, patch).await?.into()))
}

/// `PUT /profiles/me/avatar` — Upload the caller's avatar.
///
/// # Errors
///
/// Returns [`MarketError`] on an oversized or non-image body.
#[utoipa::path(
    put,
    path = "/api/v1/profiles/me/avatar",
    tag = "Profiles",
    summary = "Upload own avatar",
    request_body(content = Vec<u8>, description = "PNG, JPEG, GIF or WebP, at most 5 MB", content_type = "image/*"),
    responses(
        (status = 200, description = "Profile with its new avatar URL", body = ProfileDto),
        (status = 413, description = "Image too large", body = ErrorResponse),
        (status = 415, description = "Not an accepted image type", body = ErrorResponse),
    )
)]
pub async fn upload_avatar(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ProfileDto>, MarketError> {
    let profile = state
        .profiles
        .upload_avatar(&session, &body, content_type(&headers))
        .await?;
    Ok(Json(profile.into()))
}

/// `GET /profiles/{id}` — Any user's profile.
///
/// # Errors
///
/// Returns [`MarketError::ProfileNotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/profiles/{id}",
    tag = "Profiles",
    summary = "Get a profile",
    params(("id" = UserId, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Profile", body = ProfileDto),
        (status = 404, description = "Profile not found", body = ErrorResponse),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<UserId>,
) -> Result<Json<ProfileDto>, MarketError> {
    Ok(Json(state.profiles.get(id).await?.into()))
}

/// Profile routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profiles", post(create_profile))
        .route("/profiles/me", get(get_my_profile).patch(update_my_profile))
        .route(
            "/profiles/me/avatar",
            put(upload_avatar).layer(DefaultBodyLimit::max(Bucket::Avatars.max_bytes() + 1)),
        )
        .route("/profiles/{id}", get(get_profile))
}
