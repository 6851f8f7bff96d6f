//! Actor identity extraction.
//!
//! The upstream auth proxy authenticates the caller and forwards its user
//! id in the [`USER_ID_HEADER`] header. Handlers take a
//! [`Session`] argument to require it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::domain::{Session, UserId};
use crate::error::MarketError;

/// Header carrying the authenticated user's UUID.
pub const USER_ID_HEADER: &str = "x-user-id";

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .ok_or(MarketError::Unauthenticated)?;
        Ok(Self::new(UserId::from_uuid(user_id)))
    }
}
