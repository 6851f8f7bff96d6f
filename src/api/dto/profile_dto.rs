//! Profile DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Profile, UserId};

/// A profile as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileDto {
    /// User identifier.
    pub id: UserId,
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

impl From<Profile> for ProfileDto {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            username: p.username,
            name: p.name,
            bio: p.bio,
            location: p.location,
            avatar_url: p.avatar_url,
            created_at: p.created_at,
        }
    }
}
