//! User profiles, one per user identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;
use crate::error::MarketError;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;
const MAX_NAME: usize = 100;
const MAX_BIO: usize = 500;

/// Public profile of a marketplace user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Equal to the owning user's identity.
    pub id: UserId,
    /// Unique handle.
    pub username: String,
    /// Display name.
    pub name: Option<String>,
    /// Short self-description.
    pub bio: Option<String>,
    /// Free-form location.
    pub location: Option<String>,
    /// Public URL of the avatar image.
    pub avatar_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Builds the profile for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] on an invalid username or an
    /// overlong field.
    pub fn new(user_id: UserId, draft: NewProfile) -> Result<Self, MarketError> {
        Ok(Self {
            id: user_id,
            username: validate_username(&draft.username)?,
            name: clean(draft.name.as_deref(), "name", MAX_NAME)?,
            bio: clean(draft.bio.as_deref(), "bio", MAX_BIO)?,
            location: clean(draft.location.as_deref(), "location", MAX_NAME)?,
            avatar_url: None,
            created_at: Utc::now(),
        })
    }

    /// Applies an owner edit. Leaves `self` untouched on error.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] on invalid field values.
    pub fn apply(&mut self, patch: ProfilePatch) -> Result<(), MarketError> {
        let mut next = self.clone();
        if let Some(username) = patch.username {
            next.username = validate_username(&username)?;
        }
        if let Some(name) = patch.name {
            next.name = clean(Some(&name), "name", MAX_NAME)?;
        }
        if let Some(bio) = patch.bio {
            next.bio = clean(Some(&bio), "bio", MAX_BIO)?;
        }
        if let Some(location) = patch.location {
            next.location = clean(Some(&location), "location", MAX_NAME)?;
        }
        *self = next;
        Ok(())
    }
}

/// Fields supplied when a user first creates their profile.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewProfile {
    /// Unique handle, 3–30 of `[A-Za-z0-9_.-]`.
    pub username: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Short self-description.
    #[serde(default)]
    pub bio: Option<String>,
    /// Free-form location.
    #[serde(default)]
    pub location: Option<String>,
}

/// Partial profile edit. Absent fields are left unchanged; an empty string
/// clears an optional field.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProfilePatch {
    /// New handle.
    #[serde(default)]
    pub username: Option<String>,
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New bio.
    #[serde(default)]
    pub bio: Option<String>,
    /// New location.
    #[serde(default)]
    pub location: Option<String>,
}

fn validate_username(raw: &str) -> Result<String, MarketError> {
    let username = raw.trim();
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(MarketError::InvalidRequest(format!(
            "username must be {USERNAME_MIN}-{USERNAME_MAX} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(MarketError::InvalidRequest(
            "username may contain only letters, digits, '_', '.' and '-'".to_string(),
        ));
    }
    Ok(username.to_string())
}

fn clean(value: Option<&str>, field: &str, max: usize) -> Result<Option<String>, MarketError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max {
        return Err(MarketError::InvalidRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(Some(value.to_string()))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn creates_profile_keyed_by_user() {
        let user = UserId::new();
        let Ok(profile) = Profile::new(
            user,
            NewProfile {
                username: "fern_lover".to_string(),
                bio: Some("  ".to_string()),
                ..NewProfile::default()
            },
        ) else {
            panic!("valid profile rejected");
        };
        assert_eq!(profile.id, user);
        assert_eq!(profile.bio, None);
    }

    #[test]
    fn rejects_bad_usernames() {
        for bad in ["ab", "has space", "emoji🌱", &"x".repeat(31)] {
            let draft = NewProfile {
                username: bad.to_string(),
                ..NewProfile::default()
            };
            assert!(Profile::new(UserId::new(), draft).is_err(), "{bad}");
        }
    }

    #[test]
    fn failed_patch_leaves_profile_unchanged() {
        let Ok(mut profile) = Profile::new(
            UserId::new(),
            NewProfile {
                username: "cactus.jack".to_string(),
                ..NewProfile::default()
            },
        ) else {
            panic!("valid profile rejected");
        };
        let before = profile.clone();
        let patch = ProfilePatch {
            name: Some("Jack".to_string()),
            bio: Some("b".repeat(501)),
            ..ProfilePatch::default()
        };
        assert!(profile.apply(patch).is_err());
        assert_eq!(profile, before);
    }
}
