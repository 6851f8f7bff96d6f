//! Profile service.

use std::sync::Arc;

use crate::domain::{NewProfile, Profile, ProfilePatch, Session, UserId};
use crate::error::MarketError;
use crate::persistence::{Backend, BlobStore, Bucket, storage};

/// Profiles, one per user, each editable only by its user.
#[derive(Debug, Clone)]
pub struct ProfileService {
    backend: Arc<dyn Backend>,
    blobs: Arc<dyn BlobStore>,
}

impl ProfileService {
    /// Creates a new `ProfileService`.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { backend, blobs }
    }

    /// Creates the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Conflict`] if the caller already has a
    /// profile or the username is taken.
    pub async fn create(
        &self,
        session: &Session,
        draft: NewProfile,
    ) -> Result<Profile, MarketError> {
        let profile = Profile::new(session.user_id(), draft)?;
        self.backend.insert_profile(&profile).await?;
        tracing::info!(user_id = %profile.id, username = %profile.username, "profile created");
        Ok(profile)
    }

    /// The caller's own profile.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ProfileNotFound`] if none was created yet.
    pub async fn me(&self, session: &Session) -> Result<Profile, MarketError> {
        self.get(session.user_id()).await
    }

    /// Any user's profile.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ProfileNotFound`] if it does not exist.
    pub async fn get(&self, id: UserId) -> Result<Profile, MarketError> {
        self.backend
            .get_profile(id)
            .await?
            .ok_or(MarketError::ProfileNotFound(id.into()))
    }

    /// Applies a patch to the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] on invalid values and
    /// [`MarketError::Conflict`] if the new username is taken.
    pub async fn update(
        &self,
        session: &Session,
        patch: ProfilePatch,
    ) -> Result<Profile, MarketError> {
        let mut profile = self.me(session).await?;
        profile.apply(patch)?;
        self.save(&profile).await?;
        tracing::info!(user_id = %profile.id, "profile updated");
        Ok(profile)
    }

    /// Uploads an avatar and points the caller's profile at it.
    ///
    /// # Errors
    ///
    /// Returns the upload errors of [`Bucket::check_upload`] and
    /// [`MarketError::ProfileNotFound`] if the caller has no profile.
    pub async fn upload_avatar(
        &self,
        session: &Session,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<Profile, MarketError> {
        let mut profile = self.me(session).await?;
        let ext = Bucket::Avatars.check_upload(bytes.len(), content_type)?;
        let path = storage::object_path(session.user_id(), ext);
        let url = self
            .blobs
            .upload(Bucket::Avatars, &path, bytes, content_type)
            .await?;
        profile.avatar_url = Some(url);
        self.save(&profile).await?;
        Ok(profile)
    }

    async fn save(&self, profile: &Profile) -> Result<(), MarketError> {
        if self.backend.update_profile(profile).await? {
            Ok(())
        } else {
            Err(MarketError::ProfileNotFound(profile.id.into()))
        }
    }
}
