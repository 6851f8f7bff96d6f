//! Listing service: plant CRUD scoped to the owning user.

use std::sync::Arc;

use crate::domain::{
    ListingFilter, NewPlant, Plant, PlantId, PlantPatch, PlantStatus, Session, UserId,
};
use crate::error::MarketError;
use crate::persistence::{Backend, BlobStore, Bucket, PlantQuery, storage};

/// Browse parameters: backend narrowing plus the in-memory text filter.
#[derive(Debug, Clone, Default)]
pub struct BrowseQuery {
    /// Only plants listed by this user.
    pub owner_id: Option<UserId>,
    /// Only plants in this status.
    pub status: Option<PlantStatus>,
    /// Search term and location substring.
    pub filter: ListingFilter,
}

/// Plant listings and their photos.
#[derive(Debug, Clone)]
pub struct ListingService {
    backend: Arc<dyn Backend>,
    blobs: Arc<dyn BlobStore>,
}

impl ListingService {
    /// Creates a new `ListingService`.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { backend, blobs }
    }

    /// Lists a new plant owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] on invalid fields.
    pub async fn create(&self, session: &Session, draft: NewPlant) -> Result<Plant, MarketError> {
        let plant = Plant::new(session.user_id(), draft)?;
        self.backend.insert_plant(&plant).await?;
        tracing::info!(plant_id = %plant.id, owner_id = %plant.owner_id, "plant listed");
        Ok(plant)
    }

    /// Fetches plants newest first, then applies the listing filter.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn browse(&self, query: &BrowseQuery) -> Result<Vec<Plant>, MarketError> {
        let backend_query = PlantQuery {
            owner_id: query.owner_id,
            status: query.status,
            ..PlantQuery::default()
        };
        let plants = self.backend.list_plants(&backend_query).await?;
        Ok(query.filter.retain(plants))
    }

    /// Fetches one plant.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::PlantNotFound`] if it does not exist.
    pub async fn get(&self, id: PlantId) -> Result<Plant, MarketError> {
        self.backend
            .get_plant(id)
            .await?
            .ok_or(MarketError::PlantNotFound(id.into()))
    }

    /// Applies an owner edit.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Forbidden`] if the caller is not the owner
    /// and [`MarketError::InvalidRequest`] on an invalid edit.
    pub async fn update(
        &self,
        session: &Session,
        id: PlantId,
        patch: PlantPatch,
    ) -> Result<Plant, MarketError> {
        let mut plant = self.owned(session, id).await?;
        plant.apply(patch)?;
        self.save(&plant).await?;
        tracing::info!(plant_id = %id, status = %plant.status, "plant updated");
        Ok(plant)
    }

    /// Removes the caller's listing.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Forbidden`] if the caller is not the owner.
    pub async fn delete(&self, session: &Session, id: PlantId) -> Result<(), MarketError> {
        self.owned(session, id).await?;
        if !self.backend.delete_plant(id).await? {
            return Err(MarketError::PlantNotFound(id.into()));
        }
        tracing::info!(plant_id = %id, "plant deleted");
        Ok(())
    }

    /// Uploads a listing photo and points the plant at it.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Forbidden`] if the caller is not the owner,
    /// and the upload errors of [`Bucket::check_upload`].
    pub async fn upload_image(
        &self,
        session: &Session,
        id: PlantId,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<Plant, MarketError> {
        let mut plant = self.owned(session, id).await?;
        let ext = Bucket::Plants.check_upload(bytes.len(), content_type)?;
        let path = storage::object_path(session.user_id(), ext);
        let url = self
            .blobs
            .upload(Bucket::Plants, &path, bytes, content_type)
            .await?;
        plant.image_url = Some(url);
        self.save(&plant).await?;
        tracing::info!(plant_id = %id, path, "plant image uploaded");
        Ok(plant)
    }

    async fn owned(&self, session: &Session, id: PlantId) -> Result<Plant, MarketError> {
        let plant = self.get(id).await?;
        if !session.is(plant.owner_id) {
            return Err(MarketError::Forbidden("not your plant".to_string()));
        }
        Ok(plant)
    }

    async fn save(&self, plant: &Plant) -> Result<(), MarketError> {
        if self.backend.update_plant(plant).await? {
            Ok(())
        } else {
            Err(MarketError::PlantNotFound(plant.id.into()))
        }
    }
}
