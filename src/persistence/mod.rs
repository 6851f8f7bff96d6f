//! Persistence layer: row storage and object storage collaborators.
//!
//! [`Backend`] is the contract the services need from a relational store:
//! row CRUD with equality, inclusion and or-predicate filtering, ordered by
//! a timestamp column. [`storage::BlobStore`] is the object-storage half.
//!
//! Two row stores ship with the crate: [`memory::MemoryBackend`] for tests
//! and local runs, and [`postgres::PostgresBackend`] over `sqlx::PgPool`.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod storage;

use async_trait::async_trait;

use crate::domain::{
    ExchangeOffer, Notification, NotificationId, OfferId, OfferStatus, Plant, PlantId,
    PlantStatus, Profile, UserId,
};
use crate::error::MarketError;

pub use memory::MemoryBackend;
pub use postgres::PostgresBackend;
pub use storage::{BlobStore, Bucket, LocalBlobStore, MemoryBlobStore};

/// Direction of the `created_at` ordering applied to list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeOrder {
    /// Most recent first.
    #[default]
    NewestFirst,
    /// Oldest first.
    OldestFirst,
}

/// Predicate for [`Backend::list_plants`]. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlantQuery {
    /// `owner_id = ?`
    pub owner_id: Option<UserId>,
    /// `status = ?`
    pub status: Option<PlantStatus>,
    /// `id IN (?)`
    pub ids: Option<Vec<PlantId>>,
    /// Ordering by `created_at`.
    pub order: TimeOrder,
}

impl PlantQuery {
    /// Plants owned by `owner_id`.
    #[must_use]
    pub fn owned_by(owner_id: UserId) -> Self {
        Self {
            owner_id: Some(owner_id),
            ..Self::default()
        }
    }

    /// Narrows to `status`.
    #[must_use]
    pub fn with_status(mut self, status: PlantStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Narrows to the given ids.
    #[must_use]
    pub fn with_ids(mut self, ids: Vec<PlantId>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn ordered(mut self, order: TimeOrder) -> Self {
        self.order = order;
        self
    }

    /// Returns `true` if `plant` satisfies every set predicate.
    #[must_use]
    pub fn matches(&self, plant: &Plant) -> bool {
        self.owner_id.is_none_or(|owner| plant.owner_id == owner)
            && self.status.is_none_or(|status| plant.status == status)
            && self.ids.as_ref().is_none_or(|ids| ids.contains(&plant.id))
    }
}

/// Row store for every table the marketplace uses.
///
/// Implementations do not enforce ownership; the service layer does.
/// Writes are single-row and not transactional across rows.
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    // ── plants ──────────────────────────────────────────────────────────

    /// Inserts a new plant row.
    async fn insert_plant(&self, plant: &Plant) -> Result<(), MarketError>;

    /// Fetches a plant by id.
    async fn get_plant(&self, id: PlantId) -> Result<Option<Plant>, MarketError>;

    /// Lists plants matching `query`.
    async fn list_plants(&self, query: &PlantQuery) -> Result<Vec<Plant>, MarketError>;

    /// Overwrites every mutable column of an existing plant. Returns `false`
    /// if the row is gone.
    async fn update_plant(&self, plant: &Plant) -> Result<bool, MarketError>;

    /// Sets the status column of one plant. Returns `false` if the row is
    /// gone.
    async fn set_plant_status(&self, id: PlantId, status: PlantStatus)
    -> Result<bool, MarketError>;

    /// Deletes a plant. Returns `false` if the row was already gone.
    async fn delete_plant(&self, id: PlantId) -> Result<bool, MarketError>;

    // ── profiles ────────────────────────────────────────────────────────

    /// Inserts a new profile.
    ///
    /// Fails with [`MarketError::Conflict`] if the id or username is taken.
    async fn insert_profile(&self, profile: &Profile) -> Result<(), MarketError>;

    /// Fetches a profile by user id.
    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, MarketError>;

    /// Overwrites an existing profile. Returns `false` if the row is gone.
    ///
    /// Fails with [`MarketError::Conflict`] if the new username is taken.
    async fn update_profile(&self, profile: &Profile) -> Result<bool, MarketError>;

    // ── exchange offers ─────────────────────────────────────────────────

    /// Inserts a new offer.
    async fn insert_offer(&self, offer: &ExchangeOffer) -> Result<(), MarketError>;

    /// Fetches an offer by id.
    async fn get_offer(&self, id: OfferId) -> Result<Option<ExchangeOffer>, MarketError>;

    /// Lists offers where `sender_id = user OR receiver_id = user`, newest
    /// first.
    async fn list_offers_for_user(&self, user: UserId)
    -> Result<Vec<ExchangeOffer>, MarketError>;

    /// Moves an offer from `expected` to `next`, replacing the selection
    /// when `selected` is given. The write only happens while the stored
    /// status still equals `expected`; returns the updated row, or `None`
    /// if the offer is missing or its status moved.
    async fn transition_offer(
        &self,
        id: OfferId,
        expected: OfferStatus,
        next: OfferStatus,
        selected: Option<&[PlantId]>,
    ) -> Result<Option<ExchangeOffer>, MarketError>;

    // ── notifications ───────────────────────────────────────────────────

    /// Inserts a notification.
    async fn insert_notification(&self, notification: &Notification) -> Result<(), MarketError>;

    /// Lists a user's notifications newest first, at most `limit` rows.
    async fn list_notifications(
        &self,
        user: UserId,
        unread_only: bool,
        limit: usize,
    ) -> Result<Vec<Notification>, MarketError>;

    /// Counts a user's unread notifications.
    async fn count_unread_notifications(&self, user: UserId) -> Result<u64, MarketError>;

    /// Marks one of `user`'s notifications read. Returns `false` if no such
    /// notification belongs to `user`.
    async fn mark_notification_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> Result<bool, MarketError>;

    /// Marks every unread notification of `user` read, returning how many
    /// changed.
    async fn mark_all_notifications_read(&self, user: UserId) -> Result<u64, MarketError>;
}
