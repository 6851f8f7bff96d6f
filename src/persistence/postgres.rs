//! PostgreSQL implementation of the persistence layer.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use uuid::Uuid;

use super::models::{NotificationRow, OfferRow, PlantRow, ProfileRow};
use super::{Backend, PlantQuery, TimeOrder};
use crate::domain::{
    ExchangeOffer, Notification, NotificationId, OfferId, OfferStatus, Plant, PlantId,
    PlantStatus, Profile, UserId,
};
use crate::error::MarketError;

const PLANT_COLUMNS: &str = "id, owner_id, name, species, subspecies, location, description, \
                             image_url, plant_type, status, created_at";
const PROFILE_COLUMNS: &str = "id, username, name, bio, location, avatar_url, created_at";
const OFFER_COLUMNS: &str = "id, sender_id, receiver_id, sender_plant_id, receiver_plant_id, \
                             selected_plant_ids, status, created_at, updated_at";
const NOTIFICATION_COLUMNS: &str =
    "id, user_id, type, message, related_exchange_id, read, created_at";

/// PostgreSQL-backed row store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Creates a backend over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool to `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::PersistenceError`] if no connection can be
    /// established within `connect_timeout`.
    pub async fn connect(
        url: &str,
        min_connections: u32,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, MarketError> {
        let pool = PgPoolOptions::new()
            .min_connections(min_connections)
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), MarketError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| MarketError::PersistenceError(e.to_string()))
    }
}

/// Maps unique-key violations to [`MarketError::Conflict`].
fn unique_as_conflict(what: &str) -> impl Fn(sqlx::Error) -> MarketError + '_ {
    move |err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            MarketError::Conflict(format!("{what} is taken"))
        }
        _ => MarketError::from(err),
    }
}

fn uuids<T: Copy + Into<Uuid>>(ids: &[T]) -> Vec<Uuid> {
    ids.iter().map(|&id| id.into()).collect()
}

#[async_trait]
impl Backend for PostgresBackend {
    async fn insert_plant(&self, plant: &Plant) -> Result<(), MarketError> {
        sqlx::query(
            "INSERT INTO plants (id, owner_id, name, species, subspecies, location, description, \
             image_url, plant_type, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(plant.id.as_uuid())
        .bind(plant.owner_id.as_uuid())
        .bind(&plant.name)
        .bind(&plant.species)
        .bind(&plant.subspecies)
        .bind(&plant.location)
        .bind(&plant.description)
        .bind(&plant.image_url)
        .bind(&plant.plant_type)
        .bind(plant.status.as_str())
        .bind(plant.created_at)
        .execute(&self.pool)
        .await
        .map_err(unique_as_conflict("plant id"))?;
        Ok(())
    }

    async fn get_plant(&self, id: PlantId) -> Result<Option<Plant>, MarketError> {
        let row = sqlx::query_as::<_, PlantRow>(&format!(
            "SELECT {PLANT_COLUMNS} FROM plants WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Plant::try_from).transpose()
    }

    async fn list_plants(&self, query: &PlantQuery) -> Result<Vec<Plant>, MarketError> {
        let direction = match query.order {
            TimeOrder::NewestFirst => "DESC",
            TimeOrder::OldestFirst => "ASC",
        };
        let rows = sqlx::query_as::<_, PlantRow>(&format!(
            "SELECT {PLANT_COLUMNS} FROM plants \
             WHERE ($1::uuid IS NULL OR owner_id = $1) \
               AND ($2::text IS NULL OR status = $2) \
               AND ($3::uuid[] IS NULL OR id = ANY($3)) \
             ORDER BY created_at {direction}"
        ))
        .bind(query.owner_id.map(Uuid::from))
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.ids.as_deref().map(uuids))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Plant::try_from).collect()
    }

    async fn update_plant(&self, plant: &Plant) -> Result<bool, MarketError> {
        let result = sqlx::query(
            "UPDATE plants SET name = $2, species = $3, subspecies = $4, location = $5, \
             description = $6, image_url = $7, plant_type = $8, status = $9 WHERE id = $1",
        )
        .bind(plant.id.as_uuid())
        .bind(&plant.name)
        .bind(&plant.species)
        .bind(&plant.subspecies)
        .bind(&plant.location)
        .bind(&plant.description)
        .bind(&plant.image_url)
        .bind(&plant.plant_type)
        .bind(plant.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_plant_status(
        &self,
        id: PlantId,
        status: PlantStatus,
    ) -> Result<bool, MarketError> {
        let result = sqlx::query("UPDATE plants SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_plant(&self, id: PlantId) -> Result<bool, MarketError> {
        let result = sqlx::query("DELETE FROM plants WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<(), MarketError> {
        sqlx::query(
            "INSERT INTO profiles (id, username, name, bio, location, avatar_url, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(profile.id.as_uuid())
        .bind(&profile.username)
        .bind(&profile.name)
        .bind(&profile.bio)
        .bind(&profile.location)
        .bind(&profile.avatar_url)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(unique_as_conflict("profile or username"))?;
        Ok(())
    }

    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, MarketError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Profile::from))
    }

    async fn update_profile(&self, profile: &Profile) -> Result<bool, MarketError> {
        let result = sqlx::query(
            "UPDATE profiles SET username = $2, name = $3, bio = $4, location = $5, \
             avatar_url = $6 WHERE id = $1",
        )
        .bind(profile.id.as_uuid())
        .bind(&profile.username)
        .bind(&profile.name)
        .bind(&profile.bio)
        .bind(&profile.location)
        .bind(&profile.avatar_url)
        .execute(&self.pool)
        .await
        .map_err(unique_as_conflict("username"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_offer(&self, offer: &ExchangeOffer) -> Result<(), MarketError> {
        sqlx::query(
            "INSERT INTO exchange_offers (id, sender_id, receiver_id, sender_plant_id, \
             receiver_plant_id, selected_plant_ids, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(offer.id.as_uuid())
        .bind(offer.sender_id.as_uuid())
        .bind(offer.receiver_id.as_uuid())
        .bind(offer.sender_plant_id.as_uuid())
        .bind(offer.receiver_plant_id.as_uuid())
        .bind(uuids(&offer.selected_plant_ids))
        .bind(offer.status.as_str())
        .bind(offer.created_at)
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_offer(&self, id: OfferId) -> Result<Option<ExchangeOffer>, MarketError> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {OFFER_COLUMNS} FROM exchange_offers WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(ExchangeOffer::try_from).transpose()
    }

    async fn list_offers_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<ExchangeOffer>, MarketError> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {OFFER_COLUMNS} FROM exchange_offers \
             WHERE sender_id = $1 OR receiver_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ExchangeOffer::try_from).collect()
    }

    async fn transition_offer(
        &self,
        id: OfferId,
        expected: OfferStatus,
        next: OfferStatus,
        selected: Option<&[PlantId]>,
    ) -> Result<Option<ExchangeOffer>, MarketError> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "UPDATE exchange_offers \
             SET status = $3, selected_plant_ids = COALESCE($4, selected_plant_ids), \
                 updated_at = now() \
             WHERE id = $1 AND status = $2 \
             RETURNING {OFFER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(selected.map(uuids))
        .fetch_optional(&self.pool)
        .await?;
        row.map(ExchangeOffer::try_from).transpose()
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), MarketError> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, type, message, related_exchange_id, read, \
             created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(notification.id.as_uuid())
        .bind(notification.user_id.as_uuid())
        .bind(notification.kind.as_str())
        .bind(&notification.message)
        .bind(notification.related_exchange_id.map(Uuid::from))
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_notifications(
        &self,
        user: UserId,
        unread_only: bool,
        limit: usize,
    ) -> Result<Vec<Notification>, MarketError> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE user_id = $1 AND (NOT $2 OR read = false) \
             ORDER BY created_at DESC LIMIT $3"
        ))
        .bind(user.as_uuid())
        .bind(unread_only)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn count_unread_notifications(&self, user: UserId) -> Result<u64, MarketError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = false",
        )
        .bind(user.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn mark_notification_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> Result<bool, MarketError> {
        let result =
            sqlx::query("UPDATE notifications SET read = true WHERE id = $1 AND user_id = $2")
                .bind(id.as_uuid())
                .bind(user.as_uuid())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_notifications_read(&self, user: UserId) -> Result<u64, MarketError> {
        let result =
            sqlx::query("UPDATE notifications SET read = true WHERE user_id = $1 AND read = false")
                .bind(user.as_uuid())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
