//! In-process row store.
//!
//! Keeps every table in a `Vec` behind one [`tokio::sync::RwLock`], so rows
//! come back in insertion order before the timestamp sort is applied. Used
//! by the test suite and by `BACKEND=memory` runs; nothing survives a
//! restart.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Backend, PlantQuery, TimeOrder};
use crate::domain::{
    ExchangeOffer, Notification, NotificationId, OfferId, OfferStatus, Plant, PlantId,
    PlantStatus, Profile, UserId,
};
use crate::error::MarketError;

#[derive(Debug, Default)]
struct Tables {
    plants: Vec<Plant>,
    profiles: Vec<Profile>,
    offers: Vec<ExchangeOffer>,
    notifications: Vec<Notification>,
}

/// Row store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
}

impl MemoryBackend {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn username_taken(profiles: &[Profile], candidate: &Profile) -> bool {
    profiles
        .iter()
        .any(|p| p.id != candidate.id && p.username.eq_ignore_ascii_case(&candidate.username))
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn insert_plant(&self, plant: &Plant) -> Result<(), MarketError> {
        let mut tables = self.tables.write().await;
        if tables.plants.iter().any(|p| p.id == plant.id) {
            return Err(MarketError::Conflict(format!("plant {} exists", plant.id)));
        }
        tables.plants.push(plant.clone());
        Ok(())
    }

    async fn get_plant(&self, id: PlantId) -> Result<Option<Plant>, MarketError> {
        let tables = self.tables.read().await;
        Ok(tables.plants.iter().find(|p| p.id == id).cloned())
    }

    async fn list_plants(&self, query: &PlantQuery) -> Result<Vec<Plant>, MarketError> {
        let tables = self.tables.read().await;
        let mut plants: Vec<Plant> = tables
            .plants
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        match query.order {
            TimeOrder::NewestFirst => plants.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            TimeOrder::OldestFirst => plants.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        }
        Ok(plants)
    }

    async fn update_plant(&self, plant: &Plant) -> Result<bool, MarketError> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.plants.iter_mut().find(|p| p.id == plant.id) else {
            return Ok(false);
        };
        *row = plant.clone();
        Ok(true)
    }

    async fn set_plant_status(
        &self,
        id: PlantId,
        status: PlantStatus,
    ) -> Result<bool, MarketError> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.plants.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        row.status = status;
        Ok(true)
    }

    async fn delete_plant(&self, id: PlantId) -> Result<bool, MarketError> {
        let mut tables = self.tables.write().await;
        let before = tables.plants.len();
        tables.plants.retain(|p| p.id != id);
        Ok(tables.plants.len() != before)
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<(), MarketError> {
        let mut tables = self.tables.write().await;
        if tables.profiles.iter().any(|p| p.id == profile.id) {
            return Err(MarketError::Conflict("profile already exists".to_string()));
        }
        if username_taken(&tables.profiles, profile) {
            return Err(MarketError::Conflict(format!(
                "username {} is taken",
                profile.username
            )));
        }
        tables.profiles.push(profile.clone());
        Ok(())
    }

    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, MarketError> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn update_profile(&self, profile: &Profile) -> Result<bool, MarketError> {
        let mut tables = self.tables.write().await;
        if username_taken(&tables.profiles, profile) {
            return Err(MarketError::Conflict(format!(
                "username {} is taken",
                profile.username
            )));
        }
        let Some(row) = tables.profiles.iter_mut().find(|p| p.id == profile.id) else {
            return Ok(false);
        };
        *row = profile.clone();
        Ok(true)
    }

    async fn insert_offer(&self, offer: &ExchangeOffer) -> Result<(), MarketError> {
        let mut tables = self.tables.write().await;
        tables.offers.push(offer.clone());
        Ok(())
    }

    async fn get_offer(&self, id: OfferId) -> Result<Option<ExchangeOffer>, MarketError> {
        let tables = self.tables.read().await;
        Ok(tables.offers.iter().find(|o| o.id == id).cloned())
    }

    async fn list_offers_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<ExchangeOffer>, MarketError> {
        let tables = self.tables.read().await;
        let mut offers: Vec<ExchangeOffer> = tables
            .offers
            .iter()
            .filter(|o| o.sender_id == user || o.receiver_id == user)
            .cloned()
            .collect();
        offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(offers)
    }

    async fn transition_offer(
        &self,
        id: OfferId,
        expected: OfferStatus,
        next: OfferStatus,
        selected: Option<&[PlantId]>,
    ) -> Result<Option<ExchangeOffer>, MarketError> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables
            .offers
            .iter_mut()
            .find(|o| o.id == id && o.status == expected)
        else {
            return Ok(None);
        };
        row.status = next;
        if let Some(selected) = selected {
            row.selected_plant_ids = selected.to_vec();
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), MarketError> {
        let mut tables = self.tables.write().await;
        tables.notifications.push(notification.clone());
        Ok(())
    }

    async fn list_notifications(
        &self,
        user: UserId,
        unread_only: bool,
        limit: usize,
    ) -> Result<Vec<Notification>, MarketError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user && (!unread_only || !n.read))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn count_unread_notifications(&self, user: UserId) -> Result<u64, MarketError> {
        let tables = self.tables.read().await;
        let count = tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user && !n.read)
            .count();
        Ok(count as u64)
    }

    async fn mark_notification_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> Result<bool, MarketError> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user)
        else {
            return Ok(false);
        };
        row.read = true;
        Ok(true)
    }

    async fn mark_all_notifications_read(&self, user: UserId) -> Result<u64, MarketError> {
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for row in tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user && !n.read)
        {
            row.read = true;
            changed += 1;
        }
        Ok(changed)
    }
}
