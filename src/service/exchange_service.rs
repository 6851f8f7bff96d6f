//! Exchange service: drives offers through their negotiation states.
//!
//! Every mutating call follows the same sequence: load the offer, check the
//! actor and the transition, validate plants, compare-and-set the status,
//! apply plant side effects, then dispatch notifications and publish an
//! [`MarketEvent::OfferUpdated`].

use std::sync::Arc;

use crate::domain::notification::notifications_for;
use crate::domain::{
    EventBus, ExchangeOffer, MarketEvent, OfferAction, OfferId, OfferStatus, OfferStatusFilter,
    Plant, PlantId, PlantStatus, Session, UserId,
};
use crate::error::MarketError;
use crate::persistence::{Backend, PlantQuery, TimeOrder};

use super::NotificationService;

/// What the sender puts on the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferDraft {
    /// The plant the sender wants.
    pub receiver_plant_id: PlantId,
    /// The plant offered; the sender's oldest available plant when absent.
    pub sender_plant_id: Option<PlantId>,
}

/// Result of confirming an offer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmOutcome {
    /// The offer, now `completed`.
    pub offer: ExchangeOffer,
    /// Traded plants whose status could not be set to `exchanged`.
    pub failed_plant_ids: Vec<PlantId>,
}

/// Orchestration layer for exchange offers.
#[derive(Debug, Clone)]
pub struct ExchangeService {
    backend: Arc<dyn Backend>,
    notifications: NotificationService,
    event_bus: EventBus,
}

impl ExchangeService {
    /// Creates a new `ExchangeService`.
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        notifications: NotificationService,
        event_bus: EventBus,
    ) -> Self {
        Self {
            backend,
            notifications,
            event_bus,
        }
    }

    /// Opens a `pending` offer from the caller towards another user's plant.
    ///
    /// # Errors
    ///
    /// - [`MarketError::PlantNotFound`] if either plant is missing.
    /// - [`MarketError::InvalidRequest`] if the target is the caller's own.
    /// - [`MarketError::PlantUnavailable`] if a named plant is not available.
    /// - [`MarketError::Forbidden`] if the offered plant is not the caller's.
    /// - [`MarketError::NoAvailablePlants`] if the caller has nothing to offer.
    pub async fn create(
        &self,
        session: &Session,
        draft: OfferDraft,
    ) -> Result<ExchangeOffer, MarketError> {
        let target = self.plant(draft.receiver_plant_id).await?;
        if session.is(target.owner_id) {
            return Err(MarketError::InvalidRequest(
                "you cannot request your own plant".to_string(),
            ));
        }
        ensure_available(&target)?;

        let offered = match draft.sender_plant_id {
            Some(id) => {
                let plant = self.plant(id).await?;
                if !session.is(plant.owner_id) {
                    return Err(MarketError::Forbidden(
                        "you can only offer your own plants".to_string(),
                    ));
                }
                ensure_available(&plant)?;
                plant
            }
            None => self
                .available_plants_of(session.user_id())
                .await?
                .into_iter()
                .next()
                .ok_or(MarketError::NoAvailablePlants)?,
        };

        let offer = ExchangeOffer::new(session.user_id(), target.owner_id, offered.id, target.id);
        self.backend.insert_offer(&offer).await?;
        tracing::info!(
            offer_id = %offer.id,
            sender_id = %offer.sender_id,
            receiver_id = %offer.receiver_id,
            "exchange offer created"
        );
        self.announce(&offer, None, session).await;
        Ok(offer)
    }

    /// Offers the caller takes part in, newest first, narrowed by `filter`.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn list_for(
        &self,
        session: &Session,
        filter: OfferStatusFilter,
    ) -> Result<Vec<ExchangeOffer>, MarketError> {
        let mut offers = self.backend.list_offers_for_user(session.user_id()).await?;
        offers.retain(|o| filter.matches(o.status));
        Ok(offers)
    }

    /// Fetches one offer the caller takes part in.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::OfferNotFound`] or, for strangers,
    /// [`MarketError::Forbidden`].
    pub async fn get(&self, session: &Session, id: OfferId) -> Result<ExchangeOffer, MarketError> {
        let offer = self
            .backend
            .get_offer(id)
            .await?
            .ok_or(MarketError::OfferNotFound(id.into()))?;
        if !offer.involves(session.user_id()) {
            return Err(MarketError::Forbidden(
                "only the sender or receiver may view this offer".to_string(),
            ));
        }
        Ok(offer)
    }

    /// The sender's currently available plants, oldest first: what the
    /// receiver may pick from.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get`].
    pub async fn candidates(
        &self,
        session: &Session,
        id: OfferId,
    ) -> Result<Vec<Plant>, MarketError> {
        let offer = self.get(session, id).await?;
        self.available_plants_of(offer.sender_id).await
    }

    /// Receiver picks plants from the sender's collection.
    ///
    /// Duplicate ids collapse to their first occurrence. Every id must be a
    /// currently available plant of the sender, otherwise nothing changes.
    ///
    /// # Errors
    ///
    /// - [`MarketError::EmptySelection`] if no ids are given.
    /// - [`MarketError::Forbidden`] unless the caller is the receiver.
    /// - [`MarketError::InvalidTransition`] unless the offer is `pending`.
    /// - [`MarketError::PlantNotFound`], [`MarketError::InvalidRequest`] or
    ///   [`MarketError::PlantUnavailable`] for a bad pick, or when either
    ///   anchor plant has left `available` since the offer was made.
    pub async fn select(
        &self,
        session: &Session,
        id: OfferId,
        plant_ids: &[PlantId],
    ) -> Result<ExchangeOffer, MarketError> {
        let offer = self.get(session, id).await?;
        let next = offer.authorize(session, OfferAction::Select)?;

        let mut picked: Vec<PlantId> = Vec::with_capacity(plant_ids.len());
        for &plant_id in plant_ids {
            if !picked.contains(&plant_id) {
                picked.push(plant_id);
            }
        }
        if picked.is_empty() {
            return Err(MarketError::EmptySelection);
        }

        let found = self
            .backend
            .list_plants(&PlantQuery::default().with_ids(picked.clone()))
            .await?;
        for plant_id in &picked {
            let Some(plant) = found.iter().find(|p| p.id == *plant_id) else {
                return Err(MarketError::PlantNotFound((*plant_id).into()));
            };
            if plant.owner_id != offer.sender_id {
                return Err(MarketError::InvalidRequest(format!(
                    "plant {plant_id} does not belong to the sender"
                )));
            }
            ensure_available(plant)?;
        }
        self.ensure_tradable(&[offer.sender_plant_id, offer.receiver_plant_id])
            .await?;

        let updated = self
            .transition(&offer, next, OfferAction::Select, Some(&picked))
            .await?;
        tracing::info!(offer_id = %id, selected = picked.len(), "plants selected");
        self.announce(&updated, Some(offer.status), session).await;
        Ok(updated)
    }

    /// Completes the exchange and marks every traded plant `exchanged`.
    ///
    /// Plant updates are best effort: a failure is logged and reported in
    /// [`ConfirmOutcome::failed_plant_ids`] without undoing the others or
    /// the completion.
    ///
    /// # Errors
    ///
    /// [`MarketError::Forbidden`] for strangers,
    /// [`MarketError::InvalidTransition`] unless the offer is
    /// `awaiting_confirmation`, and [`MarketError::PlantUnavailable`] or
    /// [`MarketError::PlantNotFound`] if a traded plant is gone or already
    /// promised elsewhere. The offer is left untouched in that case.
    pub async fn confirm(
        &self,
        session: &Session,
        id: OfferId,
    ) -> Result<ConfirmOutcome, MarketError> {
        let offer = self.get(session, id).await?;
        let next = offer.authorize(session, OfferAction::Confirm)?;
        self.ensure_tradable(&offer.traded_plant_ids()).await?;
        let updated = self
            .transition(&offer, next, OfferAction::Confirm, None)
            .await?;

        let mut failed_plant_ids = Vec::new();
        for plant_id in updated.traded_plant_ids() {
            match self
                .backend
                .set_plant_status(plant_id, PlantStatus::Exchanged)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(offer_id = %id, %plant_id, "traded plant no longer exists");
                    failed_plant_ids.push(plant_id);
                }
                Err(err) => {
                    tracing::error!(
                        offer_id = %id,
                        %plant_id,
                        error = %err,
                        "failed to mark plant exchanged"
                    );
                    failed_plant_ids.push(plant_id);
                }
            }
        }

        tracing::info!(offer_id = %id, failed = failed_plant_ids.len(), "exchange completed");
        self.announce(&updated, Some(offer.status), session).await;
        Ok(ConfirmOutcome {
            offer: updated,
            failed_plant_ids,
        })
    }

    /// Withdraws a `pending` or `awaiting_confirmation` offer. Plants are
    /// untouched.
    ///
    /// # Errors
    ///
    /// [`MarketError::Forbidden`] for strangers and
    /// [`MarketError::InvalidTransition`] from a terminal status.
    pub async fn cancel(
        &self,
        session: &Session,
        id: OfferId,
    ) -> Result<ExchangeOffer, MarketError> {
        let offer = self.get(session, id).await?;
        let next = offer.authorize(session, OfferAction::Cancel)?;
        let updated = self.transition(&offer, next, OfferAction::Cancel, None).await?;
        tracing::info!(offer_id = %id, by = %session.user_id(), "exchange cancelled");
        self.announce(&updated, Some(offer.status), session).await;
        Ok(updated)
    }

    async fn plant(&self, id: PlantId) -> Result<Plant, MarketError> {
        self.backend
            .get_plant(id)
            .await?
            .ok_or(MarketError::PlantNotFound(id.into()))
    }

    /// Every plant in `ids` still exists and is `available`.
    async fn ensure_tradable(&self, ids: &[PlantId]) -> Result<(), MarketError> {
        let found = self
            .backend
            .list_plants(&PlantQuery::default().with_ids(ids.to_vec()))
            .await?;
        for id in ids {
            let Some(plant) = found.iter().find(|p| p.id == *id) else {
                return Err(MarketError::PlantNotFound((*id).into()));
            };
            ensure_available(plant)?;
        }
        Ok(())
    }

    async fn available_plants_of(&self, owner: UserId) -> Result<Vec<Plant>, MarketError> {
        self.backend
            .list_plants(
                &PlantQuery::owned_by(owner)
                    .with_status(PlantStatus::Available)
                    .ordered(TimeOrder::OldestFirst),
            )
            .await
    }

    /// Compare-and-set from the status `offer` was loaded with. A lost race
    /// reports the status that won.
    async fn transition(
        &self,
        offer: &ExchangeOffer,
        next: OfferStatus,
        action: OfferAction,
        selected: Option<&[PlantId]>,
    ) -> Result<ExchangeOffer, MarketError> {
        if let Some(updated) = self
            .backend
            .transition_offer(offer.id, offer.status, next, selected)
            .await?
        {
            return Ok(updated);
        }
        let current = self
            .backend
            .get_offer(offer.id)
            .await?
            .ok_or(MarketError::OfferNotFound(offer.id.into()))?;
        tracing::debug!(offer_id = %offer.id, status = %current.status, "offer moved concurrently");
        Err(MarketError::InvalidTransition {
            from: current.status,
            action,
        })
    }

    async fn announce(&self, offer: &ExchangeOffer, from: Option<OfferStatus>, session: &Session) {
        let notes = notifications_for(offer, from, session.user_id());
        self.notifications.dispatch(notes).await;
        let _ = self.event_bus.publish(MarketEvent::offer_updated(offer, from));
    }
}

fn ensure_available(plant: &Plant) -> Result<(), MarketError> {
    if plant.is_available() {
        Ok(())
    } else {
        Err(MarketError::PlantUnavailable {
            plant_id: plant.id.into(),
            status: plant.status,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::domain::{NewPlant, Notification, NotificationId, NotificationKind, Profile};
    use crate::persistence::MemoryBackend;

    struct Market {
        exchanges: ExchangeService,
        backend: Arc<dyn Backend>,
        bus: EventBus,
    }

    fn market_over(backend: Arc<dyn Backend>) -> Market {
        let bus = EventBus::new(64);
        let notifications = NotificationService::new(Arc::clone(&backend), bus.clone());
        Market {
            exchanges: ExchangeService::new(Arc::clone(&backend), notifications, bus.clone()),
            backend,
            bus,
        }
    }

    fn market() -> Market {
        market_over(Arc::new(MemoryBackend::new()))
    }

    async fn list(backend: &Arc<dyn Backend>, owner: UserId, name: &str) -> Plant {
        let Ok(plant) = Plant::new(
            owner,
            NewPlant {
                name: name.to_string(),
                species: "Sansevieria trifasciata".to_string(),
                location: "Madrid".to_string(),
                plant_type: "succulent".to_string(),
                ..NewPlant::default()
            },
        ) else {
            panic!("fixture plant rejected");
        };
        tokio_test::assert_ok!(backend.insert_plant(&plant).await);
        plant
    }

    async fn status_of(backend: &Arc<dyn Backend>, id: PlantId) -> Option<PlantStatus> {
        backend.get_plant(id).await.ok().flatten().map(|p| p.status)
    }

    async fn kinds_for(backend: &Arc<dyn Backend>, user: UserId) -> Vec<NotificationKind> {
        backend
            .list_notifications(user, false, 50)
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|n| n.kind)
            .collect()
    }

    fn draft(target: &Plant) -> OfferDraft {
        OfferDraft {
            receiver_plant_id: target.id,
            sender_plant_id: None,
        }
    }

    #[tokio::test]
    async fn full_exchange_flow() {
        let m = market();
        let (a, b) = (Session::new(UserId::new()), Session::new(UserId::new()));
        let p1 = list(&m.backend, a.user_id(), "p1").await;
        let p2 = list(&m.backend, b.user_id(), "p2").await;

        let Ok(offer) = m.exchanges.create(&a, draft(&p2)).await else {
            panic!("create failed");
        };
        assert_eq!(offer.status, OfferStatus::Pending);
        assert_eq!(offer.sender_plant_id, p1.id);
        assert!(offer.selected_plant_ids.is_empty());
        assert_eq!(
            kinds_for(&m.backend, b.user_id()).await,
            vec![NotificationKind::ExchangeRequest]
        );

        let Ok(selected) = m.exchanges.select(&b, offer.id, &[p1.id]).await else {
            panic!("select failed");
        };
        assert_eq!(selected.status, OfferStatus::AwaitingConfirmation);
        assert_eq!(selected.selected_plant_ids, vec![p1.id]);
        assert_eq!(
            kinds_for(&m.backend, a.user_id()).await,
            vec![NotificationKind::ExchangeSelection]
        );

        let Ok(outcome) = m.exchanges.confirm(&a, offer.id).await else {
            panic!("confirm failed");
        };
        assert_eq!(outcome.offer.status, OfferStatus::Completed);
        assert!(outcome.failed_plant_ids.is_empty());
        assert_eq!(status_of(&m.backend, p1.id).await, Some(PlantStatus::Exchanged));
        assert_eq!(status_of(&m.backend, p2.id).await, Some(PlantStatus::Exchanged));

        for user in [a.user_id(), b.user_id()] {
            assert!(
                kinds_for(&m.backend, user)
                    .await
                    .contains(&NotificationKind::ExchangeCompleted)
            );
        }
    }

    #[tokio::test]
    async fn create_requires_an_available_sender_plant() {
        let m = market();
        let (a, b) = (Session::new(UserId::new()), Session::new(UserId::new()));
        let target = list(&m.backend, b.user_id(), "target").await;

        assert!(matches!(
            m.exchanges.create(&a, draft(&target)).await,
            Err(MarketError::NoAvailablePlants)
        ));

        let held = list(&m.backend, a.user_id(), "held").await;
        tokio_test::assert_ok!(m.backend.set_plant_status(held.id, PlantStatus::Pending).await);
        assert!(matches!(
            m.exchanges.create(&a, draft(&target)).await,
            Err(MarketError::NoAvailablePlants)
        ));
        assert!(matches!(
            m.exchanges
                .create(
                    &a,
                    OfferDraft {
                        receiver_plant_id: target.id,
                        sender_plant_id: Some(held.id),
                    }
                )
                .await,
            Err(MarketError::PlantUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn create_rejects_own_or_foreign_plants() {
        let m = market();
        let (a, b) = (Session::new(UserId::new()), Session::new(UserId::new()));
        let mine = list(&m.backend, a.user_id(), "mine").await;
        let theirs = list(&m.backend, b.user_id(), "theirs").await;
        let other = list(&m.backend, UserId::new(), "other").await;

        assert!(matches!(
            m.exchanges.create(&a, draft(&mine)).await,
            Err(MarketError::InvalidRequest(_))
        ));
        assert!(matches!(
            m.exchanges
                .create(
                    &a,
                    OfferDraft {
                        receiver_plant_id: theirs.id,
                        sender_plant_id: Some(other.id),
                    }
                )
                .await,
            Err(MarketError::Forbidden(_))
        ));
        assert!(matches!(
            m.exchanges
                .create(
                    &a,
                    OfferDraft {
                        receiver_plant_id: PlantId::new(),
                        sender_plant_id: None,
                    }
                )
                .await,
            Err(MarketError::PlantNotFound(_))
        ));
    }

    #[tokio::test]
    async fn empty_selection_changes_nothing() {
        let m = market();
        let (a, b) = (Session::new(UserId::new()), Session::new(UserId::new()));
        list(&m.backend, a.user_id(), "p1").await;
        let p2 = list(&m.backend, b.user_id(), "p2").await;
        let Ok(offer) = m.exchanges.create(&a, draft(&p2)).await else {
            panic!("create failed");
        };

        assert!(matches!(
            m.exchanges.select(&b, offer.id, &[]).await,
            Err(MarketError::EmptySelection)
        ));
        let stored = m.exchanges.get(&b, offer.id).await.map(|o| o.status).ok();
        assert_eq!(stored, Some(OfferStatus::Pending));
    }

    #[tokio::test]
    async fn selection_must_be_available_sender_plants() {
        let m = market();
        let (a, b) = (Session::new(UserId::new()), Session::new(UserId::new()));
        let p1 = list(&m.backend, a.user_id(), "p1").await;
        let p3 = list(&m.backend, a.user_id(), "p3").await;
        let p2 = list(&m.backend, b.user_id(), "p2").await;
        let Ok(offer) = m.exchanges.create(&a, draft(&p2)).await else {
            panic!("create failed");
        };

        assert!(matches!(
            m.exchanges.select(&a, offer.id, &[p1.id]).await,
            Err(MarketError::Forbidden(_))
        ));
        assert!(matches!(
            m.exchanges.select(&b, offer.id, &[p1.id, p2.id]).await,
            Err(MarketError::InvalidRequest(_))
        ));

        tokio_test::assert_ok!(m.backend.set_plant_status(p3.id, PlantStatus::Pending).await);
        assert!(matches!(
            m.exchanges.select(&b, offer.id, &[p1.id, p3.id]).await,
            Err(MarketError::PlantUnavailable { .. })
        ));

        let Ok(picked) = m.exchanges.select(&b, offer.id, &[p1.id, p1.id]).await else {
            panic!("select failed");
        };
        assert_eq!(picked.selected_plant_ids, vec![p1.id]);
    }

    #[tokio::test]
    async fn terminal_offers_never_move() {
        let m = market();
        let (a, b) = (Session::new(UserId::new()), Session::new(UserId::new()));
        list(&m.backend, a.user_id(), "p1").await;
        let p2 = list(&m.backend, b.user_id(), "p2").await;
        let Ok(offer) = m.exchanges.create(&a, draft(&p2)).await else {
            panic!("create failed");
        };

        let Ok(cancelled) = m.exchanges.cancel(&b, offer.id).await else {
            panic!("cancel failed");
        };
        assert_eq!(cancelled.status, OfferStatus::Cancelled);
        assert_eq!(
            kinds_for(&m.backend, a.user_id()).await,
            vec![NotificationKind::ExchangeCancelled]
        );

        for result in [
            m.exchanges.cancel(&a, offer.id).await.map(|o| o.status),
            m.exchanges.confirm(&a, offer.id).await.map(|o| o.offer.status),
            m.exchanges.select(&b, offer.id, &[p2.id]).await.map(|o| o.status),
        ] {
            assert!(matches!(
                result,
                Err(MarketError::InvalidTransition {
                    from: OfferStatus::Cancelled,
                    ..
                })
            ));
        }
        assert_eq!(status_of(&m.backend, p2.id).await, Some(PlantStatus::Available));
    }

    #[tokio::test]
    async fn strangers_cannot_see_or_act() {
        let m = market();
        let (a, b) = (Session::new(UserId::new()), Session::new(UserId::new()));
        let stranger = Session::new(UserId::new());
        list(&m.backend, a.user_id(), "p1").await;
        let p2 = list(&m.backend, b.user_id(), "p2").await;
        let Ok(offer) = m.exchanges.create(&a, draft(&p2)).await else {
            panic!("create failed");
        };

        assert!(matches!(
            m.exchanges.get(&stranger, offer.id).await,
            Err(MarketError::Forbidden(_))
        ));
        assert!(matches!(
            m.exchanges.cancel(&stranger, offer.id).await,
            Err(MarketError::Forbidden(_))
        ));
        assert_eq!(
            m.exchanges
                .list_for(&stranger, OfferStatusFilter::All)
                .await
                .map(|v| v.len())
                .ok(),
            Some(0)
        );
    }

    #[tokio::test]
    async fn list_filter_and_candidates() {
        let m = market();
        let (a, b) = (Session::new(UserId::new()), Session::new(UserId::new()));
        let p1 = list(&m.backend, a.user_id(), "p1").await;
        let p3 = list(&m.backend, a.user_id(), "p3").await;
        let p2 = list(&m.backend, b.user_id(), "p2").await;
        let p4 = list(&m.backend, b.user_id(), "p4").await;
        let Ok(first) = m.exchanges.create(&a, draft(&p2)).await else {
            panic!("create failed");
        };
        tokio_test::assert_ok!(m.exchanges.create(&a, draft(&p4)).await);
        tokio_test::assert_ok!(m.exchanges.cancel(&a, first.id).await);

        let pending = m.exchanges.list_for(&b, OfferStatusFilter::Pending).await;
        assert_eq!(pending.map(|v| v.len()).ok(), Some(1));
        let all = m.exchanges.list_for(&b, OfferStatusFilter::All).await;
        assert_eq!(all.map(|v| v.len()).ok(), Some(2));

        let Ok(candidates) = m.exchanges.candidates(&b, first.id).await else {
            panic!("candidates failed");
        };
        assert_eq!(
            candidates.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![p1.id, p3.id]
        );
    }

    #[tokio::test]
    async fn transitions_publish_offer_events() {
        let m = market();
        let mut rx = m.bus.subscribe();
        let (a, b) = (Session::new(UserId::new()), Session::new(UserId::new()));
        list(&m.backend, a.user_id(), "p1").await;
        let p2 = list(&m.backend, b.user_id(), "p2").await;
        tokio_test::assert_ok!(m.exchanges.create(&a, draft(&p2)).await);

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event.event_type_str());
        }
        assert_eq!(seen, vec!["notification_created", "offer_updated"]);
    }

    /// Delegates to a [`MemoryBackend`] but fails status writes for one
    /// plant.
    #[derive(Debug)]
    struct FlakyPlantBackend {
        inner: MemoryBackend,
        broken: std::sync::Mutex<Option<PlantId>>,
    }

    impl FlakyPlantBackend {
        fn broken_id(&self) -> Option<PlantId> {
            self.broken.lock().ok().and_then(|guard| *guard)
        }
    }

    #[async_trait]
    impl Backend for FlakyPlantBackend {
        async fn insert_plant(&self, plant: &Plant) -> Result<(), MarketError> {
            self.inner.insert_plant(plant).await
        }
        async fn get_plant(&self, id: PlantId) -> Result<Option<Plant>, MarketError> {
            self.inner.get_plant(id).await
        }
        async fn list_plants(&self, query: &PlantQuery) -> Result<Vec<Plant>, MarketError> {
            self.inner.list_plants(query).await
        }
        async fn update_plant(&self, plant: &Plant) -> Result<bool, MarketError> {
            self.inner.update_plant(plant).await
        }
        async fn set_plant_status(
            &self,
            id: PlantId,
            status: PlantStatus,
        ) -> Result<bool, MarketError> {
            if self.broken_id() == Some(id) {
                return Err(MarketError::PersistenceError("disk full".to_string()));
            }
            self.inner.set_plant_status(id, status).await
        }
        async fn delete_plant(&self, id: PlantId) -> Result<bool, MarketError> {
            self.inner.delete_plant(id).await
        }
        async fn insert_profile(&self, profile: &Profile) -> Result<(), MarketError> {
            self.inner.insert_profile(profile).await
        }
        async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, MarketError> {
            self.inner.get_profile(id).await
        }
        async fn update_profile(&self, profile: &Profile) -> Result<bool, MarketError> {
            self.inner.update_profile(profile).await
        }
        async fn insert_offer(&self, offer: &ExchangeOffer) -> Result<(), MarketError> {
            self.inner.insert_offer(offer).await
        }
        async fn get_offer(&self, id: OfferId) -> Result<Option<ExchangeOffer>, MarketError> {
            self.inner.get_offer(id).await
        }
        async fn list_offers_for_user(
            &self,
            user: UserId,
        ) -> Result<Vec<ExchangeOffer>, MarketError> {
            self.inner.list_offers_for_user(user).await
        }
        async fn transition_offer(
            &self,
            id: OfferId,
            expected: OfferStatus,
            next: OfferStatus,
            selected: Option<&[PlantId]>,
        ) -> Result<Option<ExchangeOffer>, MarketError> {
            self.inner.transition_offer(id, expected, next, selected).await
        }
        async fn insert_notification(
            &self,
            notification: &Notification,
        ) -> Result<(), MarketError> {
            self.inner.insert_notification(notification).await
        }
        async fn list_notifications(
            &self,
            user: UserId,
            unread_only: bool,
            limit: usize,
        ) -> Result<Vec<Notification>, MarketError> {
            self.inner.list_notifications(user, unread_only, limit).await
        }
        async fn count_unread_notifications(&self, user: UserId) -> Result<u64, MarketError> {
            self.inner.count_unread_notifications(user).await
        }
        async fn mark_notification_read(
            &self,
            id: NotificationId,
            user: UserId,
        ) -> Result<bool, MarketError> {
            self.inner.mark_notification_read(id, user).await
        }
        async fn mark_all_notifications_read(&self, user: UserId) -> Result<u64, MarketError> {
            self.inner.mark_all_notifications_read(user).await
        }
    }

    #[tokio::test]
    async fn confirm_reports_failed_plants_without_rollback() {
        let flaky = Arc::new(FlakyPlantBackend {
            inner: MemoryBackend::new(),
            broken: std::sync::Mutex::new(None),
        });
        let m = market_over(Arc::clone(&flaky) as Arc<dyn Backend>);
        let (a, b) = (Session::new(UserId::new()), Session::new(UserId::new()));
        let p1 = list(&m.backend, a.user_id(), "p1").await;
        let p3 = list(&m.backend, a.user_id(), "p3").await;
        let p2 = list(&m.backend, b.user_id(), "p2").await;

        let Ok(offer) = m.exchanges.create(&a, draft(&p2)).await else {
            panic!("create failed");
        };
        tokio_test::assert_ok!(m.exchanges.select(&b, offer.id, &[p1.id, p3.id]).await);
        if let Ok(mut guard) = flaky.broken.lock() {
            *guard = Some(p3.id);
        }

        let Ok(outcome) = m.exchanges.confirm(&b, offer.id).await else {
            panic!("confirm should succeed despite the failing plant");
        };
        assert_eq!(outcome.offer.status, OfferStatus::Completed);
        assert_eq!(outcome.failed_plant_ids, vec![p3.id]);
        assert_eq!(status_of(&m.backend, p1.id).await, Some(PlantStatus::Exchanged));
        assert_eq!(status_of(&m.backend, p2.id).await, Some(PlantStatus::Exchanged));
        assert_eq!(status_of(&m.backend, p3.id).await, Some(PlantStatus::Available));
    }

    #[tokio::test]
    async fn a_plant_is_traded_at_most_once() {
        let m = market();
        let (a, b, c) = (
            Session::new(UserId::new()),
            Session::new(UserId::new()),
            Session::new(UserId::new()),
        );
        let a1 = list(&m.backend, a.user_id(), "a1").await;
        let c1 = list(&m.backend, c.user_id(), "c1").await;
        let p2 = list(&m.backend, b.user_id(), "p2").await;

        let Ok(from_a) = m.exchanges.create(&a, draft(&p2)).await else {
            panic!("create failed");
        };
        let Ok(from_c) = m.exchanges.create(&c, draft(&p2)).await else {
            panic!("create failed");
        };
        tokio_test::assert_ok!(m.exchanges.select(&b, from_a.id, &[a1.id]).await);
        tokio_test::assert_ok!(m.exchanges.select(&b, from_c.id, &[c1.id]).await);

        tokio_test::assert_ok!(m.exchanges.confirm(&b, from_a.id).await);
        assert!(matches!(
            m.exchanges.confirm(&b, from_c.id).await,
            Err(MarketError::PlantUnavailable { .. })
        ));
        let second = m.exchanges.get(&c, from_c.id).await.map(|o| o.status).ok();
        assert_eq!(second, Some(OfferStatus::AwaitingConfirmation));
        assert_eq!(status_of(&m.backend, c1.id).await, Some(PlantStatus::Available));
        assert_eq!(status_of(&m.backend, a1.id).await, Some(PlantStatus::Exchanged));
    }

    #[tokio::test]
    async fn selection_fails_once_the_requested_plant_is_gone() {
        let m = market();
        let (a, b, c) = (
            Session::new(UserId::new()),
            Session::new(UserId::new()),
            Session::new(UserId::new()),
        );
        let a1 = list(&m.backend, a.user_id(), "a1").await;
        let c1 = list(&m.backend, c.user_id(), "c1").await;
        let p2 = list(&m.backend, b.user_id(), "p2").await;
        let Ok(from_a) = m.exchanges.create(&a, draft(&p2)).await else {
            panic!("create failed");
        };
        let Ok(from_c) = m.exchanges.create(&c, draft(&p2)).await else {
            panic!("create failed");
        };
        tokio_test::assert_ok!(m.exchanges.select(&b, from_a.id, &[a1.id]).await);
        tokio_test::assert_ok!(m.exchanges.confirm(&a, from_a.id).await);

        assert!(matches!(
            m.exchanges.select(&b, from_c.id, &[c1.id]).await,
            Err(MarketError::PlantUnavailable { .. })
        ));
        let still = m.exchanges.get(&c, from_c.id).await.map(|o| o.status).ok();
        assert_eq!(still, Some(OfferStatus::Pending));
    }

    #[tokio::test]
    async fn stale_transition_is_rejected() {
        let m = market();
        let (a, b) = (Session::new(UserId::new()), Session::new(UserId::new()));
        list(&m.backend, a.user_id(), "p1").await;
        let p2 = list(&m.backend, b.user_id(), "p2").await;
        let Ok(offer) = m.exchanges.create(&a, draft(&p2)).await else {
            panic!("create failed");
        };
        tokio_test::assert_ok!(
            m.backend
                .transition_offer(offer.id, OfferStatus::Pending, OfferStatus::Cancelled, None)
                .await
        );

        let result = m
            .exchanges
            .transition(&offer, OfferStatus::Cancelled, OfferAction::Cancel, None)
            .await;
        assert!(matches!(
            result,
            Err(MarketError::InvalidTransition {
                from: OfferStatus::Cancelled,
                action: OfferAction::Cancel,
            })
        ));
    }
}
