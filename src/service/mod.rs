//! Service layer: business logic orchestration.
//!
//! Each service takes an explicit [`crate::domain::Session`] for every
//! operation that needs an actor, enforces ownership, talks to the
//! [`crate::persistence::Backend`] and [`crate::persistence::BlobStore`],
//! and emits events through the [`crate::domain::EventBus`].

pub mod exchange_service;
pub mod listing_service;
pub mod notification_service;
pub mod profile_service;

pub use exchange_service::{ConfirmOutcome, ExchangeService, OfferDraft};
pub use listing_service::{BrowseQuery, ListingService};
pub use notification_service::NotificationService;
pub use profile_service::ProfileService;
