//! Domain layer: typed records, the exchange state machine, notification
//! rules, the listing filter, and the event system.
//!
//! Nothing in here performs I/O. Services in [`crate::service`] load
//! records through [`crate::persistence`], run them through these types,
//! and write the results back.

pub mod event_bus;
pub mod ids;
pub mod listing_filter;
pub mod market_event;
pub mod notification;
pub mod offer;
pub mod plant;
pub mod profile;
pub mod session;

pub use event_bus::EventBus;
pub use ids::{NotificationId, OfferId, PlantId, UserId};
pub use listing_filter::ListingFilter;
pub use market_event::MarketEvent;
pub use notification::{Notification, NotificationKind, NotificationRule, Recipient};
pub use offer::{ExchangeOffer, OfferAction, OfferStatus, OfferStatusFilter};
pub use plant::{NewPlant, Plant, PlantPatch, PlantStatus};
pub use profile::{NewProfile, Profile, ProfilePatch};
pub use session::Session;
