//! # plant-exchange
//!
//! REST API and WebSocket service for a peer-to-peer plant exchange.
//!
//! Users list plants, browse each other's listings, and propose exchanges.
//! The owner of the requested plant picks what they want in return from the
//! proposer's available plants; either party then confirms or cancels. Each
//! step notifies the other party through a persisted feed and a live
//! WebSocket push.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── Listing / Profile / Exchange / Notification services (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── Offer state machine, notification rules, listing filter (domain/)
//!     │
//!     └── Backend (memory | PostgreSQL) + BlobStore (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
