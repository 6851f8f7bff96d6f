//! WebSocket layer: connection handling and message routing.
//!
//! The WebSocket endpoint at `/ws` requires a session. It pushes every
//! [`crate::domain::MarketEvent`] addressed to the session user and accepts
//! a small set of commands.

pub mod connection;
pub mod handler;
pub mod messages;
