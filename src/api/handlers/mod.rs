//! REST endpoint handlers organized by resource.

pub mod exchanges;
pub mod notifications;
pub mod plants;
pub mod profiles;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(plants::routes())
        .merge(profiles::routes())
        .merge(exchanges::routes())
        .merge(notifications::routes())
}
