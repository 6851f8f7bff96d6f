//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::Session;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// Rejected with 401 before the upgrade when no session accompanies the
/// request.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    let event_rx = state.event_bus.subscribe();
    let notifications = state.notifications.clone();
    tracing::debug!(user_id = %session.user_id(), "ws upgrade");

    ws.on_upgrade(move |socket| run_connection(socket, session, event_rx, notifications))
}
