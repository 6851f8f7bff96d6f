//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All resource endpoints are mounted under `/api/v1`. Callers identify
//! themselves with the `x-user-id` header, see [`session`].

pub mod dto;
pub mod handlers;
pub mod openapi;
pub mod session;

use std::path::Path;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::persistence::storage::PUBLIC_OBJECT_PREFIX;
use crate::ws::handler::ws_handler;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    router
}

/// Builds the servable application: REST routes, `/ws`, and the HTTP
/// layers, bound to `state`.
///
/// When `object_root` is set, uploaded objects under it are served at
/// [`PUBLIC_OBJECT_PREFIX`].
pub fn build_app(state: AppState, request_timeout: Duration, object_root: Option<&Path>) -> Router {
    let mut router = build_router().route("/ws", get(ws_handler));
    if let Some(root) = object_root {
        router = router.nest_service(PUBLIC_OBJECT_PREFIX, ServeDir::new(root));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                )),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::EventBus;
    use crate::persistence::{MemoryBackend, MemoryBlobStore};

    fn app() -> Router {
        let state = AppState::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(MemoryBlobStore::new("http://localhost:3000")),
            EventBus::new(16),
        );
        build_app(state, Duration::from_secs(5), None)
    }

    async fn call(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let Ok(response) = app().oneshot(request).await else {
            panic!("router is infallible");
        };
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn health_needs_no_session() {
        let Ok(request) = Request::get("/health").body(Body::empty()) else {
            panic!("static request");
        };
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn missing_session_is_structured_401() {
        let Ok(request) = Request::get("/api/v1/notifications").body(Body::empty()) else {
            panic!("static request");
        };
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"]["code"].is_number());
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let Ok(request) = Request::post("/api/v1/plants")
            .header(session::USER_ID_HEADER, uuid::Uuid::new_v4().to_string())
            .header("content-type", "application/json")
            .body(Body::from("{\"name\": 5}"))
        else {
            panic!("static request");
        };
        let (status, _) = call(request).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn cross_origin_requests_are_allowed() {
        let Ok(request) = Request::get("/health")
            .header("origin", "https://plants.example")
            .body(Body::empty())
        else {
            panic!("static request");
        };
        let Ok(response) = app().oneshot(request).await else {
            panic!("router is infallible");
        };
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .contains_key("access-control-allow-origin")
        );
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let Ok(request) = Request::get("/openapi.json").body(Body::empty()) else {
            panic!("static request");
        };
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/v1/exchanges"].is_object());
    }
}
