//! Shared harness: an in-memory server on an ephemeral port.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use plant_exchange::api::build_app;
use plant_exchange::app_state::AppState;
use plant_exchange::domain::EventBus;
use plant_exchange::persistence::{MemoryBackend, MemoryBlobStore};
use serde_json::{Value, json};
use uuid::Uuid;

/// Running server and its address.
pub struct TestServer {
    pub addr: std::net::SocketAddr,
    client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let state = AppState::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(MemoryBlobStore::new("http://localhost:3000")),
            EventBus::new(256),
        );
        let app = build_app(state, Duration::from_secs(5), None);
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("cannot bind test listener");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("listener has no address");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            addr,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// A fresh user acting against this server.
    pub fn user(&self) -> TestUser<'_> {
        TestUser {
            id: Uuid::new_v4(),
            server: self,
        }
    }

    pub fn anonymous(&self) -> &reqwest::Client {
        &self.client
    }
}

/// Requests carrying one user's `x-user-id` header.
pub struct TestUser<'a> {
    pub id: Uuid,
    server: &'a TestServer,
}

impl TestUser<'_> {
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.server
            .client
            .request(method, self.server.url(path))
            .header("x-user-id", self.id.to_string())
    }

    pub async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> (u16, Value) {
        let mut req = self.request(method, path);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let Ok(resp) = req.send().await else {
            panic!("request to {path} failed");
        };
        let status = resp.status().as_u16();
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        self.send(reqwest::Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        self.send(reqwest::Method::POST, path, Some(body)).await
    }

    /// Creates a profile and returns nothing; panics unless 201.
    pub async fn sign_up(&self, username: &str) {
        let (status, _) = self.post("/api/v1/profiles", json!({ "username": username })).await;
        assert_eq!(status, 201, "profile for {username}");
    }

    /// Lists a plant and returns its id.
    pub async fn list_plant(&self, name: &str, location: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/plants",
                json!({
                    "name": name,
                    "species": "Monstera deliciosa",
                    "location": location,
                    "plant_type": "tropical",
                }),
            )
            .await;
        assert_eq!(status, 201, "listing {name}");
        body["id"].as_str().unwrap_or_default().to_string()
    }
}
