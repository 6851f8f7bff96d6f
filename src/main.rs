//! plant-exchange server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use plant_exchange::api;
use plant_exchange::app_state::AppState;
use plant_exchange::config::{BackendKind, LogFormat, MarketConfig};
use plant_exchange::domain::EventBus;
use plant_exchange::persistence::{
    Backend, BlobStore, Bucket, LocalBlobStore, MemoryBackend, PostgresBackend,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = MarketConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);
    tracing::info!(
        addr = %config.listen_addr,
        backend = ?config.backend,
        "starting plant-exchange"
    );

    let backend = connect_backend(&config).await?;

    let blobs = LocalBlobStore::new(&config.storage_root, &config.public_base_url)
        .await
        .with_context(|| format!("cannot open storage root {}", config.storage_root.display()))?;
    for bucket in [Bucket::Plants, Bucket::Avatars] {
        blobs.ensure_bucket(bucket).await?;
    }
    let blobs: Arc<dyn BlobStore> = Arc::new(blobs);

    let event_bus = EventBus::new(config.event_bus_capacity);
    let state = AppState::new(backend, blobs, event_bus);
    let app = api::build_app(
        state,
        config.request_timeout(),
        Some(config.storage_root.as_path()),
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn connect_backend(config: &MarketConfig) -> anyhow::Result<Arc<dyn Backend>> {
    match config.backend {
        BackendKind::Memory => {
            tracing::warn!("using the in-memory backend; data is lost on restart");
            Ok(Arc::new(MemoryBackend::new()))
        }
        BackendKind::Postgres => {
            let pg = PostgresBackend::connect(
                &config.database_url,
                config.database_min_connections,
                config.database_max_connections,
                config.database_connect_timeout(),
            )
            .await
            .context("cannot connect to PostgreSQL")?;
            if config.run_migrations {
                pg.migrate().await.context("migrations failed")?;
            }
            Ok(Arc::new(pg))
        }
    }
}
