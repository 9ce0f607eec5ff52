use anyhow::Context;
use shelf_common::Database;

use crate::domain::SystemClock;
use crate::infrastructure::AppStateImpl;
use crate::infrastructure::http::{HttpServer, HttpServerConfig};
use crate::infrastructure::memory::MemoryStore;
use crate::infrastructure::persistence::PostgresStore;
use crate::infrastructure::settings::{Settings, StorageKind};

pub mod domain;
pub mod infrastructure;

/// Wires the configured stores into the HTTP server and serves until shutdown
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let analytics = settings.analytics.options()?;
    let server_config = HttpServerConfig {
        port: &settings.server_port,
    };

    match settings.storage {
        StorageKind::Memory => {
            tracing::warn!("using in-memory storage, data is lost on shutdown");
            let store = MemoryStore::new();
            let state = AppStateImpl::new(store.clone(), store, SystemClock, analytics);
            HttpServer::new(state, server_config).await?.run().await
        }
        StorageKind::Postgres => {
            let database_settings = settings
                .database
                .as_ref()
                .context("database settings are required for postgres storage")?;
            let database = Database::connect(database_settings).await?;
            tracing::info!("Connected to DB");

            let store = PostgresStore::new(database);
            let state = AppStateImpl::new(store.clone(), store, SystemClock, analytics);
            HttpServer::new(state, server_config).await?.run().await
        }
    }
}
