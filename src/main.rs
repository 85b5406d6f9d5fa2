//! attendee-sync server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use attendee_sync::api;
use attendee_sync::app_state::AppState;
use attendee_sync::client::BilletwebClient;
use attendee_sync::config::SyncConfig;
use attendee_sync::domain::{ConfigPatch, EventBus, ValueFormatter};
use attendee_sync::persistence::{Backend, MemoryStore, PostgresPersistence, Store};
use attendee_sync::service::{AttendeeService, SyncService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = SyncConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    tracing::info!(
        addr = %config.listen_addr,
        api = %config.api_base_url,
        persistence = config.persistence_enabled,
        "starting attendee-sync"
    );

    // Store
    let event_bus = EventBus::new(config.event_bus_capacity);
    let backend = if config.persistence_enabled {
        let pg = PostgresPersistence::connect(&config)
            .await
            .context("connecting to PostgreSQL")?;
        tracing::info!("using PostgreSQL backend");
        Backend::Postgres(pg)
    } else {
        tracing::info!("using in-memory backend");
        Backend::Memory(MemoryStore::new())
    };
    let store = Arc::new(Store::new(backend, event_bus.clone(), config.api_log_capacity));
    seed_token(&store, config.api_token.clone()).await?;

    // Services
    let client = BilletwebClient::new(&config.api_base_url, config.http_timeout())?;
    let sync_service = Arc::new(SyncService::new(
        client,
        Arc::clone(&store),
        config.max_flatten_depth,
    ));
    let attendee_service = Arc::new(AttendeeService::new(
        Arc::clone(&store),
        ValueFormatter::with_defaults(),
        config.max_flatten_depth,
    ));

    let app = api::build_app(AppState {
        sync_service,
        attendee_service,
        event_bus,
    });

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

/// `RUST_LOG` filter (default `info`); `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Stores the configured credential unless one is already stored.
async fn seed_token(store: &Store, token: Option<String>) -> anyhow::Result<()> {
    let Some(token) = token else {
        return Ok(());
    };
    let stored = store.settings().await?.api_token;
    if stored.is_none_or(|t| t.trim().is_empty()) {
        store.update_settings(ConfigPatch::api_token(token)).await?;
        tracing::info!("seeded API credential from BILLETWEB_API_TOKEN");
    }
    Ok(())
}
