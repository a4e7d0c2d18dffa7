mod cli;
mod telemetry;

use crate::cli::{StorageBackendArg, CLI};
use anyhow::Context as _;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use stubby_core::UrlMapper;
use stubby_gateway::{App, AppState};
use stubby_generator::{EntropySource, RandomAliasGenerator, RandomAliasSettings};
use stubby_shortener::{StoreSettings, UrlStoreService};
use stubby_storage::{InMemoryRepository, SqliteRepository};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    telemetry::init(config.env)?;

    info!(
        env = %config.env,
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        alias_length = config.alias_length,
        max_attempts = config.max_attempts,
        "starting stubby"
    );

    let generator = RandomAliasGenerator::new(
        RandomAliasSettings::builder()
            .length(config.alias_length)
            .build(),
    )
    .context("invalid alias generator settings")?;

    if generator.entropy_source() == EntropySource::Fallback {
        warn!("os entropy source unavailable, aliases come from a clock-seeded generator");
    }

    let settings = StoreSettings::builder()
        .max_attempts(config.max_attempts)
        .build();

    let mapper: Arc<dyn UrlMapper> = match config.storage {
        StorageBackendArg::InMemory => Arc::new(UrlStoreService::with_settings(
            InMemoryRepository::new(),
            generator,
            settings,
        )),
        StorageBackendArg::Sqlite => {
            let repository = SqliteRepository::connect(&config.database_url)
                .await
                .with_context(|| format!("failed to open {}", config.database_url))?;
            repository
                .migrate()
                .await
                .context("failed to create schema")?;
            Arc::new(UrlStoreService::with_settings(repository, generator, settings))
        }
    };

    let state = AppState::new(
        mapper,
        config.public_base_url,
        Duration::from_millis(config.request_timeout_ms),
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
