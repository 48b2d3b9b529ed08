//! Homework Bot
//!
//! A long-running poller that watches one user's homework reviews and posts
//! every new verdict to a Telegram chat.
//!
//! Architecture:
//! - Configuration: credentials and tuning from the environment (and `.env`)
//! - Repositories: HTTP access to the homework status API
//! - Services: message delivery through the Telegram Bot API
//! - Scheduler: the polling loop with change detection
//!
//! Each poll fetches the status snapshot, validates it, turns every homework
//! entry into a message and sends only messages that differ from the last one
//! sent for the same homework. Failures are reported the same way, once per
//! distinct error text.

mod config;
mod repository;
mod scheduler;
mod service;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::repository::{HttpStatusRepository, StatusRepository};
use crate::scheduler::StatusPoller;
use crate::service::{Notifier, TelegramNotifier};
use homework_client::{StatusClient, TelegramClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before the filter reads RUST_LOG
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homework_bot=debug,homework_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("Failed to load .env file: {}", e);
        }
    }

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Fatal: {:#}. Bot stopped.", e);
            std::process::exit(1);
        }
    };

    info!(
        "Loaded configuration: endpoint={}, chat_id={}, retry_period={:?}",
        config.endpoint, config.telegram_chat_id, config.retry_period
    );

    let status_client = StatusClient::new(
        config.endpoint.clone(),
        config.practicum_token.clone(),
        config.request_timeout,
    )
    .context("Failed to build status API client")?;
    let repository: Arc<dyn StatusRepository> =
        Arc::new(HttpStatusRepository::new(status_client));

    let telegram_client = TelegramClient::new(
        config.telegram_api_url.clone(),
        config.telegram_token.clone(),
        config.request_timeout,
    )
    .context("Failed to build Telegram client")?;
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(
        telegram_client,
        config.telegram_chat_id.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            // Dropping the sender would stop the poller
            std::future::pending::<()>().await;
        }
        info!("Shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    let mut poller = StatusPoller::new(&config, repository, notifier);
    poller.run(shutdown_rx).await;

    Ok(())
}

/// Loads and validates configuration from the environment
fn load_config() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}
