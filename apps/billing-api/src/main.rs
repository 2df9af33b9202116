//! # Billing API
//!
//! Runs the billing backend: opens the store, bootstraps the admin account
//! and drives the daily alert scheduler until a shutdown signal arrives.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AppConfig::load()  defaults ◄── billing.toml ◄── BILLING_*             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Database::new()    pool + embedded migrations                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  AppState::new()    JwtManager • PricingPolicy • AlertScheduler         │
//! │        │                                                                │
//! │        ├── bootstrap_admin()      when admin_email/password are set     │
//! │        ├── scheduler.start()      when scheduler_enabled                │
//! │        ▼                                                                │
//! │  wait for Ctrl+C / SIGTERM ──► scheduler.stop() ──► db.close()          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use billing_api::notifier::LogNotifier;
use billing_api::services::AuthService;
use billing_api::{AppConfig, AppState};
use billing_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting billing backend...");

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(
        database = %config.database_path,
        bundle = %config.bundle_name,
        tax_rate_bps = config.tax_rate.bps(),
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("Using the development JWT secret; set BILLING_JWT_SECRET in production");
    }

    // Connect to database
    let db = Database::new(config.db_config())
        .await
        .context("Failed to open database")?;
    info!("Database ready");

    // Create shared state
    let state = Arc::new(AppState::new(db, config, Arc::new(LogNotifier)));

    if let Some(admin) = &state.config.admin {
        AuthService::new(state.clone())
            .bootstrap_admin(admin)
            .await
            .context("Failed to bootstrap admin account")?;
    }

    if state.config.scheduler.enabled {
        state.scheduler.start().await;
    } else {
        info!("Scheduler disabled by configuration");
    }

    shutdown_signal().await;

    state.scheduler.stop().await;
    state.db.close().await;

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
