//! # billing-api
//!
//! Application services for the receipt billing backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Billing Services                                │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  AuthService   │  │  UserService   │  │  ProductService            ││
//! │  │                │  │  (admin only)  │  │                            ││
//! │  │ • login        │  │ • create/list  │  │ • create/list/get          ││
//! │  │ • register     │  │ • get/update   │  │ • update                   ││
//! │  │ • refresh      │  │ • delete       │  │ • delete                   ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │ ReceiptService │  │DashboardService│  │  SchedulerService          ││
//! │  │                │  │                │  │  (admin only)              ││
//! │  │ • create       │  │ • dashboard    │  │ • status / trigger         ││
//! │  │ • search       │  │ • export xlsx  │  │ • start / stop             ││
//! │  │ • day groups   │  │                │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  AppState: Database • AppConfig • JwtManager • PricingPolicy     │  │
//! │  │            AlertScheduler ──► Notifier                           │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]. Everything is read from defaults, `billing.toml` and
//! `BILLING_*` environment variables.

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod notifier;
pub mod scheduler;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

// Re-exports
pub use config::AppConfig;
pub use error::{ApiError, ApiResult};

use auth::JwtManager;
use billing_core::PricingPolicy;
use billing_db::Database;
use notifier::Notifier;
use scheduler::AlertScheduler;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    pub jwt: JwtManager,
    pub policy: PricingPolicy,
    pub scheduler: Arc<AlertScheduler>,
}

impl AppState {
    /// Wires the services' dependencies from a loaded configuration.
    pub fn new(db: Database, config: AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        let jwt = JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        );
        let scheduler = Arc::new(AlertScheduler::new(
            db.clone(),
            notifier,
            config.scheduler.clone(),
            config.currency_symbol.clone(),
        ));

        AppState {
            policy: config.pricing_policy(),
            db,
            config,
            jwt,
            scheduler,
        }
    }
}
