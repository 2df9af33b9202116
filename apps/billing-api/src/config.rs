//! Application configuration.
//!
//! Loaded with the `config` crate from three layers, later layers winning:
//!
//! ```text
//! ┌────────────────────┐   ┌────────────────────┐   ┌────────────────────┐
//! │ built-in defaults  │──►│ billing.toml       │──►│ BILLING_* env vars │
//! │                    │   │ (optional)         │   │                    │
//! └────────────────────┘   └────────────────────┘   └────────────────────┘
//! ```
//!
//! List keys (`alert_email_recipients`, `check_days`) are comma-separated in
//! the environment, e.g. `BILLING_CHECK_DAYS=0,1,2,3,4`.

use billing_core::types::TaxRate;
use billing_core::{PricingPolicy, DEFAULT_BUNDLE_NAME, DEFAULT_CURRENCY_SYMBOL};
use billing_db::DbConfig;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;

/// Base name of the optional configuration file (`billing.toml`).
pub const CONFIG_FILE: &str = "billing";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "BILLING";

/// Signing secret used when none is configured. Only fit for development.
pub const DEV_JWT_SECRET: &str = "billing-dev-secret-change-in-production";

/// Account created at startup when no user with its email exists.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Alert scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub recipients: Vec<String>,
    /// Weekdays to run on, Monday = 0.
    pub check_days: Vec<u32>,
    pub check_hour: u32,
    pub check_minute: u32,
    pub always_send_summary: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            enabled: true,
            recipients: Vec::new(),
            check_days: (0..=6).collect(),
            check_hour: 23,
            check_minute: 30,
            always_send_summary: false,
        }
    }
}

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// JWT refresh token lifetime in seconds
    pub jwt_refresh_lifetime_secs: i64,

    pub tax_rate: TaxRate,
    pub bundle_name: String,
    pub currency_symbol: String,

    pub admin: Option<AdminBootstrap>,
    pub scheduler: SchedulerConfig,
}

/// Shape of the merged sources before validation.
#[derive(Debug, Deserialize)]
struct RawConfig {
    database_path: String,
    max_connections: u32,
    jwt_secret: String,
    jwt_access_lifetime_secs: i64,
    jwt_refresh_lifetime_secs: i64,
    tax_rate: String,
    bundle_name: String,
    currency_symbol: String,
    admin_email: Option<String>,
    admin_password: Option<String>,
    admin_name: Option<String>,
    scheduler_enabled: bool,
    #[serde(default)]
    alert_email_recipients: Vec<String>,
    check_days: Vec<u32>,
    check_hour: u32,
    check_minute: u32,
    always_send_summary: bool,
}

impl AppConfig {
    /// Loads defaults, then `billing.toml` if present, then `BILLING_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("alert_email_recipients")
                    .with_list_parse_key("check_days"),
            );
        Self::from_builder(builder)
    }

    /// Defaults overlaid with a TOML document. Ignores the environment.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let builder = defaults()?.add_source(File::from_str(toml, FileFormat::Toml));
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let raw: RawConfig = builder.build()?.try_deserialize()?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let tax_rate = TaxRate::parse_fraction(&raw.tax_rate).map_err(|e| ConfigError::InvalidValue {
            key: "tax_rate".to_string(),
            message: e.to_string(),
        })?;

        if raw.check_hour > 23 {
            return Err(invalid("check_hour", format!("{} is not an hour (0-23)", raw.check_hour)));
        }
        if raw.check_minute > 59 {
            return Err(invalid(
                "check_minute",
                format!("{} is not a minute (0-59)", raw.check_minute),
            ));
        }
        if let Some(day) = raw.check_days.iter().find(|d| **d > 6) {
            return Err(invalid("check_days", format!("{day} is not a weekday (0=Mon..6=Sun)")));
        }
        if raw.bundle_name.trim().is_empty() {
            return Err(invalid("bundle_name", "must not be empty"));
        }
        if raw.jwt_access_lifetime_secs <= 0 || raw.jwt_refresh_lifetime_secs <= 0 {
            return Err(invalid("jwt_*_lifetime_secs", "must be positive"));
        }

        let admin = match (raw.admin_email, raw.admin_password) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some(AdminBootstrap {
                    email: email.trim().to_string(),
                    password,
                    name: raw.admin_name.unwrap_or_else(|| "Administrator".to_string()),
                })
            }
            _ => None,
        };

        let mut check_days = raw.check_days;
        check_days.sort_unstable();
        check_days.dedup();

        Ok(AppConfig {
            database_path: raw.database_path,
            max_connections: raw.max_connections,
            jwt_secret: raw.jwt_secret,
            jwt_access_lifetime_secs: raw.jwt_access_lifetime_secs,
            jwt_refresh_lifetime_secs: raw.jwt_refresh_lifetime_secs,
            tax_rate,
            bundle_name: raw.bundle_name.trim().to_string(),
            currency_symbol: raw.currency_symbol,
            admin,
            scheduler: SchedulerConfig {
                enabled: raw.scheduler_enabled,
                recipients: raw
                    .alert_email_recipients
                    .into_iter()
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .collect(),
                check_days,
                check_hour: raw.check_hour,
                check_minute: raw.check_minute,
                always_send_summary: raw.always_send_summary,
            },
        })
    }

    /// Tax and bundle settings for receipt pricing.
    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy::new(self.tax_rate, self.bundle_name.clone())
    }

    /// Pool settings for the configured database file.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }

    /// True when the development signing secret is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let scheduler = SchedulerConfig::default();
    let check_days: Vec<i64> = scheduler.check_days.iter().map(|d| i64::from(*d)).collect();

    Ok(config::Config::builder()
        .set_default("database_path", "./billing.db")?
        .set_default("max_connections", 5)?
        .set_default("jwt_secret", DEV_JWT_SECRET)?
        .set_default("jwt_access_lifetime_secs", 3600)? // 1 hour
        .set_default("jwt_refresh_lifetime_secs", 2_592_000)? // 30 days
        .set_default("tax_rate", "0.10")?
        .set_default("bundle_name", DEFAULT_BUNDLE_NAME)?
        .set_default("currency_symbol", DEFAULT_CURRENCY_SYMBOL)?
        .set_default("scheduler_enabled", scheduler.enabled)?
        .set_default("check_days", check_days)?
        .set_default("check_hour", i64::from(scheduler.check_hour))?
        .set_default("check_minute", i64::from(scheduler.check_minute))?
        .set_default("always_send_summary", scheduler.always_send_summary)?)
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
