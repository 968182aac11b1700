//! Configuration types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::errors::{MonitorError, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// OKX exchange configuration
    #[serde(default)]
    pub okx: OkxConfig,
    /// Persistent store selection
    #[serde(default)]
    pub storage: StorageConfig,
    /// Database configuration (required for the postgres backend)
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Task cadences
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Notification routing
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Balance-diff and retention tuning
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl AppConfig {
    /// Reject values the scheduler and engines cannot run with
    pub fn validate(&self) -> Result<()> {
        self.schedule.validate()?;
        self.monitor.validate()?;

        if self.storage.backend == StorageBackend::Postgres && self.database.is_none() {
            return Err(MonitorError::Configuration(
                "storage.backend = \"postgres\" requires a [database] section".to_string(),
            ));
        }

        if self.okx.quote_currency.trim().is_empty() {
            return Err(MonitorError::Configuration(
                "okx.quote_currency must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// OKX platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkxConfig {
    /// API key for authenticated requests
    #[serde(default)]
    pub api_key: Option<String>,
    /// API secret for signing requests
    #[serde(default)]
    pub api_secret: Option<String>,
    /// API passphrase
    #[serde(default)]
    pub api_passphrase: Option<String>,
    /// Base URL for the REST API
    #[serde(default = "default_okx_rest_url")]
    pub rest_url: String,
    /// Currency every asset is priced against
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,
}

impl Default for OkxConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            api_passphrase: None,
            rest_url: default_okx_rest_url(),
            quote_currency: default_quote_currency(),
        }
    }
}

impl OkxConfig {
    /// Credentials, if all three parts are configured
    pub fn credentials(&self) -> Option<ApiCredentials> {
        match (&self.api_key, &self.api_secret, &self.api_passphrase) {
            (Some(key), Some(secret), Some(passphrase)) => Some(ApiCredentials::new(
                key.clone(),
                secret.clone(),
                passphrase.clone(),
            )),
            _ => None,
        }
    }
}

fn default_okx_rest_url() -> String {
    "https://www.okx.com".to_string()
}

fn default_quote_currency() -> String {
    "USDT".to_string()
}

/// Which persistent store backs the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Postgres,
}

/// Persistent store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory for the JSON file store
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

/// Database configuration for the postgres store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_connection_timeout() -> u64 {
    30
}

/// Cadence of the four periodic tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_balance_interval")]
    pub balance_interval_seconds: u64,
    #[serde(default = "default_alert_interval")]
    pub alert_interval_seconds: u64,
    #[serde(default = "default_hourly_interval")]
    pub hourly_interval_seconds: u64,
    #[serde(default = "default_daily_interval")]
    pub daily_interval_seconds: u64,
    /// Start hourly/daily snapshots on the next hour/UTC midnight boundary
    #[serde(default)]
    pub align_to_calendar: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            balance_interval_seconds: default_balance_interval(),
            alert_interval_seconds: default_alert_interval(),
            hourly_interval_seconds: default_hourly_interval(),
            daily_interval_seconds: default_daily_interval(),
            align_to_calendar: false,
        }
    }
}

impl ScheduleConfig {
    fn validate(&self) -> Result<()> {
        let intervals = [
            ("balance_interval_seconds", self.balance_interval_seconds),
            ("alert_interval_seconds", self.alert_interval_seconds),
            ("hourly_interval_seconds", self.hourly_interval_seconds),
            ("daily_interval_seconds", self.daily_interval_seconds),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(MonitorError::Configuration(format!(
                    "schedule.{} must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn default_balance_interval() -> u64 {
    30
}

fn default_alert_interval() -> u64 {
    60
}

fn default_hourly_interval() -> u64 {
    3600
}

fn default_daily_interval() -> u64 {
    86400
}

/// Notification routing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Recipient of alerts, summaries and trade confirmations
    #[serde(default = "default_owner_id")]
    pub owner_id: String,
    /// Public channel for auto-posted trades
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Optional HTTP endpoint receiving `{recipient, text}` JSON posts
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Notification queue capacity
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            owner_id: default_owner_id(),
            channel_id: None,
            webhook_url: None,
            channel_buffer: default_channel_buffer(),
        }
    }
}

fn default_owner_id() -> String {
    "owner".to_string()
}

fn default_channel_buffer() -> usize {
    crate::common::channels::DEFAULT_CHANNEL_SIZE
}

/// Thresholds used by the balance diff engine and retention
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Balance deltas at or below this are floating-point jitter
    #[serde(default = "default_noise_floor")]
    pub noise_floor: Decimal,
    /// Minimum notional for a delta to count as a trade
    #[serde(default = "default_min_trade_notional")]
    pub min_trade_notional: Decimal,
    /// Total-value change that refreshes the baseline without a trade
    #[serde(default = "default_total_drift_threshold")]
    pub total_drift_threshold: Decimal,
    /// Trailing window kept in hourly history
    #[serde(default = "default_hourly_retention_hours")]
    pub hourly_retention_hours: i64,
    /// Candles fetched for technical analysis
    #[serde(default = "default_analysis_candles")]
    pub analysis_candles: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            noise_floor: default_noise_floor(),
            min_trade_notional: default_min_trade_notional(),
            total_drift_threshold: default_total_drift_threshold(),
            hourly_retention_hours: default_hourly_retention_hours(),
            analysis_candles: default_analysis_candles(),
        }
    }
}

impl MonitorConfig {
    fn validate(&self) -> Result<()> {
        if self.noise_floor <= Decimal::ZERO
            || self.min_trade_notional <= Decimal::ZERO
            || self.total_drift_threshold <= Decimal::ZERO
        {
            return Err(MonitorError::Configuration(
                "monitor thresholds must be positive".to_string(),
            ));
        }
        if self.hourly_retention_hours <= 0 {
            return Err(MonitorError::Configuration(
                "monitor.hourly_retention_hours must be positive".to_string(),
            ));
        }
        if self.analysis_candles < crate::monitor::indicators::ANALYSIS_MIN_CANDLES {
            return Err(MonitorError::Configuration(format!(
                "monitor.analysis_candles must be at least {}",
                crate::monitor::indicators::ANALYSIS_MIN_CANDLES
            )));
        }
        Ok(())
    }
}

fn default_noise_floor() -> Decimal {
    Decimal::new(1, 6)
}

fn default_min_trade_notional() -> Decimal {
    Decimal::from(10)
}

fn default_total_drift_threshold() -> Decimal {
    Decimal::ONE
}

fn default_hourly_retention_hours() -> i64 {
    48
}

fn default_analysis_candles() -> usize {
    crate::monitor::indicators::ANALYSIS_MIN_CANDLES
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// API credentials for authenticated requests
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl ApiCredentials {
    pub fn new(api_key: String, api_secret: String, passphrase: String) -> Self {
        Self {
            api_key,
            api_secret,
            passphrase,
        }
    }
}
