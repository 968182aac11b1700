//! Trait definitions for the collaborators the monitor core consumes

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::errors::Result;
use super::types::{
    BalanceState, HistoryEntry, HourlyHistoryEntry, MovementAlertSettings, PortfolioReport,
    PriceAlert, PriceMap, Settings,
};

/// Trait for market data sources (exchange REST APIs, fixtures, etc.)
///
/// All access is poll-based. An implementation signals "no data" with an
/// error rather than a partial result; the caller skips its cycle.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest price of every listed instrument
    async fn get_market_prices(&self) -> Result<PriceMap>;

    /// Close prices for an instrument, oldest first, at most `count` long
    ///
    /// # Arguments
    /// * `instrument` - Instrument id (e.g. `BTC-USDT`)
    /// * `count` - Maximum number of candles to return
    async fn get_historical_candles(&self, instrument: &str, count: usize) -> Result<Vec<Decimal>>;

    /// Current holdings valued with the given prices
    ///
    /// Failures the exchange reports in-band come back in `PortfolioReport::error`.
    async fn get_portfolio(&self, prices: &PriceMap) -> Result<PortfolioReport>;
}

/// Persistent store for monitor state
///
/// Singletons are read and written whole. List writes are either a single
/// insert/delete or a full replacement, never a partial patch.
#[async_trait]
pub trait MonitorStore: Send + Sync {
    /// Prepare the backing storage (directories, tables, defaults)
    async fn init(&self) -> Result<()>;

    async fn load_settings(&self) -> Result<Settings>;
    async fn save_settings(&self, settings: &Settings) -> Result<()>;

    async fn load_capital(&self) -> Result<Decimal>;
    async fn save_capital(&self, amount: Decimal) -> Result<()>;

    async fn load_alert_settings(&self) -> Result<MovementAlertSettings>;
    async fn save_alert_settings(&self, settings: &MovementAlertSettings) -> Result<()>;

    async fn load_balance_state(&self) -> Result<BalanceState>;
    async fn save_balance_state(&self, state: &BalanceState) -> Result<()>;

    async fn load_alerts(&self) -> Result<Vec<PriceAlert>>;
    async fn add_alert(&self, alert: &PriceAlert) -> Result<()>;
    /// Returns whether an alert with this id existed
    async fn delete_alert(&self, id: Uuid) -> Result<bool>;
    async fn replace_alerts(&self, alerts: &[PriceAlert]) -> Result<()>;

    /// Daily history ordered by date
    async fn load_history(&self) -> Result<Vec<HistoryEntry>>;
    async fn append_history(&self, entry: &HistoryEntry) -> Result<()>;

    async fn load_hourly_history(&self) -> Result<Vec<HourlyHistoryEntry>>;
    async fn append_hourly_history(&self, entry: &HourlyHistoryEntry) -> Result<()>;
    async fn replace_hourly_history(&self, entries: &[HourlyHistoryEntry]) -> Result<()>;

    /// Reset every record to its default
    async fn clear_all(&self) -> Result<()>;
}

/// Outbound message delivery
///
/// Fire-and-forget from the core's point of view: failures are logged by
/// the caller and never retried.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, recipient: &str, message: &str) -> Result<()>;
}
