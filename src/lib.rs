//! PortfolioMonitor Library
//!
//! Polls an exchange portfolio, infers trades from balance changes,
//! evaluates price alerts and keeps hourly and daily valuation history.

pub mod common;
pub mod config;
pub mod monitor;
pub mod notify;
pub mod okx;
pub mod storage;

// Re-export commonly used types
pub use common::errors::{MonitorError, Result};
pub use common::traits::{MarketDataProvider, MonitorStore, NotificationSink};
pub use common::types::{
    AlertCondition, BalanceState, HistoryEntry, HourlyHistoryEntry, MovementAlertSettings,
    PortfolioReport, PortfolioSnapshot, PriceAlert, PriceMap, PriceTick, Settings, TradeDirection,
    TradeEvent,
};
pub use config::types::AppConfig;
pub use monitor::{CycleReport, Monitor, Scheduler};
pub use notify::{ChannelNotifier, DeliveryWorker};
pub use okx::OkxClient;
pub use storage::{open_store, InMemoryStore, JsonFileStore, PostgresStore};
