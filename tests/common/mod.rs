//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use rust_decimal::Decimal;
use std::sync::Mutex;
use uuid::Uuid;

use portfolio_monitor::common::types::{Notification, PortfolioAsset};
use portfolio_monitor::{
    AppConfig, BalanceState, HistoryEntry, HourlyHistoryEntry, InMemoryStore, MarketDataProvider,
    MonitorError, MonitorStore, MovementAlertSettings, NotificationSink, PortfolioReport,
    PriceAlert, PriceMap, PriceTick, Result, Settings,
};

mock! {
    pub Provider {}

    #[async_trait]
    impl MarketDataProvider for Provider {
        async fn get_market_prices(&self) -> Result<PriceMap>;
        async fn get_historical_candles(
            &self,
            instrument: &str,
            count: usize,
        ) -> Result<Vec<Decimal>>;
        async fn get_portfolio(&self, prices: &PriceMap) -> Result<PortfolioReport>;
    }
}

mock! {
    pub Sink {}

    #[async_trait]
    impl NotificationSink for Sink {
        async fn send(&self, recipient: &str, message: &str) -> Result<()>;
    }
}

/// Sink that keeps every message for later assertions
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, recipient: &str, message: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Notification {
            recipient: recipient.to_string(),
            text: message.to_string(),
        });
        Ok(())
    }
}

/// In-memory store whose baseline and alert-list writes always fail
#[derive(Default)]
pub struct FailingStore {
    inner: InMemoryStore,
}

impl FailingStore {
    /// Direct access for seeding state the wrapper would refuse to write
    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }
}

fn write_refused(record: &str) -> MonitorError {
    MonitorError::Storage(format!("{} is read-only", record))
}

#[async_trait]
impl MonitorStore for FailingStore {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn load_settings(&self) -> Result<Settings> {
        self.inner.load_settings().await
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.inner.save_settings(settings).await
    }

    async fn load_capital(&self) -> Result<Decimal> {
        self.inner.load_capital().await
    }

    async fn save_capital(&self, amount: Decimal) -> Result<()> {
        self.inner.save_capital(amount).await
    }

    async fn load_alert_settings(&self) -> Result<MovementAlertSettings> {
        self.inner.load_alert_settings().await
    }

    async fn save_alert_settings(&self, settings: &MovementAlertSettings) -> Result<()> {
        self.inner.save_alert_settings(settings).await
    }

    async fn load_balance_state(&self) -> Result<BalanceState> {
        self.inner.load_balance_state().await
    }

    async fn save_balance_state(&self, _state: &BalanceState) -> Result<()> {
        Err(write_refused("balance state"))
    }

    async fn load_alerts(&self) -> Result<Vec<PriceAlert>> {
        self.inner.load_alerts().await
    }

    async fn add_alert(&self, alert: &PriceAlert) -> Result<()> {
        self.inner.add_alert(alert).await
    }

    async fn delete_alert(&self, id: Uuid) -> Result<bool> {
        self.inner.delete_alert(id).await
    }

    async fn replace_alerts(&self, _alerts: &[PriceAlert]) -> Result<()> {
        Err(write_refused("alert list"))
    }

    async fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        self.inner.load_history().await
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        self.inner.append_history(entry).await
    }

    async fn load_hourly_history(&self) -> Result<Vec<HourlyHistoryEntry>> {
        self.inner.load_hourly_history().await
    }

    async fn append_hourly_history(&self, entry: &HourlyHistoryEntry) -> Result<()> {
        self.inner.append_hourly_history(entry).await
    }

    async fn replace_hourly_history(&self, entries: &[HourlyHistoryEntry]) -> Result<()> {
        self.inner.replace_hourly_history(entries).await
    }

    async fn clear_all(&self) -> Result<()> {
        self.inner.clear_all().await
    }
}

/// Price map from `(instrument, price)` pairs
pub fn prices(entries: &[(&str, Decimal)]) -> PriceMap {
    entries
        .iter()
        .map(|(instrument, price)| (instrument.to_string(), PriceTick::new(*price)))
        .collect()
}

/// Portfolio report from `(asset, amount, price)` triples
pub fn portfolio(entries: &[(&str, Decimal, Decimal)]) -> PortfolioReport {
    let assets: Vec<PortfolioAsset> = entries
        .iter()
        .map(|(asset, amount, price)| PortfolioAsset {
            asset: asset.to_string(),
            amount: *amount,
            price: *price,
            value: amount * price,
        })
        .collect();
    let total = assets.iter().map(|a| a.value).sum();

    PortfolioReport {
        assets,
        total,
        error: None,
    }
}

/// Provider that always returns the same prices and portfolio
pub fn static_provider(prices: PriceMap, report: PortfolioReport) -> MockProvider {
    let mut provider = MockProvider::new();
    provider
        .expect_get_market_prices()
        .returning(move || Ok(prices.clone()));
    provider
        .expect_get_portfolio()
        .returning(move |_| Ok(report.clone()));
    provider
}

/// Config routing notifications to `owner` and `channel`
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.notifications.owner_id = "owner".to_string();
    config.notifications.channel_id = Some("channel".to_string());
    config
}

/// Sample OKX payloads
pub mod okx_bodies {
    pub const TICKERS: &str = r#"{
        "code": "0",
        "msg": "",
        "data": [
            {"instType": "SPOT", "instId": "BTC-USDT", "last": "50000", "open24h": "48000"},
            {"instType": "SPOT", "instId": "ETH-USDT", "last": "3000", "open24h": "3100"}
        ]
    }"#;

    pub const EMPTY_TICKERS: &str = r#"{"code": "0", "msg": "", "data": []}"#;

    /// Newest first, as OKX returns them
    pub const CANDLES: &str = r#"{
        "code": "0",
        "msg": "",
        "data": [
            ["1704240000000", "102", "104", "101", "103", "10", "0", "0", "1"],
            ["1704153600000", "101", "103", "100", "102", "10", "0", "0", "1"],
            ["1704067200000", "100", "102", "99", "101", "10", "0", "0", "1"]
        ]
    }"#;

    pub const BALANCE: &str = r#"{
        "code": "0",
        "msg": "",
        "data": [{
            "totalEq": "1000",
            "details": [
                {"ccy": "USDT", "eq": "250"},
                {"ccy": "BTC", "eq": "0.01"},
                {"ccy": "ETH", "eq": "0"}
            ]
        }]
    }"#;

    pub const AUTH_ERROR: &str = r#"{"code": "50111", "msg": "Invalid OK-ACCESS-KEY", "data": []}"#;
}
