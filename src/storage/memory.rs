//! In-memory store, used for dry runs and tests

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::common::errors::Result;
use crate::common::traits::MonitorStore;
use crate::common::types::{
    BalanceState, HistoryEntry, HourlyHistoryEntry, MovementAlertSettings, PriceAlert, Settings,
};

#[derive(Debug, Default, Clone)]
struct State {
    settings: Settings,
    capital: Decimal,
    alert_settings: MovementAlertSettings,
    balance_state: BalanceState,
    alerts: Vec<PriceAlert>,
    history: Vec<HistoryEntry>,
    hourly_history: Vec<HourlyHistoryEntry>,
}

/// Store that keeps every record in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MonitorStore for InMemoryStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn load_settings(&self) -> Result<Settings> {
        Ok(self.state.read().await.settings)
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.state.write().await.settings = *settings;
        Ok(())
    }

    async fn load_capital(&self) -> Result<Decimal> {
        Ok(self.state.read().await.capital)
    }

    async fn save_capital(&self, amount: Decimal) -> Result<()> {
        self.state.write().await.capital = amount;
        Ok(())
    }

    async fn load_alert_settings(&self) -> Result<MovementAlertSettings> {
        Ok(self.state.read().await.alert_settings.clone())
    }

    async fn save_alert_settings(&self, settings: &MovementAlertSettings) -> Result<()> {
        self.state.write().await.alert_settings = settings.clone();
        Ok(())
    }

    async fn load_balance_state(&self) -> Result<BalanceState> {
        Ok(self.state.read().await.balance_state.clone())
    }

    async fn save_balance_state(&self, state: &BalanceState) -> Result<()> {
        self.state.write().await.balance_state = state.clone();
        Ok(())
    }

    async fn load_alerts(&self) -> Result<Vec<PriceAlert>> {
        Ok(self.state.read().await.alerts.clone())
    }

    async fn add_alert(&self, alert: &PriceAlert) -> Result<()> {
        self.state.write().await.alerts.push(alert.clone());
        Ok(())
    }

    async fn delete_alert(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.alerts.len();
        state.alerts.retain(|a| a.id != id);
        Ok(state.alerts.len() != before)
    }

    async fn replace_alerts(&self, alerts: &[PriceAlert]) -> Result<()> {
        self.state.write().await.alerts = alerts.to_vec();
        Ok(())
    }

    async fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        let mut history = self.state.read().await.history.clone();
        history.sort_by_key(|e| e.date);
        Ok(history)
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        self.state.write().await.history.push(entry.clone());
        Ok(())
    }

    async fn load_hourly_history(&self) -> Result<Vec<HourlyHistoryEntry>> {
        Ok(self.state.read().await.hourly_history.clone())
    }

    async fn append_hourly_history(&self, entry: &HourlyHistoryEntry) -> Result<()> {
        self.state.write().await.hourly_history.push(entry.clone());
        Ok(())
    }

    async fn replace_hourly_history(&self, entries: &[HourlyHistoryEntry]) -> Result<()> {
        self.state.write().await.hourly_history = entries.to_vec();
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        *self.state.write().await = State::default();
        Ok(())
    }
}
