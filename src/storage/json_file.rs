//! File-backed store: one pretty-printed JSON document per record
//!
//! Every write serializes the whole record to a sibling `.tmp` file and
//! renames it over the target, so a reader sees either the old or the new
//! document, never a torn one.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::common::errors::{MonitorError, Result};
use crate::common::traits::MonitorStore;
use crate::common::types::{
    BalanceState, HistoryEntry, HourlyHistoryEntry, MovementAlertSettings, PriceAlert, Settings,
};

const SETTINGS_FILE: &str = "settings.json";
const CAPITAL_FILE: &str = "capital.json";
const ALERTS_FILE: &str = "alerts.json";
const ALERT_SETTINGS_FILE: &str = "alert_settings.json";
const HISTORY_FILE: &str = "history.json";
const HOURLY_HISTORY_FILE: &str = "hourly_history.json";
const BALANCE_STATE_FILE: &str = "balance_state.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CapitalRecord {
    amount: Decimal,
}

/// Store keeping each record in its own JSON file under a data directory
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    /// Serialises read-modify-write sequences on list files
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Read a record, falling back to its default when missing or corrupt
    async fn read<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T> {
        match self.read_for_update(file).await {
            Err(MonitorError::Storage(reason)) => {
                warn!("{}, using defaults", reason);
                Ok(T::default())
            }
            other => other,
        }
    }

    /// Read a record that is about to be rewritten
    ///
    /// A missing file is its default, but corrupt content is an error so the
    /// file on disk stays untouched.
    async fn read_for_update<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T> {
        let path = self.path(file);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            MonitorError::Storage(format!("Corrupt record {}: {}", path.display(), e))
        })
    }

    async fn write<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.path(file);
        let tmp = self.path(&format!("{}.tmp", file));
        let json = serde_json::to_vec_pretty(value)?;

        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    async fn write_default_if_missing<T: Serialize + Default>(&self, file: &str) -> Result<()> {
        if fs::try_exists(self.path(file)).await? {
            return Ok(());
        }
        self.write(file, &T::default()).await
    }
}

#[async_trait]
impl MonitorStore for JsonFileStore {
    #[instrument(skip(self))]
    async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        self.write_default_if_missing::<Settings>(SETTINGS_FILE).await?;
        self.write_default_if_missing::<CapitalRecord>(CAPITAL_FILE).await?;
        self.write_default_if_missing::<Vec<PriceAlert>>(ALERTS_FILE).await?;
        self.write_default_if_missing::<MovementAlertSettings>(ALERT_SETTINGS_FILE)
            .await?;
        self.write_default_if_missing::<Vec<HistoryEntry>>(HISTORY_FILE).await?;
        self.write_default_if_missing::<Vec<HourlyHistoryEntry>>(HOURLY_HISTORY_FILE)
            .await?;
        self.write_default_if_missing::<BalanceState>(BALANCE_STATE_FILE).await?;

        info!("Initialized file storage at {}", self.dir.display());
        Ok(())
    }

    async fn load_settings(&self) -> Result<Settings> {
        self.read(SETTINGS_FILE).await
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.write(SETTINGS_FILE, settings).await
    }

    async fn load_capital(&self) -> Result<Decimal> {
        Ok(self.read::<CapitalRecord>(CAPITAL_FILE).await?.amount)
    }

    async fn save_capital(&self, amount: Decimal) -> Result<()> {
        self.write(CAPITAL_FILE, &CapitalRecord { amount }).await
    }

    async fn load_alert_settings(&self) -> Result<MovementAlertSettings> {
        self.read(ALERT_SETTINGS_FILE).await
    }

    async fn save_alert_settings(&self, settings: &MovementAlertSettings) -> Result<()> {
        self.write(ALERT_SETTINGS_FILE, settings).await
    }

    async fn load_balance_state(&self) -> Result<BalanceState> {
        self.read(BALANCE_STATE_FILE).await
    }

    async fn save_balance_state(&self, state: &BalanceState) -> Result<()> {
        self.write(BALANCE_STATE_FILE, state).await
    }

    async fn load_alerts(&self) -> Result<Vec<PriceAlert>> {
        self.read(ALERTS_FILE).await
    }

    async fn add_alert(&self, alert: &PriceAlert) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut alerts: Vec<PriceAlert> = self.read_for_update(ALERTS_FILE).await?;
        alerts.push(alert.clone());
        self.write(ALERTS_FILE, &alerts).await
    }

    async fn delete_alert(&self, id: Uuid) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut alerts: Vec<PriceAlert> = self.read_for_update(ALERTS_FILE).await?;
        let before = alerts.len();
        alerts.retain(|a| a.id != id);
        if alerts.len() == before {
            return Ok(false);
        }
        self.write(ALERTS_FILE, &alerts).await?;
        Ok(true)
    }

    async fn replace_alerts(&self, alerts: &[PriceAlert]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(ALERTS_FILE, alerts).await
    }

    async fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        let mut history: Vec<HistoryEntry> = self.read(HISTORY_FILE).await?;
        history.sort_by_key(|e| e.date);
        Ok(history)
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut history: Vec<HistoryEntry> = self.read_for_update(HISTORY_FILE).await?;
        history.push(entry.clone());
        self.write(HISTORY_FILE, &history).await
    }

    async fn load_hourly_history(&self) -> Result<Vec<HourlyHistoryEntry>> {
        self.read(HOURLY_HISTORY_FILE).await
    }

    async fn append_hourly_history(&self, entry: &HourlyHistoryEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut history: Vec<HourlyHistoryEntry> = self.read_for_update(HOURLY_HISTORY_FILE).await?;
        history.push(entry.clone());
        self.write(HOURLY_HISTORY_FILE, &history).await
    }

    async fn replace_hourly_history(&self, entries: &[HourlyHistoryEntry]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(HOURLY_HISTORY_FILE, entries).await
    }

    async fn clear_all(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(SETTINGS_FILE, &Settings::default()).await?;
        self.write(CAPITAL_FILE, &CapitalRecord::default()).await?;
        self.write(ALERTS_FILE, &Vec::<PriceAlert>::new()).await?;
        self.write(ALERT_SETTINGS_FILE, &MovementAlertSettings::default())
            .await?;
        self.write(HISTORY_FILE, &Vec::<HistoryEntry>::new()).await?;
        self.write(HOURLY_HISTORY_FILE, &Vec::<HourlyHistoryEntry>::new())
            .await?;
        self.write(BALANCE_STATE_FILE, &BalanceState::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use tokio_test::assert_err;

    use crate::common::types::AlertCondition;

    fn alert(instrument: &str) -> PriceAlert {
        PriceAlert {
            id: Uuid::new_v4(),
            instrument: instrument.to_string(),
            condition: AlertCondition::GreaterThan,
            target_price: dec!(100),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_init_creates_default_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data"));
        store.init().await.unwrap();

        assert!(store.dir().join(BALANCE_STATE_FILE).exists());
        assert_eq!(store.load_capital().await.unwrap(), Decimal::ZERO);
        assert_eq!(
            store.load_alert_settings().await.unwrap(),
            MovementAlertSettings::default()
        );
        assert!(store.load_alerts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_balance_state_round_trip_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.init().await.unwrap();

        let mut balances = BTreeMap::new();
        balances.insert("BTC".to_string(), dec!(1.001));
        let state = BalanceState {
            balances,
            total_value: dec!(50050),
        };
        store.save_balance_state(&state).await.unwrap();

        assert_eq!(store.load_balance_state().await.unwrap(), state);
        assert!(!dir.path().join("balance_state.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_alert_add_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.init().await.unwrap();

        let a = alert("BTC-USDT");
        let b = alert("ETH-USDT");
        store.add_alert(&a).await.unwrap();
        store.add_alert(&b).await.unwrap();

        assert!(store.delete_alert(a.id).await.unwrap());
        assert!(!store.delete_alert(a.id).await.unwrap());

        let remaining = store.load_alerts().await.unwrap();
        assert_eq!(remaining, vec![b]);
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.init().await.unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), b"{not json").unwrap();

        assert_eq!(store.load_settings().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_corrupt_list_is_not_overwritten_by_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.init().await.unwrap();
        let history_path = dir.path().join(HISTORY_FILE);
        std::fs::write(&history_path, b"[{\"date\": truncated").unwrap();

        let entry = HistoryEntry::new(dec!(1000), Utc::now());
        let err = assert_err!(store.append_history(&entry).await);

        assert!(matches!(err, MonitorError::Storage(_)));
        assert_eq!(
            std::fs::read(&history_path).unwrap(),
            b"[{\"date\": truncated".to_vec()
        );

        std::fs::write(dir.path().join(ALERTS_FILE), b"not json").unwrap();
        assert_err!(store.add_alert(&alert("BTC-USDT")).await);
        assert_err!(store.delete_alert(Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_clear_all_resets_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.init().await.unwrap();
        store.save_capital(dec!(1000)).await.unwrap();
        store.add_alert(&alert("BTC-USDT")).await.unwrap();

        store.clear_all().await.unwrap();

        assert_eq!(store.load_capital().await.unwrap(), Decimal::ZERO);
        assert!(store.load_alerts().await.unwrap().is_empty());
    }
}
