//! PostgreSQL-backed store
//!
//! Records are kept as JSONB documents: singletons in `monitor_state`
//! keyed by name, lists in `monitor_records` ordered by insertion.
//! Full-list replacement runs in a single transaction.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::Row;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::common::errors::Result;
use crate::common::traits::MonitorStore;
use crate::common::types::{
    BalanceState, HistoryEntry, HourlyHistoryEntry, MovementAlertSettings, PriceAlert, Settings,
};
use crate::config::types::DatabaseConfig;

const KEY_SETTINGS: &str = "settings";
const KEY_CAPITAL: &str = "capital";
const KEY_ALERT_SETTINGS: &str = "alert_settings";
const KEY_BALANCE_STATE: &str = "balance_state";

const COLLECTION_ALERTS: &str = "alerts";
const COLLECTION_HISTORY: &str = "history";
const COLLECTION_HOURLY: &str = "hourly_history";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS monitor_state (
        key TEXT PRIMARY KEY,
        body JSONB NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS monitor_records (
        seq BIGSERIAL PRIMARY KEY,
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        body JSONB NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS monitor_records_collection_idx
        ON monitor_records (collection, seq)",
];

/// Store persisting monitor records in PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect a pool using the database configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }

    async fn get_state<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let row = sqlx::query("SELECT body FROM monitor_state WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let Json(value): Json<T> = row.try_get("body")?;
                Ok(value)
            }
            None => Ok(T::default()),
        }
    }

    async fn set_state<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        sqlx::query(
            "INSERT INTO monitor_state (key, body) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET body = EXCLUDED.body",
        )
        .bind(key)
        .bind(Json(value))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        let rows = sqlx::query(
            "SELECT body FROM monitor_records WHERE collection = $1 ORDER BY seq",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let Json(value): Json<T> = row.try_get("body")?;
                Ok(value)
            })
            .collect()
    }

    async fn insert<T: Serialize + Sync>(
        &self,
        collection: &str,
        id: &str,
        value: &T,
    ) -> Result<()> {
        sqlx::query("INSERT INTO monitor_records (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id)
            .bind(Json(value))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn replace<T, F>(&self, collection: &str, values: &[T], id_of: F) -> Result<()>
    where
        T: Serialize + Sync,
        F: Fn(&T) -> String,
    {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM monitor_records WHERE collection = $1")
            .bind(collection)
            .execute(&mut *tx)
            .await?;

        for value in values {
            sqlx::query("INSERT INTO monitor_records (collection, id, body) VALUES ($1, $2, $3)")
                .bind(collection)
                .bind(id_of(value))
                .bind(Json(value))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl MonitorStore for PostgresStore {
    #[instrument(skip(self))]
    async fn init(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Initialized PostgreSQL storage");
        Ok(())
    }

    async fn load_settings(&self) -> Result<Settings> {
        self.get_state(KEY_SETTINGS).await
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.set_state(KEY_SETTINGS, settings).await
    }

    async fn load_capital(&self) -> Result<Decimal> {
        self.get_state(KEY_CAPITAL).await
    }

    async fn save_capital(&self, amount: Decimal) -> Result<()> {
        self.set_state(KEY_CAPITAL, &amount).await
    }

    async fn load_alert_settings(&self) -> Result<MovementAlertSettings> {
        self.get_state(KEY_ALERT_SETTINGS).await
    }

    async fn save_alert_settings(&self, settings: &MovementAlertSettings) -> Result<()> {
        self.set_state(KEY_ALERT_SETTINGS, settings).await
    }

    async fn load_balance_state(&self) -> Result<BalanceState> {
        self.get_state(KEY_BALANCE_STATE).await
    }

    async fn save_balance_state(&self, state: &BalanceState) -> Result<()> {
        self.set_state(KEY_BALANCE_STATE, state).await
    }

    async fn load_alerts(&self) -> Result<Vec<PriceAlert>> {
        self.list(COLLECTION_ALERTS).await
    }

    async fn add_alert(&self, alert: &PriceAlert) -> Result<()> {
        self.insert(COLLECTION_ALERTS, &alert.id.to_string(), alert)
            .await
    }

    async fn delete_alert(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM monitor_records WHERE collection = $1 AND id = $2")
            .bind(COLLECTION_ALERTS)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn replace_alerts(&self, alerts: &[PriceAlert]) -> Result<()> {
        self.replace(COLLECTION_ALERTS, alerts, |a| a.id.to_string())
            .await
    }

    async fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        let mut history: Vec<HistoryEntry> = self.list(COLLECTION_HISTORY).await?;
        history.sort_by_key(|e| e.date);
        Ok(history)
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        self.insert(COLLECTION_HISTORY, &entry.date.to_string(), entry)
            .await
    }

    async fn load_hourly_history(&self) -> Result<Vec<HourlyHistoryEntry>> {
        self.list(COLLECTION_HOURLY).await
    }

    async fn append_hourly_history(&self, entry: &HourlyHistoryEntry) -> Result<()> {
        self.insert(COLLECTION_HOURLY, &entry.timestamp.to_rfc3339(), entry)
            .await
    }

    async fn replace_hourly_history(&self, entries: &[HourlyHistoryEntry]) -> Result<()> {
        self.replace(COLLECTION_HOURLY, entries, |e| e.timestamp.to_rfc3339())
            .await
    }

    async fn clear_all(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM monitor_state").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM monitor_records").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}
