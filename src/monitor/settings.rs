//! User-driven changes to alerts, movement thresholds, capital and switches
//!
//! Every function validates before touching the store, so a rejected input
//! leaves persisted state untouched.

use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::common::errors::{MonitorError, Result};
use crate::common::traits::MonitorStore;
use crate::common::types::{MovementAlertSettings, PriceAlert, Settings};
use crate::monitor::alerts::parse_alert;

/// Toggleable user switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingToggle {
    DailySummary,
    AutoPostToChannel,
    DebugMode,
}

impl std::str::FromStr for SettingToggle {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "daily_summary" => Ok(SettingToggle::DailySummary),
            "auto_post" | "auto_post_to_channel" => Ok(SettingToggle::AutoPostToChannel),
            "debug" | "debug_mode" => Ok(SettingToggle::DebugMode),
            other => Err(MonitorError::InvalidSetting(format!("unknown setting '{}'", other))),
        }
    }
}

/// Parse and store a new alert such as `BTC-USDT > 50000`
#[instrument(skip(store))]
pub async fn add_alert(store: &dyn MonitorStore, input: &str) -> Result<PriceAlert> {
    let alert = parse_alert(input)?;
    store.add_alert(&alert).await?;
    info!(id = %alert.id, instrument = %alert.instrument, "Alert added");
    Ok(alert)
}

pub async fn list_alerts(store: &dyn MonitorStore) -> Result<Vec<PriceAlert>> {
    store.load_alerts().await
}

/// Delete the alert at a 1-based position of the current list
#[instrument(skip(store))]
pub async fn delete_alert_at(store: &dyn MonitorStore, position: usize) -> Result<PriceAlert> {
    let alerts = store.load_alerts().await?;
    let alert = position
        .checked_sub(1)
        .and_then(|i| alerts.get(i))
        .cloned()
        .ok_or_else(|| {
            MonitorError::InvalidAlert(format!(
                "no alert at position {} ({} active)",
                position,
                alerts.len()
            ))
        })?;

    delete_alert(store, alert.id).await?;
    Ok(alert)
}

pub async fn delete_alert(store: &dyn MonitorStore, id: Uuid) -> Result<()> {
    if store.delete_alert(id).await? {
        info!(%id, "Alert deleted");
        Ok(())
    } else {
        Err(MonitorError::InvalidAlert(format!("alert {} not found", id)))
    }
}

/// Set the global movement percent; must be positive
#[instrument(skip(store))]
pub async fn set_global_movement(
    store: &dyn MonitorStore,
    percent: Decimal,
) -> Result<MovementAlertSettings> {
    if percent <= Decimal::ZERO {
        return Err(MonitorError::InvalidSetting(format!(
            "global movement percent must be positive, got {}",
            percent
        )));
    }

    let mut settings = store.load_alert_settings().await?;
    settings.global = percent;
    store.save_alert_settings(&settings).await?;
    Ok(settings)
}

/// Set a per-asset movement percent; zero removes the override
#[instrument(skip(store))]
pub async fn set_movement_override(
    store: &dyn MonitorStore,
    asset: &str,
    percent: Decimal,
) -> Result<MovementAlertSettings> {
    let asset = asset.trim().to_uppercase();
    if asset.is_empty() || !asset.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(MonitorError::InvalidSetting(format!("'{}' is not an asset symbol", asset)));
    }
    if percent < Decimal::ZERO {
        return Err(MonitorError::InvalidSetting(format!(
            "movement percent must not be negative, got {}",
            percent
        )));
    }

    let mut settings = store.load_alert_settings().await?;
    if percent.is_zero() {
        settings.overrides.remove(&asset);
    } else {
        settings.overrides.insert(asset, percent);
    }
    store.save_alert_settings(&settings).await?;
    Ok(settings)
}

#[instrument(skip(store))]
pub async fn set_capital(store: &dyn MonitorStore, amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(MonitorError::InvalidSetting(format!(
            "capital must not be negative, got {}",
            amount
        )));
    }
    store.save_capital(amount).await
}

/// Flip one switch and return the updated settings
#[instrument(skip(store))]
pub async fn toggle_setting(store: &dyn MonitorStore, toggle: SettingToggle) -> Result<Settings> {
    let mut settings = store.load_settings().await?;
    let flag = match toggle {
        SettingToggle::DailySummary => &mut settings.daily_summary,
        SettingToggle::AutoPostToChannel => &mut settings.auto_post_to_channel,
        SettingToggle::DebugMode => &mut settings.debug_mode,
    };
    *flag = !*flag;
    store.save_settings(&settings).await?;
    Ok(settings)
}

/// Reset every persisted record to its default
#[instrument(skip(store))]
pub async fn clear_all(store: &dyn MonitorStore) -> Result<()> {
    store.clear_all().await?;
    info!("All monitor data cleared");
    Ok(())
}
