//! Domain types shared by the collaborators and the monitoring core

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::errors::{MonitorError, Result};

/// Latest prices keyed by instrument id (e.g. `BTC-USDT`)
pub type PriceMap = HashMap<String, PriceTick>;

/// Build the instrument id used to price an asset against a quote currency
pub fn instrument_id(asset: &str, quote: &str) -> String {
    format!("{}-{}", asset, quote)
}

/// Last traded price of an instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    /// Last traded price
    pub price: Decimal,
    /// Price 24 hours ago, when the feed provides it
    #[serde(default)]
    pub open_24h: Option<Decimal>,
}

impl PriceTick {
    /// Create a tick without 24h reference data
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            open_24h: None,
        }
    }

    /// 24h change in percent, if the open is known and non-zero
    pub fn change_percent_24h(&self) -> Option<Decimal> {
        match self.open_24h {
            Some(open) if !open.is_zero() => {
                Some((self.price - open) / open * Decimal::ONE_HUNDRED)
            }
            _ => None,
        }
    }
}

/// Direction of an inferred trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "buy"),
            TradeDirection::Sell => write!(f, "sell"),
        }
    }
}

/// One holding as reported by the portfolio collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAsset {
    pub asset: String,
    pub amount: Decimal,
    pub price: Decimal,
    pub value: Decimal,
}

/// Raw portfolio fetch result
///
/// A non-empty `error` means the fetch failed and the whole report must be
/// ignored by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub assets: Vec<PortfolioAsset>,
    pub total: Decimal,
    #[serde(default)]
    pub error: Option<String>,
}

impl PortfolioReport {
    /// Report describing a failed fetch
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            assets: Vec::new(),
            total: Decimal::ZERO,
            error: Some(reason.into()),
        }
    }

    /// Turn an in-band error into `PortfolioUnavailable`
    pub fn ensure_ok(self) -> Result<Self> {
        match self.error.as_deref().filter(|e| !e.is_empty()) {
            Some(reason) => Err(MonitorError::PortfolioUnavailable(reason.to_string())),
            None => Ok(self),
        }
    }

    /// Convert into a snapshot, short-circuiting on a reported error
    pub fn into_snapshot(self, captured_at: DateTime<Utc>) -> Result<PortfolioSnapshot> {
        let report = self.ensure_ok()?;

        let balances = report
            .assets
            .into_iter()
            .map(|a| (a.asset, a.amount))
            .collect();

        Ok(PortfolioSnapshot {
            balances,
            total_value: report.total,
            captured_at,
        })
    }
}

/// Point-in-time view of every holding plus the total valuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub balances: BTreeMap<String, Decimal>,
    pub total_value: Decimal,
    pub captured_at: DateTime<Utc>,
}

/// Last observed balances, used as the diff baseline
///
/// Always written wholesale, never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceState {
    #[serde(default)]
    pub balances: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub total_value: Decimal,
}

impl BalanceState {
    /// Baseline built from every asset of a snapshot
    pub fn from_snapshot(snapshot: &PortfolioSnapshot) -> Self {
        Self {
            balances: snapshot.balances.clone(),
            total_value: snapshot.total_value,
        }
    }

    /// Baseline amount of an asset, zero when never seen
    pub fn amount_of(&self, asset: &str) -> Decimal {
        self.balances.get(asset).copied().unwrap_or(Decimal::ZERO)
    }
}

/// A trade inferred from a balance change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub asset: String,
    pub direction: TradeDirection,
    /// Absolute size of the balance change
    pub quantity: Decimal,
    pub approx_price: Decimal,
    pub notional_value: Decimal,
    /// Balance after the change
    pub new_balance: Decimal,
    pub observed_at: DateTime<Utc>,
}

/// Trigger condition of a fixed-price alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertCondition {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
}

impl AlertCondition {
    /// Boundary-inclusive check of a price against the target
    pub fn is_met(&self, price: Decimal, target: Decimal) -> bool {
        match self {
            AlertCondition::GreaterThan => price >= target,
            AlertCondition::LessThan => price <= target,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            AlertCondition::GreaterThan => ">",
            AlertCondition::LessThan => "<",
        }
    }
}

impl std::fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertCondition::GreaterThan => write!(f, "above"),
            AlertCondition::LessThan => write!(f, "below"),
        }
    }
}

impl std::str::FromStr for AlertCondition {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            ">" => Ok(AlertCondition::GreaterThan),
            "<" => Ok(AlertCondition::LessThan),
            other => Err(MonitorError::InvalidAlert(format!(
                "unknown condition '{}', expected '>' or '<'",
                other
            ))),
        }
    }
}

/// One-shot fixed-price alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: Uuid,
    pub instrument: String,
    pub condition: AlertCondition,
    pub target_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Percent-move thresholds, globally and per asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementAlertSettings {
    pub global: Decimal,
    #[serde(default)]
    pub overrides: BTreeMap<String, Decimal>,
}

impl Default for MovementAlertSettings {
    fn default() -> Self {
        Self {
            global: Decimal::from(5),
            overrides: BTreeMap::new(),
        }
    }
}

impl MovementAlertSettings {
    /// Override for the asset if one is set, else the global percent
    pub fn threshold_for(&self, asset: &str) -> Decimal {
        self.overrides.get(asset).copied().unwrap_or(self.global)
    }
}

/// Indicators computed over one close series
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorAnalysis {
    pub rsi: Option<Decimal>,
    pub sma20: Option<Decimal>,
    pub sma50: Option<Decimal>,
}

/// Daily valuation record, kept forever
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub total: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(total: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            date: timestamp.date_naive(),
            total,
            timestamp,
        }
    }
}

/// Hourly valuation record, retention-bounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub total: Decimal,
    pub hour: u32,
}

impl HourlyHistoryEntry {
    pub fn new(total: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            total,
            hour: timestamp.hour(),
        }
    }
}

/// User-facing switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub daily_summary: bool,
    #[serde(default)]
    pub auto_post_to_channel: bool,
    #[serde(default)]
    pub debug_mode: bool,
}

/// Message handed to a notification sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub text: String,
}
