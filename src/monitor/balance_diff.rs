//! Balance diffing and trade inference
//!
//! Compares the persisted baseline against a fresh snapshot, promotes
//! significant deltas to [`TradeEvent`]s and decides whether the baseline
//! must be rewritten. Pure: no I/O happens here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::common::types::{
    instrument_id, BalanceState, MovementAlertSettings, PortfolioSnapshot, PriceMap, TradeDirection,
    TradeEvent,
};
use crate::config::types::MonitorConfig;

/// Thresholds that separate noise, baseline drift and trades
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffThresholds {
    /// Deltas with `|delta| <= noise_floor` are ignored entirely
    pub noise_floor: Decimal,
    /// Deltas must exceed this notional to become trades
    pub min_trade_notional: Decimal,
    /// Total-value change that refreshes an otherwise unchanged baseline
    pub total_drift: Decimal,
}

impl Default for DiffThresholds {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for DiffThresholds {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            noise_floor: config.noise_floor,
            min_trade_notional: config.min_trade_notional,
            total_drift: config.total_drift_threshold,
        }
    }
}

/// Why the baseline is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineUpdate {
    Unchanged,
    /// At least one asset moved past the noise floor
    CompositionChanged,
    /// No asset moved but the total valuation drifted
    ValuationDrift,
}

/// A balance delta above the noise floor
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceChange {
    pub asset: String,
    pub delta: Decimal,
    pub new_amount: Decimal,
    pub price: Decimal,
    pub notional: Decimal,
    /// Movement-alert percent resolved for the asset (override or global).
    /// Informational only; it does not gate trade detection.
    pub movement_threshold: Decimal,
}

/// Result of diffing one snapshot against the baseline
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceDiff {
    pub changes: Vec<BalanceChange>,
    pub trades: Vec<TradeEvent>,
    pub update: BaselineUpdate,
}

impl BalanceDiff {
    pub fn is_dirty(&self) -> bool {
        self.update != BaselineUpdate::Unchanged
    }

    /// Replacement baseline: the whole snapshot, never just the changed assets
    pub fn new_baseline(&self, current: &PortfolioSnapshot) -> Option<BalanceState> {
        self.is_dirty().then(|| BalanceState::from_snapshot(current))
    }
}

/// Diff a snapshot against the baseline
///
/// # Arguments
/// * `baseline` - Last persisted balances
/// * `current` - Freshly fetched snapshot
/// * `prices` - Prices used for notional values, keyed by instrument
/// * `quote_currency` - Quote used to build instrument ids (`{asset}-{quote}`)
/// * `movement` - Movement-alert settings, resolved per changed asset
/// * `thresholds` - Noise floor, trade size and drift thresholds
pub fn diff_balances(
    baseline: &BalanceState,
    current: &PortfolioSnapshot,
    prices: &PriceMap,
    quote_currency: &str,
    movement: &MovementAlertSettings,
    thresholds: &DiffThresholds,
) -> BalanceDiff {
    let mut changes = Vec::new();
    let mut trades = Vec::new();

    for (asset, &amount) in &current.balances {
        if amount <= Decimal::ZERO {
            continue;
        }

        let delta = amount - baseline.amount_of(asset);
        if delta.abs() <= thresholds.noise_floor {
            continue;
        }

        let price = prices
            .get(&instrument_id(asset, quote_currency))
            .map(|tick| tick.price)
            .unwrap_or(Decimal::ZERO);
        let notional = delta.abs() * price;
        let movement_threshold = movement.threshold_for(asset);

        debug!(
            asset = %asset,
            delta = %delta,
            notional = %notional,
            movement_threshold = %movement_threshold,
            "Balance change detected"
        );

        if notional > thresholds.min_trade_notional {
            trades.push(trade_event(asset, delta, amount, price, notional, current.captured_at));
        }

        changes.push(BalanceChange {
            asset: asset.clone(),
            delta,
            new_amount: amount,
            price,
            notional,
            movement_threshold,
        });
    }

    let update = if !changes.is_empty() {
        BaselineUpdate::CompositionChanged
    } else if (baseline.total_value - current.total_value).abs() > thresholds.total_drift {
        BaselineUpdate::ValuationDrift
    } else {
        BaselineUpdate::Unchanged
    };

    BalanceDiff {
        changes,
        trades,
        update,
    }
}

fn trade_event(
    asset: &str,
    delta: Decimal,
    new_balance: Decimal,
    price: Decimal,
    notional: Decimal,
    observed_at: DateTime<Utc>,
) -> TradeEvent {
    let direction = if delta > Decimal::ZERO {
        TradeDirection::Buy
    } else {
        TradeDirection::Sell
    };

    TradeEvent {
        asset: asset.to_string(),
        direction,
        quantity: delta.abs(),
        approx_price: price,
        notional_value: notional,
        new_balance,
        observed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::PriceTick;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn baseline(entries: &[(&str, Decimal)], total: Decimal) -> BalanceState {
        BalanceState {
            balances: entries
                .iter()
                .map(|(a, v)| (a.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
            total_value: total,
        }
    }

    fn snapshot(entries: &[(&str, Decimal)], total: Decimal) -> PortfolioSnapshot {
        PortfolioSnapshot {
            balances: entries.iter().map(|(a, v)| (a.to_string(), *v)).collect(),
            total_value: total,
            captured_at: Utc::now(),
        }
    }

    fn prices(entries: &[(&str, Decimal)]) -> PriceMap {
        entries
            .iter()
            .map(|(i, p)| (i.to_string(), PriceTick::new(*p)))
            .collect()
    }

    fn run(base: &BalanceState, current: &PortfolioSnapshot, prices: &PriceMap) -> BalanceDiff {
        diff_balances(
            base,
            current,
            prices,
            "USDT",
            &MovementAlertSettings::default(),
            &DiffThresholds::default(),
        )
    }

    #[test]
    fn test_jitter_below_noise_floor_is_ignored() {
        let base = baseline(&[("BTC", dec!(1.0))], dec!(50000));
        let current = snapshot(&[("BTC", dec!(1.0000005))], dec!(50000));
        let diff = run(&base, &current, &prices(&[("BTC-USDT", dec!(50000))]));

        assert!(diff.trades.is_empty());
        assert!(diff.changes.is_empty());
        assert_eq!(diff.update, BaselineUpdate::Unchanged);
        assert!(diff.new_baseline(&current).is_none());
    }

    #[test]
    fn test_significant_buy_becomes_trade() {
        let base = baseline(&[("BTC", dec!(1.0))], dec!(50000));
        let current = snapshot(&[("BTC", dec!(1.001))], dec!(50050));
        let diff = run(&base, &current, &prices(&[("BTC-USDT", dec!(50000))]));

        assert_eq!(diff.trades.len(), 1);
        let trade = &diff.trades[0];
        assert_eq!(trade.direction, TradeDirection::Buy);
        assert_eq!(trade.quantity, dec!(0.001));
        assert_eq!(trade.notional_value, dec!(50));
        assert_eq!(trade.new_balance, dec!(1.001));

        let new_base = diff.new_baseline(&current).unwrap();
        assert_eq!(new_base.amount_of("BTC"), dec!(1.001));
        assert_eq!(new_base.total_value, dec!(50050));
    }

    #[test]
    fn test_small_notional_marks_dirty_without_trade() {
        let base = baseline(&[("DOGE", dec!(100))], dec!(10));
        let current = snapshot(&[("DOGE", dec!(105))], dec!(10.5));
        let diff = run(&base, &current, &prices(&[("DOGE-USDT", dec!(0.1))]));

        assert!(diff.trades.is_empty());
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.update, BaselineUpdate::CompositionChanged);
    }

    #[test]
    fn test_sell_direction_and_quantity() {
        let base = baseline(&[("ETH", dec!(2))], dec!(6000));
        let current = snapshot(&[("ETH", dec!(1.5))], dec!(4500));
        let diff = run(&base, &current, &prices(&[("ETH-USDT", dec!(3000))]));

        assert_eq!(diff.trades[0].direction, TradeDirection::Sell);
        assert_eq!(diff.trades[0].quantity, dec!(0.5));
        assert_eq!(diff.trades[0].notional_value, dec!(1500));
    }

    #[test]
    fn test_new_asset_diffs_against_zero() {
        let base = baseline(&[], dec!(0));
        let current = snapshot(&[("SOL", dec!(2))], dec!(300));
        let diff = run(&base, &current, &prices(&[("SOL-USDT", dec!(150))]));

        assert_eq!(diff.trades.len(), 1);
        assert_eq!(diff.trades[0].direction, TradeDirection::Buy);
    }

    #[test]
    fn test_zero_amount_assets_are_skipped() {
        let base = baseline(&[("ADA", dec!(10))], dec!(5));
        let current = snapshot(&[("ADA", dec!(0))], dec!(5));
        let diff = run(&base, &current, &prices(&[("ADA-USDT", dec!(0.5))]));

        assert!(diff.changes.is_empty());
        assert_eq!(diff.update, BaselineUpdate::Unchanged);
    }

    #[test]
    fn test_missing_price_is_dirty_but_not_a_trade() {
        let base = baseline(&[("XYZ", dec!(1))], dec!(0));
        let current = snapshot(&[("XYZ", dec!(5))], dec!(0));
        let diff = run(&base, &current, &PriceMap::new());

        assert!(diff.trades.is_empty());
        assert!(diff.is_dirty());
    }

    #[test]
    fn test_valuation_drift_refreshes_baseline() {
        let base = baseline(&[("BTC", dec!(1))], dec!(50000));
        let current = snapshot(&[("BTC", dec!(1))], dec!(50001.5));
        let diff = run(&base, &current, &prices(&[("BTC-USDT", dec!(50001.5))]));

        assert!(diff.trades.is_empty());
        assert_eq!(diff.update, BaselineUpdate::ValuationDrift);
        assert_eq!(diff.new_baseline(&current).unwrap().total_value, dec!(50001.5));
    }

    #[test]
    fn test_drift_of_exactly_one_is_not_enough() {
        let base = baseline(&[("BTC", dec!(1))], dec!(50000));
        let current = snapshot(&[("BTC", dec!(1))], dec!(50001));
        let diff = run(&base, &current, &prices(&[("BTC-USDT", dec!(50001))]));

        assert_eq!(diff.update, BaselineUpdate::Unchanged);
    }

    #[test]
    fn test_movement_threshold_resolved_per_asset() {
        let mut movement = MovementAlertSettings::default();
        movement.overrides.insert("BTC".into(), dec!(2.5));

        let base = baseline(&[("BTC", dec!(1)), ("ETH", dec!(1))], dec!(0));
        let current = snapshot(&[("BTC", dec!(2)), ("ETH", dec!(2))], dec!(0));
        let diff = diff_balances(
            &base,
            &current,
            &PriceMap::new(),
            "USDT",
            &movement,
            &DiffThresholds::default(),
        );

        let btc = diff.changes.iter().find(|c| c.asset == "BTC").unwrap();
        let eth = diff.changes.iter().find(|c| c.asset == "ETH").unwrap();
        assert_eq!(btc.movement_threshold, dec!(2.5));
        assert_eq!(eth.movement_threshold, dec!(5));
    }
}
