//! Trend summaries over valuation history and portfolio breakdowns

use rust_decimal::Decimal;

use crate::common::errors::{MonitorError, Result};
use crate::common::types::{HistoryEntry, HourlyHistoryEntry, PortfolioAsset};

/// Window used for performance statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformancePeriod {
    /// Last 24 hourly snapshots
    Day,
    /// Last 7 daily snapshots
    Week,
    /// Last 30 daily snapshots
    Month,
}

impl PerformancePeriod {
    pub fn points(&self) -> usize {
        match self {
            PerformancePeriod::Day => 24,
            PerformancePeriod::Week => 7,
            PerformancePeriod::Month => 30,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PerformancePeriod::Day => "last 24 hours",
            PerformancePeriod::Week => "last 7 days",
            PerformancePeriod::Month => "last 30 days",
        }
    }

    /// Totals for this window, oldest first
    pub fn window(&self, daily: &[HistoryEntry], hourly: &[HourlyHistoryEntry]) -> Vec<Decimal> {
        match self {
            PerformancePeriod::Day => tail(hourly, self.points()).iter().map(|e| e.total).collect(),
            _ => tail(daily, self.points()).iter().map(|e| e.total).collect(),
        }
    }
}

impl std::str::FromStr for PerformancePeriod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "24h" => Ok(PerformancePeriod::Day),
            "week" | "7d" => Ok(PerformancePeriod::Week),
            "month" | "30d" => Ok(PerformancePeriod::Month),
            other => Err(format!("unknown period '{}', use day, week or month", other)),
        }
    }
}

fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

/// Percent change from `from` to `to`, zero when `from` is zero
pub fn percent_change(from: Decimal, to: Decimal) -> Decimal {
    if from.is_zero() {
        Decimal::ZERO
    } else {
        (to - from) / from * Decimal::ONE_HUNDRED
    }
}

/// Aggregate statistics over a window of totals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceStats {
    pub start_value: Decimal,
    pub end_value: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub max_value: Decimal,
    pub min_value: Decimal,
    pub average: Decimal,
}

/// Statistics over totals ordered oldest first; `None` below two points
pub fn performance_stats(totals: &[Decimal]) -> Option<PerformanceStats> {
    let (&start_value, &end_value) = (totals.first()?, totals.last()?);
    if totals.len() < 2 {
        return None;
    }

    let max_value = totals.iter().copied().max()?;
    let min_value = totals.iter().copied().min()?;
    let average = totals.iter().sum::<Decimal>() / Decimal::from(totals.len());

    Some(PerformanceStats {
        start_value,
        end_value,
        change: end_value - start_value,
        change_percent: percent_change(start_value, end_value),
        max_value,
        min_value,
        average,
    })
}

/// Day-over-day change computed after a daily snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct DailyChange {
    pub today: HistoryEntry,
    pub change: Decimal,
    pub change_percent: Decimal,
}

/// Compare the two most recent daily entries
pub fn daily_change(history: &[HistoryEntry]) -> Option<DailyChange> {
    let [.., yesterday, today] = history else {
        return None;
    };

    Some(DailyChange {
        today: today.clone(),
        change: today.total - yesterday.total,
        change_percent: percent_change(yesterday.total, today.total),
    })
}

/// Profit and loss of the portfolio against invested capital
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitAndLoss {
    pub pnl: Decimal,
    pub pnl_percent: Decimal,
}

pub fn profit_and_loss(total: Decimal, capital: Decimal) -> ProfitAndLoss {
    ProfitAndLoss {
        pnl: total - capital,
        pnl_percent: percent_change(capital, total),
    }
}

/// Daily entries back to the reference point of the weekly comparison
const WEEKLY_LOOKBACK: usize = 7;

/// Change of the current total against the entry a week back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeeklyChange {
    pub reference: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
}

/// Compare `current` with the seventh most recent daily entry
pub fn weekly_change(history: &[HistoryEntry], current: Decimal) -> Option<WeeklyChange> {
    let reference = history.len().checked_sub(WEEKLY_LOOKBACK).map(|i| history[i].total)?;

    Some(WeeklyChange {
        reference,
        change: current - reference,
        change_percent: percent_change(reference, current),
    })
}

/// One holding with its share of the portfolio
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub asset: String,
    pub amount: Decimal,
    pub price: Decimal,
    pub value: Decimal,
    pub allocation_percent: Decimal,
}

/// How spread out the holdings are, by count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diversification {
    /// Fewer than 3 assets
    Limited,
    /// 3 or 4 assets
    Moderate,
    /// 5 or more
    Diversified,
}

impl Diversification {
    pub fn from_asset_count(count: usize) -> Self {
        match count {
            0..=2 => Diversification::Limited,
            3..=4 => Diversification::Moderate,
            _ => Diversification::Diversified,
        }
    }
}

impl std::fmt::Display for Diversification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diversification::Limited => write!(f, "limited"),
            Diversification::Moderate => write!(f, "moderate"),
            Diversification::Diversified => write!(f, "diversified"),
        }
    }
}

/// Weight of the largest holding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concentration {
    /// Largest holding above 70%
    High,
    /// Above 50%
    Medium,
    Balanced,
}

impl Concentration {
    pub fn from_share(percent: Decimal) -> Self {
        if percent > Decimal::from(70) {
            Concentration::High
        } else if percent > Decimal::from(50) {
            Concentration::Medium
        } else {
            Concentration::Balanced
        }
    }
}

impl std::fmt::Display for Concentration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Concentration::High => write!(f, "high concentration"),
            Concentration::Medium => write!(f, "medium concentration"),
            Concentration::Balanced => write!(f, "well diversified"),
        }
    }
}

/// Rating of the return on capital
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceLevel {
    Excellent,
    VeryGood,
    Positive,
    SlightDecline,
    NeedsReview,
}

impl PerformanceLevel {
    pub fn from_pnl_percent(percent: Decimal) -> Self {
        if percent > Decimal::TEN {
            PerformanceLevel::Excellent
        } else if percent > Decimal::from(5) {
            PerformanceLevel::VeryGood
        } else if percent > Decimal::ZERO {
            PerformanceLevel::Positive
        } else if percent > Decimal::from(-5) {
            PerformanceLevel::SlightDecline
        } else {
            PerformanceLevel::NeedsReview
        }
    }
}

impl std::fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerformanceLevel::Excellent => write!(f, "excellent"),
            PerformanceLevel::VeryGood => write!(f, "very good"),
            PerformanceLevel::Positive => write!(f, "positive"),
            PerformanceLevel::SlightDecline => write!(f, "slight decline"),
            PerformanceLevel::NeedsReview => write!(f, "needs review"),
        }
    }
}

/// Holdings ranked by value plus return on capital
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioOverview {
    /// Largest value first
    pub holdings: Vec<Holding>,
    pub total: Decimal,
    pub capital: Decimal,
    pub pnl: ProfitAndLoss,
}

impl PortfolioOverview {
    pub fn new(assets: &[PortfolioAsset], total: Decimal, capital: Decimal) -> Self {
        let mut holdings: Vec<Holding> = assets
            .iter()
            .map(|a| Holding {
                asset: a.asset.clone(),
                amount: a.amount,
                price: a.price,
                value: a.value,
                allocation_percent: share_of(a.value, total),
            })
            .collect();
        holdings.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.asset.cmp(&b.asset)));

        Self {
            holdings,
            total,
            capital,
            pnl: profit_and_loss(total, capital),
        }
    }

    pub fn largest(&self) -> Option<&Holding> {
        self.holdings.first()
    }

    /// The `n` largest holdings
    pub fn top(&self, n: usize) -> &[Holding] {
        &self.holdings[..n.min(self.holdings.len())]
    }

    pub fn diversification(&self) -> Diversification {
        Diversification::from_asset_count(self.holdings.len())
    }

    /// Share of the largest holding in percent, zero for an empty portfolio
    pub fn largest_share(&self) -> Decimal {
        self.largest()
            .map(|h| share_of(h.value, self.total))
            .unwrap_or(Decimal::ZERO)
    }

    pub fn concentration(&self) -> Concentration {
        Concentration::from_share(self.largest_share())
    }

    pub fn performance_level(&self) -> PerformanceLevel {
        PerformanceLevel::from_pnl_percent(self.pnl.pnl_percent)
    }
}

fn share_of(value: Decimal, total: Decimal) -> Decimal {
    if total > Decimal::ZERO {
        value / total * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

/// Profit of buying and selling a quantity at two prices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeCalculation {
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub quantity: Decimal,
    pub investment: Decimal,
    pub sale_value: Decimal,
    pub profit: Decimal,
    pub profit_percent: Decimal,
}

/// Profit and loss of a hypothetical trade; every input must be positive
pub fn trade_calculation(
    buy_price: Decimal,
    sell_price: Decimal,
    quantity: Decimal,
) -> Result<TradeCalculation> {
    let inputs = [("buy price", buy_price), ("sell price", sell_price), ("quantity", quantity)];
    for (name, value) in inputs {
        if value <= Decimal::ZERO {
            return Err(MonitorError::InvalidInput(format!(
                "{} must be positive, got {}",
                name, value
            )));
        }
    }

    let investment = buy_price * quantity;
    let sale_value = sell_price * quantity;

    Ok(TradeCalculation {
        buy_price,
        sell_price,
        quantity,
        investment,
        sale_value,
        profit: sale_value - investment,
        profit_percent: percent_change(investment, sale_value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn daily(totals: &[Decimal]) -> Vec<HistoryEntry> {
        let start = Utc::now() - Duration::days(totals.len() as i64);
        totals
            .iter()
            .enumerate()
            .map(|(i, t)| HistoryEntry::new(*t, start + Duration::days(i as i64)))
            .collect()
    }

    #[test]
    fn test_performance_stats() {
        let stats = performance_stats(&[dec!(100), dec!(120), dec!(90), dec!(110)]).unwrap();
        assert_eq!(stats.change, dec!(10));
        assert_eq!(stats.change_percent, dec!(10));
        assert_eq!(stats.max_value, dec!(120));
        assert_eq!(stats.min_value, dec!(90));
        assert_eq!(stats.average, dec!(105));
    }

    #[test]
    fn test_performance_stats_needs_two_points() {
        assert!(performance_stats(&[]).is_none());
        assert!(performance_stats(&[dec!(1)]).is_none());
    }

    #[test]
    fn test_week_window_takes_last_seven() {
        let history = daily(&(1..=10).map(Decimal::from).collect::<Vec<_>>());
        let window = PerformancePeriod::Week.window(&history, &[]);
        assert_eq!(window.len(), 7);
        assert_eq!(window[0], dec!(4));
        assert_eq!(window[6], dec!(10));
    }

    #[test]
    fn test_daily_change() {
        assert!(daily_change(&daily(&[dec!(100)])).is_none());

        let change = daily_change(&daily(&[dec!(80), dec!(100), dec!(95)])).unwrap();
        assert_eq!(change.change, dec!(-5));
        assert_eq!(change.change_percent, dec!(-5));
        assert_eq!(change.today.total, dec!(95));
    }

    #[test]
    fn test_daily_change_from_zero() {
        let change = daily_change(&daily(&[dec!(0), dec!(50)])).unwrap();
        assert_eq!(change.change_percent, Decimal::ZERO);
    }

    #[test]
    fn test_profit_and_loss() {
        let pnl = profit_and_loss(dec!(1200), dec!(1000));
        assert_eq!(pnl.pnl, dec!(200));
        assert_eq!(pnl.pnl_percent, dec!(20));
        assert_eq!(profit_and_loss(dec!(50), Decimal::ZERO).pnl_percent, Decimal::ZERO);
    }

    fn asset(name: &str, amount: Decimal, price: Decimal) -> PortfolioAsset {
        PortfolioAsset {
            asset: name.to_string(),
            amount,
            price,
            value: amount * price,
        }
    }

    #[test]
    fn test_overview_ranks_holdings_by_value() {
        let assets = vec![
            asset("USDT", dec!(250), dec!(1)),
            asset("BTC", dec!(0.01), dec!(50000)),
            asset("ETH", dec!(0.05), dec!(3000)),
        ];
        let overview = PortfolioOverview::new(&assets, dec!(900), dec!(1000));

        let order: Vec<&str> = overview.holdings.iter().map(|h| h.asset.as_str()).collect();
        assert_eq!(order, vec!["BTC", "USDT", "ETH"]);
        assert_eq!(overview.holdings[0].allocation_percent.round_dp(2), dec!(55.56));
        assert_eq!(overview.largest().unwrap().asset, "BTC");
        assert_eq!(overview.top(2).len(), 2);
        assert_eq!(overview.top(5).len(), 3);
        assert_eq!(overview.diversification(), Diversification::Moderate);
        assert_eq!(overview.concentration(), Concentration::Medium);
        assert_eq!(overview.pnl.pnl, dec!(-100));
        assert_eq!(overview.performance_level(), PerformanceLevel::NeedsReview);
    }

    #[test]
    fn test_empty_overview() {
        let overview = PortfolioOverview::new(&[], Decimal::ZERO, Decimal::ZERO);
        assert!(overview.largest().is_none());
        assert!(overview.top(5).is_empty());
        assert_eq!(overview.largest_share(), Decimal::ZERO);
        assert_eq!(overview.diversification(), Diversification::Limited);
        assert_eq!(overview.concentration(), Concentration::Balanced);
    }

    #[test]
    fn test_rating_thresholds() {
        assert_eq!(Concentration::from_share(dec!(70.1)), Concentration::High);
        assert_eq!(Concentration::from_share(dec!(70)), Concentration::Medium);
        assert_eq!(Concentration::from_share(dec!(50)), Concentration::Balanced);
        assert_eq!(PerformanceLevel::from_pnl_percent(dec!(10)), PerformanceLevel::VeryGood);
        assert_eq!(PerformanceLevel::from_pnl_percent(dec!(0)), PerformanceLevel::SlightDecline);
        assert_eq!(PerformanceLevel::from_pnl_percent(dec!(-5)), PerformanceLevel::NeedsReview);
        assert_eq!(Diversification::from_asset_count(5), Diversification::Diversified);
    }

    #[test]
    fn test_weekly_change_uses_seventh_latest_entry() {
        let short = daily(&[dec!(1), dec!(2), dec!(3), dec!(4), dec!(5), dec!(6)]);
        assert!(weekly_change(&short, dec!(10)).is_none());

        let history = daily(&(1..=8).map(|i| Decimal::from(i * 100)).collect::<Vec<_>>());
        let change = weekly_change(&history, dec!(1000)).unwrap();
        assert_eq!(change.reference, dec!(200));
        assert_eq!(change.change, dec!(800));
        assert_eq!(change.change_percent, dec!(400));
    }

    #[test]
    fn test_trade_calculation() {
        let calc = trade_calculation(dec!(45000), dec!(50000), dec!(0.1)).unwrap();
        assert_eq!(calc.investment, dec!(4500));
        assert_eq!(calc.sale_value, dec!(5000));
        assert_eq!(calc.profit, dec!(500));
        assert_eq!(calc.profit_percent.round_dp(4), dec!(11.1111));

        let loss = trade_calculation(dec!(3500), dec!(3000), dec!(2)).unwrap();
        assert_eq!(loss.profit, dec!(-1000));
    }

    #[test]
    fn test_trade_calculation_rejects_non_positive_input() {
        let err = tokio_test::assert_err!(trade_calculation(dec!(0), dec!(1), dec!(1)));
        assert!(matches!(err, MonitorError::InvalidInput(_)));
        assert!(trade_calculation(dec!(1), dec!(-1), dec!(1)).is_err());
        assert!(trade_calculation(dec!(1), dec!(1), dec!(0)).is_err());
    }

    #[test]
    fn test_parse_period() {
        assert_eq!("7d".parse::<PerformancePeriod>(), Ok(PerformancePeriod::Week));
        assert_eq!("Month".parse::<PerformancePeriod>(), Ok(PerformancePeriod::Month));
        assert!("year".parse::<PerformancePeriod>().is_err());
    }
}
