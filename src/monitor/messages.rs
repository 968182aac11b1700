//! Plain-text rendering of notifications

use rust_decimal::Decimal;

use crate::common::types::{PriceAlert, TradeDirection, TradeEvent};
use crate::monitor::alerts::AlertTrigger;
use crate::monitor::balance_diff::BalanceChange;
use crate::monitor::indicators::{InsufficientData, TechnicalAnalysis};
use crate::monitor::summary::{
    DailyChange, PerformancePeriod, PerformanceStats, PortfolioOverview, ProfitAndLoss,
    TradeCalculation, WeeklyChange,
};

/// Holdings shown by the top-assets view
pub const TOP_ASSETS: usize = 5;

/// Round for display: 2 dp for fiat-like values, trailing zeros removed
pub fn usd(value: Decimal) -> String {
    format!("${}", value.round_dp(2).normalize())
}

fn amount(value: Decimal) -> String {
    value.round_dp(8).normalize().to_string()
}

fn price(value: Decimal) -> String {
    format!("${}", value.round_dp(4).normalize())
}

fn share(value: Decimal) -> String {
    format!("{}%", value.round_dp(1).normalize())
}

fn signed_percent(value: Decimal) -> String {
    let rounded = value.round_dp(2).normalize();
    if rounded > Decimal::ZERO {
        format!("+{}%", rounded)
    } else {
        format!("{}%", rounded)
    }
}

pub fn trade(event: &TradeEvent) -> String {
    let verb = match event.direction {
        TradeDirection::Buy => "BUY",
        TradeDirection::Sell => "SELL",
    };
    format!(
        "{} {} {} @ ~{} (≈{})\nNew balance: {} {}",
        verb,
        amount(event.quantity),
        event.asset,
        usd(event.approx_price),
        usd(event.notional_value),
        amount(event.new_balance),
        event.asset,
    )
}

/// Same trade with a hint that it can be published to the channel
pub fn trade_with_publish_prompt(event: &TradeEvent) -> String {
    format!("{}\n\nAuto-post is off; forward this to the channel to publish it.", trade(event))
}

pub fn alert_triggered(trigger: &AlertTrigger) -> String {
    format!(
        "Price alert: {} is {} {} (now {})",
        trigger.alert.instrument,
        trigger.alert.condition,
        usd(trigger.alert.target_price),
        usd(trigger.current_price),
    )
}

/// Compact form used when listing alerts, e.g. `BTC-USDT > 50000`
pub fn alert_line(alert: &PriceAlert) -> String {
    format!(
        "{} {} {}",
        alert.instrument,
        alert.condition.symbol(),
        alert.target_price.normalize()
    )
}

pub fn alert_list(alerts: &[PriceAlert]) -> String {
    if alerts.is_empty() {
        return "No active alerts".to_string();
    }
    alerts
        .iter()
        .enumerate()
        .map(|(i, a)| format!("{}. {}", i + 1, alert_line(a)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn balance_change(change: &BalanceChange) -> String {
    format!(
        "[debug] {} changed by {} (now {}, ≈{}, movement threshold {}%)",
        change.asset,
        amount(change.delta),
        amount(change.new_amount),
        usd(change.notional),
        change.movement_threshold.normalize(),
    )
}

pub fn daily_summary(change: &DailyChange) -> String {
    format!(
        "Daily summary {}\nTotal: {}\nChange: {} ({})",
        change.today.date,
        usd(change.today.total),
        usd(change.change),
        signed_percent(change.change_percent),
    )
}

pub fn performance(period: PerformancePeriod, stats: Option<&PerformanceStats>) -> String {
    match stats {
        None => format!("Not enough history for the {}", period.label()),
        Some(s) => format!(
            "Performance, {}\nStart: {}\nEnd: {}\nChange: {} ({})\nHigh: {}\nLow: {}\nAverage: {}",
            period.label(),
            usd(s.start_value),
            usd(s.end_value),
            usd(s.change),
            signed_percent(s.change_percent),
            usd(s.max_value),
            usd(s.min_value),
            usd(s.average),
        ),
    }
}

pub fn profit_and_loss(total: Decimal, capital: Decimal, pnl: &ProfitAndLoss) -> String {
    format!(
        "Portfolio: {}\nCapital: {}\nPnL: {} ({})",
        usd(total),
        usd(capital),
        usd(pnl.pnl),
        signed_percent(pnl.pnl_percent),
    )
}

/// Full report: summary, ratings and every holding by value
pub fn portfolio(overview: &PortfolioOverview) -> String {
    let mut lines = vec![
        format!("Total: {}", usd(overview.total)),
        format!("Capital: {}", usd(overview.capital)),
        format!(
            "PnL: {} ({})",
            usd(overview.pnl.pnl),
            signed_percent(overview.pnl.pnl_percent)
        ),
        format!("Performance: {}", overview.performance_level()),
        format!("Assets: {}", overview.holdings.len()),
    ];

    if let Some(largest) = overview.largest() {
        lines.push(format!("Largest: {} ({})", largest.asset, usd(largest.value)));
    }
    lines.push(format!("Diversification: {}", overview.diversification()));

    for (rank, holding) in overview.holdings.iter().enumerate() {
        lines.push(format!(
            "\n#{} {}\n  Amount: {}\n  Price: {}\n  Value: {}\n  Share: {}",
            rank + 1,
            holding.asset,
            amount(holding.amount),
            price(holding.price),
            usd(holding.value),
            share(holding.allocation_percent),
        ));
    }

    lines.join("\n")
}

pub fn top_assets(overview: &PortfolioOverview) -> String {
    if overview.holdings.is_empty() {
        return "No assets in the portfolio".to_string();
    }

    let lines: Vec<String> = overview
        .top(TOP_ASSETS)
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{}. {}: {} @ {}", i + 1, h.asset, usd(h.value), price(h.price)))
        .collect();
    format!("Top {} assets\n{}", lines.len(), lines.join("\n"))
}

pub fn quick_stats(overview: &PortfolioOverview) -> String {
    let status = if overview.pnl.pnl >= Decimal::ZERO {
        "profit"
    } else {
        "loss"
    };
    format!(
        "Assets: {}\nValue: {}\nPnL: {} ({})",
        overview.holdings.len(),
        usd(overview.total),
        signed_percent(overview.pnl.pnl_percent),
        status,
    )
}

/// Concentration, week-over-week change and the three largest holdings
pub fn advanced_stats(overview: &PortfolioOverview, weekly: Option<&WeeklyChange>) -> String {
    let mut lines = vec![
        format!("Largest asset share: {}", share(overview.largest_share())),
        format!("Concentration: {}", overview.concentration()),
    ];

    if let Some(week) = weekly {
        lines.push(format!(
            "Past week: {} ({})",
            usd(week.change),
            signed_percent(week.change_percent)
        ));
    }

    for (i, holding) in overview.top(3).iter().enumerate() {
        lines.push(format!(
            "{}. {}: {} ({})",
            i + 1,
            holding.asset,
            share(holding.allocation_percent),
            usd(holding.value),
        ));
    }

    lines.join("\n")
}

pub fn trade_calculation(calc: &TradeCalculation) -> String {
    let outcome = match calc.profit.cmp(&Decimal::ZERO) {
        std::cmp::Ordering::Greater => "Profit",
        std::cmp::Ordering::Equal => "Break-even",
        std::cmp::Ordering::Less => "Loss",
    };
    format!(
        "Buy: {}\nSell: {}\nQuantity: {}\nInvested: {}\nSale value: {}\nResult: {} {} ({})",
        price(calc.buy_price),
        price(calc.sell_price),
        amount(calc.quantity),
        usd(calc.investment),
        usd(calc.sale_value),
        outcome,
        usd(calc.profit),
        signed_percent(calc.profit_percent),
    )
}

pub fn analysis(instrument: &str, result: &TechnicalAnalysis) -> String {
    match result {
        TechnicalAnalysis::Complete(a) => {
            let fmt = |v: Option<Decimal>| {
                v.map(|d| d.round_dp(2).normalize().to_string())
                    .unwrap_or_else(|| "n/a".to_string())
            };
            format!(
                "{}\nRSI(14): {}\nSMA(20): {}\nSMA(50): {}",
                instrument,
                fmt(a.rsi),
                fmt(a.sma20),
                fmt(a.sma50),
            )
        }
        TechnicalAnalysis::InsufficientData(InsufficientData { required, available }) => format!(
            "{}: not enough candles for analysis ({} of {})",
            instrument, available, required
        ),
    }
}
