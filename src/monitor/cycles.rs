//! The four monitoring cycles
//!
//! Each cycle runs fetch, compute, persist, notify in that order. Any fetch
//! or compute failure returns early, before anything is written or sent.
//! Notification failures are logged and never fail the cycle.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::common::errors::Result;
use crate::common::traits::{MarketDataProvider, MonitorStore, NotificationSink};
use crate::common::types::{
    HistoryEntry, HourlyHistoryEntry, PortfolioSnapshot, PriceMap, Settings, TradeEvent,
};
use crate::config::types::{AppConfig, NotificationConfig};
use crate::monitor::alerts::evaluate_alerts;
use crate::monitor::balance_diff::{diff_balances, BaselineUpdate, DiffThresholds};
use crate::monitor::indicators::{technical_analysis, TechnicalAnalysis};
use crate::monitor::messages;
use crate::monitor::retention::prune_hourly;
use crate::monitor::summary::{
    daily_change, performance_stats, profit_and_loss, weekly_change, PerformancePeriod,
    PerformanceStats, PortfolioOverview, ProfitAndLoss, WeeklyChange,
};

/// What a completed cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    Balance {
        changes: usize,
        trades: usize,
        baseline: BaselineUpdate,
    },
    Alerts {
        checked: usize,
        triggered: usize,
    },
    Hourly {
        total: Decimal,
        retained: usize,
        pruned: usize,
    },
    Daily {
        total: Decimal,
        summary_sent: bool,
    },
}

/// Monitoring core wired to its collaborators
pub struct Monitor {
    provider: Arc<dyn MarketDataProvider>,
    store: Arc<dyn MonitorStore>,
    notifier: Arc<dyn NotificationSink>,
    quote_currency: String,
    thresholds: DiffThresholds,
    hourly_retention: chrono::Duration,
    analysis_candles: usize,
    routing: NotificationConfig,
}

impl Monitor {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<dyn MonitorStore>,
        notifier: Arc<dyn NotificationSink>,
        config: &AppConfig,
    ) -> Self {
        Self {
            provider,
            store,
            notifier,
            quote_currency: config.okx.quote_currency.clone(),
            thresholds: DiffThresholds::from(&config.monitor),
            hourly_retention: chrono::Duration::hours(config.monitor.hourly_retention_hours),
            analysis_candles: config.monitor.analysis_candles,
            routing: config.notifications.clone(),
        }
    }

    pub fn store(&self) -> &dyn MonitorStore {
        self.store.as_ref()
    }

    /// Prices and a portfolio snapshot valued with them
    async fn fetch_snapshot(&self) -> Result<(PriceMap, PortfolioSnapshot)> {
        let prices = self.provider.get_market_prices().await?;
        let report = self.provider.get_portfolio(&prices).await?;
        let snapshot = report.into_snapshot(Utc::now())?;
        Ok((prices, snapshot))
    }

    /// Diff the portfolio against the baseline and announce inferred trades
    #[instrument(skip(self))]
    pub async fn run_balance_cycle(&self) -> Result<CycleReport> {
        let (prices, snapshot) = self.fetch_snapshot().await?;
        let baseline = self.store.load_balance_state().await?;
        let movement = self.store.load_alert_settings().await?;
        let settings = self.store.load_settings().await?;

        let diff = diff_balances(
            &baseline,
            &snapshot,
            &prices,
            &self.quote_currency,
            &movement,
            &self.thresholds,
        );

        if let Some(new_baseline) = diff.new_baseline(&snapshot) {
            self.store.save_balance_state(&new_baseline).await?;
            info!(
                reason = ?diff.update,
                total = %new_baseline.total_value,
                "Baseline updated"
            );
        }

        for trade in &diff.trades {
            info!(
                asset = %trade.asset,
                direction = %trade.direction,
                quantity = %trade.quantity,
                notional = %trade.notional_value,
                "Trade detected"
            );
            self.announce_trade(trade, &settings).await;
        }

        if settings.debug_mode {
            for change in &diff.changes {
                self.notify(&self.routing.owner_id, &messages::balance_change(change))
                    .await;
            }
        }

        Ok(CycleReport::Balance {
            changes: diff.changes.len(),
            trades: diff.trades.len(),
            baseline: diff.update,
        })
    }

    /// Check one-shot price alerts against a single price map
    #[instrument(skip(self))]
    pub async fn run_alert_cycle(&self) -> Result<CycleReport> {
        let alerts = self.store.load_alerts().await?;
        if alerts.is_empty() {
            debug!("No active alerts");
            return Ok(CycleReport::Alerts {
                checked: 0,
                triggered: 0,
            });
        }

        let checked = alerts.len();
        let prices = self.provider.get_market_prices().await?;
        let evaluation = evaluate_alerts(alerts, &prices, Utc::now());

        if evaluation.any_triggered() {
            self.store.replace_alerts(&evaluation.remaining).await?;
        }

        for trigger in &evaluation.triggered {
            info!(
                id = %trigger.alert.id,
                instrument = %trigger.alert.instrument,
                price = %trigger.current_price,
                "Alert triggered"
            );
            self.notify(&self.routing.owner_id, &messages::alert_triggered(trigger))
                .await;
        }

        Ok(CycleReport::Alerts {
            checked,
            triggered: evaluation.triggered.len(),
        })
    }

    /// Record the current total and prune hourly history to its window
    #[instrument(skip(self))]
    pub async fn run_hourly_cycle(&self) -> Result<CycleReport> {
        let (_, snapshot) = self.fetch_snapshot().await?;
        let entry = HourlyHistoryEntry::new(snapshot.total_value, snapshot.captured_at);
        self.store.append_hourly_history(&entry).await?;

        let entries = self.store.load_hourly_history().await?;
        let before = entries.len();
        let retained = prune_hourly(entries, Utc::now(), self.hourly_retention);
        let pruned = before - retained.len();

        if pruned > 0 {
            self.store.replace_hourly_history(&retained).await?;
            debug!(pruned, "Pruned hourly history");
        }

        Ok(CycleReport::Hourly {
            total: snapshot.total_value,
            retained: retained.len(),
            pruned,
        })
    }

    /// Record the daily total and send the day-over-day summary if enabled
    #[instrument(skip(self))]
    pub async fn run_daily_cycle(&self) -> Result<CycleReport> {
        let (_, snapshot) = self.fetch_snapshot().await?;
        let entry = HistoryEntry::new(snapshot.total_value, snapshot.captured_at);
        self.store.append_history(&entry).await?;
        info!(date = %entry.date, total = %entry.total, "Daily snapshot recorded");

        let settings = self.store.load_settings().await?;
        let mut summary_sent = false;

        if settings.daily_summary {
            let history = self.store.load_history().await?;
            if let Some(change) = daily_change(&history) {
                let capital = self.store.load_capital().await?;
                let pnl = profit_and_loss(change.today.total, capital);
                let text = format!(
                    "{}\n\n{}",
                    messages::daily_summary(&change),
                    messages::profit_and_loss(change.today.total, capital, &pnl)
                );
                self.notify(&self.routing.owner_id, &text).await;
                summary_sent = true;
            }
        }

        Ok(CycleReport::Daily {
            total: snapshot.total_value,
            summary_sent,
        })
    }

    /// RSI and moving averages for one instrument
    pub async fn analyze(&self, instrument: &str) -> Result<TechnicalAnalysis> {
        technical_analysis(self.provider.as_ref(), instrument, self.analysis_candles).await
    }

    /// Statistics over stored history for a period
    pub async fn performance(&self, period: PerformancePeriod) -> Result<Option<PerformanceStats>> {
        let daily = self.store.load_history().await?;
        let hourly = self.store.load_hourly_history().await?;
        Ok(performance_stats(&period.window(&daily, &hourly)))
    }

    /// Current total, capital and the profit between them
    pub async fn profit_and_loss(&self) -> Result<(Decimal, Decimal, ProfitAndLoss)> {
        let (_, snapshot) = self.fetch_snapshot().await?;
        let capital = self.store.load_capital().await?;
        let pnl = profit_and_loss(snapshot.total_value, capital);
        Ok((snapshot.total_value, capital, pnl))
    }

    /// Holdings ranked by value, valued against invested capital
    pub async fn portfolio_overview(&self) -> Result<PortfolioOverview> {
        let prices = self.provider.get_market_prices().await?;
        let report = self.provider.get_portfolio(&prices).await?.ensure_ok()?;
        let capital = self.store.load_capital().await?;
        Ok(PortfolioOverview::new(&report.assets, report.total, capital))
    }

    /// Overview plus the change against the daily entry a week back
    pub async fn advanced_stats(&self) -> Result<(PortfolioOverview, Option<WeeklyChange>)> {
        let overview = self.portfolio_overview().await?;
        let history = self.store.load_history().await?;
        let weekly = weekly_change(&history, overview.total);
        Ok((overview, weekly))
    }

    async fn announce_trade(&self, trade: &TradeEvent, settings: &Settings) {
        match (&self.routing.channel_id, settings.auto_post_to_channel) {
            (Some(channel), true) => self.notify(channel, &messages::trade(trade)).await,
            _ => {
                self.notify(&self.routing.owner_id, &messages::trade_with_publish_prompt(trade))
                    .await
            }
        }
    }

    async fn notify(&self, recipient: &str, text: &str) {
        if let Err(e) = self.notifier.send(recipient, text).await {
            warn!(recipient, error = %e, "Notification not sent");
        }
    }
}
