//! Portfolio monitoring core
//!
//! Pure engines (indicators, balance diff, alert evaluation, retention,
//! summaries) plus the cycles and scheduler that drive them against the
//! market data, store and notification collaborators.

pub mod alerts;
pub mod balance_diff;
pub mod cycles;
pub mod indicators;
pub mod messages;
pub mod retention;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod summary;

pub use alerts::{evaluate_alerts, parse_alert, AlertEvaluation, AlertTrigger};
pub use balance_diff::{diff_balances, BalanceChange, BalanceDiff, BaselineUpdate, DiffThresholds};
pub use cycles::{CycleReport, Monitor};
pub use indicators::{
    analyze_closes, moving_average, relative_strength, technical_analysis, InsufficientData,
    TechnicalAnalysis,
};
pub use retention::prune_hourly;
pub use scheduler::{CycleGuard, Scheduler};
pub use session::{PendingInput, SessionRegistry};
pub use summary::{
    performance_stats, trade_calculation, PerformancePeriod, PerformanceStats, PortfolioOverview,
    TradeCalculation,
};
