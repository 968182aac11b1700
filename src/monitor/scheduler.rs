//! Periodic drivers for the monitoring cycles
//!
//! Every task owns a ticker and a [`CycleGuard`]. A tick that finds the
//! previous cycle still running is dropped, not queued. Cycles run on their
//! own spawned task so a slow fetch never delays any ticker.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::common::errors::Result;
use crate::config::types::ScheduleConfig;
use crate::monitor::cycles::{CycleReport, Monitor};

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

/// Per-task mutual exclusion flag
#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    busy: Arc<AtomicBool>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard unless a cycle already holds it
    pub fn try_acquire(&self) -> Option<CyclePermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CyclePermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases its guard on drop
#[derive(Debug)]
pub struct CyclePermit {
    busy: Arc<AtomicBool>,
}

impl Drop for CyclePermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Time until the next multiple of `period_secs` since the Unix epoch
fn delay_until_boundary(now: DateTime<Utc>, period_secs: i64) -> Duration {
    let remaining = period_secs - now.timestamp().rem_euclid(period_secs);
    Duration::from_secs(remaining as u64)
        .saturating_sub(Duration::from_millis(u64::from(now.timestamp_subsec_millis())))
}

/// Delay until the next top of the hour
pub fn delay_until_next_hour(now: DateTime<Utc>) -> Duration {
    delay_until_boundary(now, SECONDS_PER_HOUR)
}

/// Delay until the next UTC midnight
pub fn delay_until_next_midnight(now: DateTime<Utc>) -> Duration {
    delay_until_boundary(now, SECONDS_PER_DAY)
}

/// First-tick delays for the hourly and daily snapshot tasks
///
/// Snapshots never fire at boot, so a restart cannot record a second entry
/// for the same hour or day. Unaligned tasks wait one full period.
pub fn snapshot_delays(schedule: &ScheduleConfig, now: DateTime<Utc>) -> (Duration, Duration) {
    if schedule.align_to_calendar {
        (delay_until_next_hour(now), delay_until_next_midnight(now))
    } else {
        (
            Duration::from_secs(schedule.hourly_interval_seconds),
            Duration::from_secs(schedule.daily_interval_seconds),
        )
    }
}

/// Run `cycle` every `period` after `first_delay` until shutdown is signalled
///
/// A tick that cannot acquire the task's guard is skipped.
pub fn spawn_periodic<F, Fut>(
    task: &'static str,
    period: Duration,
    first_delay: Duration,
    mut shutdown: watch::Receiver<bool>,
    cycle: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<CycleReport>> + Send + 'static,
{
    tokio::spawn(async move {
        let guard = CycleGuard::new();
        let mut ticker = interval_at(Instant::now() + first_delay, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(task, period_secs = period.as_secs_f64(), "Task scheduled");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let Some(permit) = guard.try_acquire() else {
                debug!(task, "Previous cycle still running, skipping tick");
                continue;
            };

            let run = cycle();
            tokio::spawn(async move {
                let _permit = permit;
                match run.await {
                    Ok(report) => debug!(task, ?report, "Cycle complete"),
                    Err(e) if e.is_transient() => warn!(task, error = %e, "Cycle skipped"),
                    Err(e) => error!(task, error = %e, "Cycle failed"),
                }
            });
        }

        info!(task, "Task stopped");
    })
}

/// Drives the balance, alert, hourly and daily cycles
pub struct Scheduler {
    monitor: Arc<Monitor>,
    schedule: ScheduleConfig,
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(monitor: Arc<Monitor>, schedule: ScheduleConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            monitor,
            schedule,
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    /// Spawn the four periodic tasks
    pub fn start(&mut self) {
        let (hourly_delay, daily_delay) = snapshot_delays(&self.schedule, Utc::now());

        let monitor = Arc::clone(&self.monitor);
        self.handles.push(spawn_periodic(
            "balance",
            Duration::from_secs(self.schedule.balance_interval_seconds),
            Duration::ZERO,
            self.shutdown_tx.subscribe(),
            move || {
                let monitor = Arc::clone(&monitor);
                async move { monitor.run_balance_cycle().await }
            },
        ));

        let monitor = Arc::clone(&self.monitor);
        self.handles.push(spawn_periodic(
            "alerts",
            Duration::from_secs(self.schedule.alert_interval_seconds),
            Duration::ZERO,
            self.shutdown_tx.subscribe(),
            move || {
                let monitor = Arc::clone(&monitor);
                async move { monitor.run_alert_cycle().await }
            },
        ));

        let monitor = Arc::clone(&self.monitor);
        self.handles.push(spawn_periodic(
            "hourly",
            Duration::from_secs(self.schedule.hourly_interval_seconds),
            hourly_delay,
            self.shutdown_tx.subscribe(),
            move || {
                let monitor = Arc::clone(&monitor);
                async move { monitor.run_hourly_cycle().await }
            },
        ));

        let monitor = Arc::clone(&self.monitor);
        self.handles.push(spawn_periodic(
            "daily",
            Duration::from_secs(self.schedule.daily_interval_seconds),
            daily_delay,
            self.shutdown_tx.subscribe(),
            move || {
                let monitor = Arc::clone(&monitor);
                async move { monitor.run_daily_cycle().await }
            },
        ));

        info!(
            align_to_calendar = self.schedule.align_to_calendar,
            "Scheduler started"
        );
    }

    /// Ask every task loop to exit after its current tick
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Wait for the task loops to exit; in-flight cycles are not awaited
    pub async fn join(self) {
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                error!(error = %e, "Scheduler task panicked");
            }
        }
    }
}
