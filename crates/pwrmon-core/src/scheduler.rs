//! ---
//! pwrmon_section: "01-core-functionality"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Periodic update tickers driving the dashboard store."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use pwrmon_common::config::ScheduleConfig;
use pwrmon_common::time::wall_clock_now;
use pwrmon_logging::{log_system_event, pm_debug, LogContext, SystemEventOutcome};
use pwrmon_rt::{RateLimiter, TaskGroup};
use pwrmon_sim::{RandomSource, SampleGenerator, SeededSource};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::store::{SharedDashboard, TickKind};

type BoxedSource = Box<dyn RandomSource + Send>;

/// One independent random source per ticker.
pub struct TickerSources {
    pub fast: BoxedSource,
    pub history: BoxedSource,
    pub log: BoxedSource,
}

impl TickerSources {
    /// Derive three sources from one seed, or from entropy when `None`.
    pub fn seeded(seed: Option<u64>) -> Self {
        let derive = |offset: u64| -> BoxedSource {
            Box::new(SeededSource::from_option(
                seed.map(|seed| seed.wrapping_add(offset)),
            ))
        };
        Self {
            fast: derive(1),
            history: derive(2),
            log: derive(3),
        }
    }

    fn take(self) -> [(TickKind, BoxedSource); 3] {
        [
            (TickKind::Fast, self.fast),
            (TickKind::History, self.history),
            (TickKind::Log, self.log),
        ]
    }
}

impl std::fmt::Debug for TickerSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickerSources").finish_non_exhaustive()
    }
}

/// Apply one tick to the shared dashboard. Returns `false` once it is closed.
pub fn run_tick<R: RandomSource>(
    dashboard: &SharedDashboard,
    kind: TickKind,
    generator: &mut SampleGenerator<R>,
    now: DateTime<Local>,
) -> bool {
    dashboard.lock().apply(kind, generator, now)
}

/// Starts the fast, history and log tickers against one dashboard.
#[derive(Debug)]
pub struct UpdateScheduler {
    dashboard: SharedDashboard,
    schedule: ScheduleConfig,
}

impl UpdateScheduler {
    pub fn new(dashboard: SharedDashboard, schedule: ScheduleConfig) -> Self {
        Self {
            dashboard,
            schedule,
        }
    }

    fn period(&self, kind: TickKind) -> Duration {
        match kind {
            TickKind::Fast => self.schedule.fast_tick,
            TickKind::History => self.schedule.history_tick,
            TickKind::Log => self.schedule.log_tick,
        }
    }

    /// Spawn all three tickers. Must be called within a tokio runtime.
    pub fn start(self, sources: TickerSources) -> Result<SchedulerHandle> {
        if self.dashboard.lock().is_closed() {
            return Err(anyhow!("cannot start tickers on a closed dashboard"));
        }
        let (shutdown_tx, _) = broadcast::channel(4);
        let mut tasks = TaskGroup::default();
        for (kind, source) in sources.take() {
            let period = self.period(kind);
            let dashboard = self.dashboard.clone();
            let shutdown_rx = shutdown_tx.subscribe();
            tasks.spawn(
                kind.as_str(),
                run_ticker(kind, period, dashboard, SampleGenerator::new(source), shutdown_rx),
            );
        }
        log_system_event(
            None,
            "scheduler.start",
            "dashboard tickers running",
            SystemEventOutcome::Success,
        );
        info!(
            fast_ms = self.schedule.fast_tick.as_millis() as u64,
            history_ms = self.schedule.history_tick.as_millis() as u64,
            log_ms = self.schedule.log_tick.as_millis() as u64,
            "update scheduler started"
        );
        Ok(SchedulerHandle {
            shutdown: shutdown_tx,
            tasks,
            dashboard: self.dashboard,
            schedule: self.schedule,
        })
    }
}

/// Lifecycle handle for the running tickers.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: broadcast::Sender<()>,
    tasks: TaskGroup,
    dashboard: SharedDashboard,
    schedule: ScheduleConfig,
}

impl SchedulerHandle {
    pub fn dashboard(&self) -> &SharedDashboard {
        &self.dashboard
    }

    /// Stop the tickers but keep the dashboard open so a new scheduler can start.
    pub async fn stop(self) -> Result<UpdateScheduler> {
        let _ = self.shutdown.send(());
        self.tasks.join().await?;
        debug!("update scheduler stopped");
        Ok(UpdateScheduler::new(self.dashboard, self.schedule))
    }

    /// Tear down: close the dashboard, stop every ticker and wait for them.
    pub async fn shutdown(self) -> Result<()> {
        self.dashboard.lock().close();
        let _ = self.shutdown.send(());
        self.tasks.join().await?;
        log_system_event(
            None,
            "scheduler.shutdown",
            "dashboard tickers stopped",
            SystemEventOutcome::Success,
        );
        Ok(())
    }
}

async fn run_ticker<R: RandomSource + Send>(
    kind: TickKind,
    period: Duration,
    dashboard: SharedDashboard,
    mut generator: SampleGenerator<R>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let mut limiter = RateLimiter::new(period);
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!(ticker = kind.as_str(), "ticker shutdown signal received");
                break;
            }
            _ = limiter.tick() => {
                if !run_tick(&dashboard, kind, &mut generator, wall_clock_now()) {
                    debug!(ticker = kind.as_str(), "dashboard closed; ticker exiting");
                    break;
                }
                let tick = dashboard.lock().ticks(kind);
                let ctx = LogContext::new().with_ticker(kind.as_str()).with_tick(tick);
                pm_debug!(context = ctx, "tick applied");
            }
        }
    }
    Ok(())
}
