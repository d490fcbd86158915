//! ---
//! pwrmon_section: "01-core-functionality"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Snapshot, chart history and monitoring log state."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
use std::sync::Arc;

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use parking_lot::Mutex;
use pwrmon_common::config::{AppConfig, SnapshotMode, TableConfig};
use pwrmon_common::time::history_slots;
use pwrmon_sim::error::Result as SimResult;
use pwrmon_sim::{
    ChannelMap, LogRow, RandomSource, RollingWindow, Sample, SampleGenerator, SimError, Snapshot,
};
use serde::Serialize;
use tracing::debug;

/// Shared handle used by the tickers and the renderer.
pub type SharedDashboard = Arc<Mutex<DashboardState>>;

/// The three independent update streams.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TickKind {
    /// Instantaneous readouts.
    Fast,
    /// Chart history windows.
    History,
    /// Tabular monitoring log.
    Log,
}

impl TickKind {
    pub const ALL: [TickKind; 3] = [TickKind::Fast, TickKind::History, TickKind::Log];

    pub fn as_str(&self) -> &'static str {
        match self {
            TickKind::Fast => "fast",
            TickKind::History => "history",
            TickKind::Log => "log",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct TickCounters {
    fast: u64,
    history: u64,
    log: u64,
}

impl TickCounters {
    fn bump(&mut self, kind: TickKind) -> u64 {
        let slot = match kind {
            TickKind::Fast => &mut self.fast,
            TickKind::History => &mut self.history,
            TickKind::Log => &mut self.log,
        };
        *slot += 1;
        *slot
    }

    fn get(&self, kind: TickKind) -> u64 {
        match kind {
            TickKind::Fast => self.fast,
            TickKind::History => self.history,
            TickKind::Log => self.log,
        }
    }
}

/// In-memory dashboard data: one snapshot, one chart window per charted
/// channel, and the monitoring log window.
#[derive(Debug, Clone)]
pub struct DashboardState {
    channels: ChannelMap,
    table: TableConfig,
    snapshot_mode: SnapshotMode,
    time_format: String,
    snapshot: Snapshot,
    charts: IndexMap<String, RollingWindow<Sample>>,
    log: RollingWindow<LogRow>,
    counters: TickCounters,
    closed: bool,
}

impl DashboardState {
    /// Seed every window with synthetic history computed backward from `now`.
    pub fn seed<R: RandomSource>(
        config: &AppConfig,
        generator: &mut SampleGenerator<R>,
        now: DateTime<Local>,
    ) -> Self {
        let channels = ChannelMap::new(config.channels.clone());
        let time_format = config.ui.time_format.clone();
        let spacing = config.schedule.history_spacing;

        let mut snapshot = Snapshot::new(now);
        for (channel_id, channel) in channels.iter() {
            snapshot.set(channel_id, channel.initial_value());
        }

        let chart_slots = history_slots(&now, config.simulation.chart_window, spacing);
        let mut charts = IndexMap::new();
        for (channel_id, channel) in channels.charted() {
            let seed = chart_slots
                .iter()
                .map(|at| generator.sample(channel, at, &time_format))
                .collect::<Vec<_>>();
            charts.insert(
                channel_id.to_owned(),
                RollingWindow::seeded(config.simulation.chart_window, seed),
            );
        }

        let log_slots = history_slots(&now, config.table.capacity, spacing);
        let rows = log_slots
            .iter()
            .map(|at| generator.log_row(&config.table, at, &time_format))
            .collect::<Vec<_>>();
        let log = RollingWindow::seeded(config.table.capacity, rows);

        debug!(
            channels = channels.len(),
            charts = charts.len(),
            log_rows = log.len(),
            "dashboard seeded"
        );

        Self {
            channels,
            table: config.table.clone(),
            snapshot_mode: config.simulation.snapshot_mode,
            time_format,
            snapshot,
            charts,
            log,
            counters: TickCounters::default(),
            closed: false,
        }
    }

    pub fn into_shared(self) -> SharedDashboard {
        Arc::new(Mutex::new(self))
    }

    /// Apply one tick of `kind`. Returns `false` once the dashboard is closed.
    pub fn apply<R: RandomSource>(
        &mut self,
        kind: TickKind,
        generator: &mut SampleGenerator<R>,
        now: DateTime<Local>,
    ) -> bool {
        match kind {
            TickKind::Fast => self.apply_fast_tick(generator, now),
            TickKind::History => self.apply_history_tick(generator, now),
            TickKind::Log => self.apply_log_tick(generator, now),
        }
    }

    /// Refresh every instantaneous reading and the header clock.
    pub fn apply_fast_tick<R: RandomSource>(
        &mut self,
        generator: &mut SampleGenerator<R>,
        now: DateTime<Local>,
    ) -> bool {
        if self.closed {
            return false;
        }
        for (channel_id, channel) in self.channels.iter() {
            let next = match self.snapshot_mode {
                SnapshotMode::RandomWalk => {
                    let previous = self
                        .snapshot
                        .get(channel_id)
                        .unwrap_or_else(|_| channel.initial_value());
                    generator.walk_value(channel, previous)
                }
                SnapshotMode::Resample => generator.resample_value(channel),
            };
            self.snapshot.set(channel_id, next);
        }
        self.snapshot.touch(now);
        self.counters.bump(TickKind::Fast);
        true
    }

    /// Append one fixed-baseline sample to every chart window.
    pub fn apply_history_tick<R: RandomSource>(
        &mut self,
        generator: &mut SampleGenerator<R>,
        now: DateTime<Local>,
    ) -> bool {
        if self.closed {
            return false;
        }
        for (channel_id, window) in self.charts.iter_mut() {
            if let Ok(channel) = self.channels.get(channel_id) {
                window.push(generator.sample(channel, &now, &self.time_format));
            }
        }
        self.counters.bump(TickKind::History);
        true
    }

    /// Append one row to the monitoring log window.
    pub fn apply_log_tick<R: RandomSource>(
        &mut self,
        generator: &mut SampleGenerator<R>,
        now: DateTime<Local>,
    ) -> bool {
        if self.closed {
            return false;
        }
        let row = generator.log_row(&self.table, &now, &self.time_format);
        self.log.push(row);
        self.counters.bump(TickKind::Log);
        true
    }

    /// Freeze the dashboard; later ticks are ignored.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    pub fn table_config(&self) -> &TableConfig {
        &self.table
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn chart(&self, channel_id: &str) -> SimResult<&RollingWindow<Sample>> {
        self.charts
            .get(channel_id)
            .ok_or_else(|| SimError::UnknownChannel(channel_id.to_owned()))
    }

    pub fn charts(&self) -> impl Iterator<Item = (&str, &RollingWindow<Sample>)> + '_ {
        self.charts.iter().map(|(id, window)| (id.as_str(), window))
    }

    pub fn log(&self) -> &RollingWindow<LogRow> {
        &self.log
    }

    /// Number of ticks of `kind` applied so far.
    pub fn ticks(&self, kind: TickKind) -> u64 {
        self.counters.get(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pwrmon_common::config::ValueRange;
    use pwrmon_sim::{SeededSource, SequenceSource};

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap()
    }

    fn seeded(config: &AppConfig, seed: u64) -> DashboardState {
        let mut generator = SampleGenerator::new(SeededSource::new(seed));
        DashboardState::seed(config, &mut generator, fixed_now())
    }

    #[test]
    fn seeding_fills_every_window() {
        let config = AppConfig::default();
        let state = seeded(&config, 1);
        assert_eq!(state.charts().count(), 10);
        for (_, window) in state.charts() {
            assert_eq!(window.len(), 6);
        }
        assert_eq!(state.log().len(), 12);
        assert_eq!(state.snapshot().get("voltage"), Ok(210.08));
        assert_eq!(state.snapshot().get("voltage_r"), Ok(220.0));
        let times: Vec<&str> = state
            .chart("voltage")
            .unwrap()
            .iter()
            .map(|sample| sample.time())
            .collect();
        assert_eq!(times, vec!["11:10", "11:20", "11:30", "11:40", "11:50", "12:00"]);
    }

    #[test]
    fn seeded_values_stay_within_half_jitter() {
        let config = AppConfig::default();
        let state = seeded(&config, 99);
        for (channel_id, window) in state.charts() {
            let channel = state.channels().get(channel_id).unwrap();
            let half = channel.jitter / 2.0;
            for sample in window.iter() {
                assert!(
                    (sample.value() - channel.baseline).abs() <= half + 1e-9,
                    "{channel_id} sample {} outside envelope",
                    sample.value()
                );
            }
        }
    }

    #[test]
    fn power_factor_stays_clamped_through_many_fast_ticks() {
        let config = AppConfig::default();
        let mut state = seeded(&config, 5);
        let mut generator = SampleGenerator::new(SeededSource::new(1234));
        let range = ValueRange::new(0.7, 1.0);
        for _ in 0..5_000 {
            assert!(state.apply_fast_tick(&mut generator, fixed_now()));
            let pf = state.snapshot().get("power_factor").unwrap();
            assert!(range.contains(pf), "power factor {pf} escaped clamp");
        }
        assert_eq!(state.ticks(TickKind::Fast), 5_000);
    }

    #[test]
    fn fast_tick_walks_from_previous_reading() {
        let config = AppConfig::default();
        let mut state = seeded(&config, 5);
        let mut generator = SampleGenerator::new(SequenceSource::constant(1.0));
        state.apply_fast_tick(&mut generator, fixed_now());
        state.apply_fast_tick(&mut generator, fixed_now());
        // two steps of +walk_jitter/2 from 210.08
        let voltage = state.snapshot().get("voltage").unwrap();
        assert!((voltage - 212.08).abs() < 1e-9);
    }

    #[test]
    fn resample_mode_ignores_previous_reading() {
        let mut config = AppConfig::default();
        config.simulation.snapshot_mode = SnapshotMode::Resample;
        let mut state = seeded(&config, 5);
        let mut generator = SampleGenerator::new(SequenceSource::constant(1.0));
        state.apply_fast_tick(&mut generator, fixed_now());
        state.apply_fast_tick(&mut generator, fixed_now());
        assert_eq!(state.snapshot().get("voltage"), Ok(216.0));
    }

    #[test]
    fn history_tick_evicts_oldest_and_appends_newest() {
        let config = AppConfig::default();
        let mut state = seeded(&config, 3);
        let before = state.chart("current").unwrap().clone();
        let mut generator = SampleGenerator::new(SequenceSource::constant(0.5));
        let later = Local.with_ymd_and_hms(2024, 6, 3, 12, 10, 0).unwrap();
        assert!(state.apply_history_tick(&mut generator, later));
        let after = state.chart("current").unwrap();
        assert_eq!(after.len(), 6);
        assert_eq!(after.first(), before.get(1));
        assert_eq!(after.last(), Some(&Sample::new("12:10", 4.5)));
    }

    #[test]
    fn log_tick_keeps_twelve_rows() {
        let config = AppConfig::default();
        let mut state = seeded(&config, 3);
        let mut generator = SampleGenerator::new(SeededSource::new(8));
        for _ in 0..30 {
            state.apply_log_tick(&mut generator, fixed_now());
            assert_eq!(state.log().len(), 12);
        }
        assert!(state.log().iter().all(|row| row.status == "Normal"));
    }

    #[test]
    fn closed_dashboard_ignores_ticks() {
        let config = AppConfig::default();
        let mut state = seeded(&config, 3);
        state.close();
        let frozen = state.clone();
        let mut generator = SampleGenerator::new(SeededSource::new(8));
        for kind in TickKind::ALL {
            assert!(!state.apply(kind, &mut generator, fixed_now()));
        }
        assert_eq!(state.log(), frozen.log());
        assert_eq!(state.chart("power").unwrap(), frozen.chart("power").unwrap());
        assert_eq!(state.snapshot().get("power"), frozen.snapshot().get("power"));
        assert_eq!(state.ticks(TickKind::Fast), 0);
    }
}
