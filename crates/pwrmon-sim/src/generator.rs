//! ---
//! pwrmon_section: "11-simulation"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Jittered sample generation around channel baselines."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
use chrono::{DateTime, Local};
use pwrmon_common::config::{ChannelConfig, FieldConfig, TableConfig, ValueRange};
use pwrmon_common::time::display_time;

use crate::frames::{LogRow, Sample};
use crate::source::RandomSource;

/// `baseline + (unit - 0.5) * jitter`, clamped post-jitter when a range is given.
///
/// `unit` is expected in `[0, 1)`, so the unclamped result lies within
/// `baseline ± jitter / 2`. Clamping never re-samples.
pub fn jitter_value(baseline: f64, jitter: f64, unit: f64, clamp: Option<&ValueRange>) -> f64 {
    let value = baseline + (unit - 0.5) * jitter;
    match clamp {
        Some(range) => range.clamp(value),
        None => value,
    }
}

/// Produces synthetic readings from an injectable random source.
#[derive(Debug, Clone)]
pub struct SampleGenerator<R> {
    source: R,
}

impl<R: RandomSource> SampleGenerator<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn jittered(&mut self, baseline: f64, jitter: f64, clamp: Option<&ValueRange>) -> f64 {
        let unit = self.source.next_unit();
        jitter_value(baseline, jitter, unit, clamp)
    }

    /// Fixed-baseline reading used for history windows.
    pub fn history_value(&mut self, channel: &ChannelConfig) -> f64 {
        self.jittered(channel.baseline, channel.jitter, channel.clamp.as_ref())
    }

    /// Random-walk step from the previous instantaneous reading.
    pub fn walk_value(&mut self, channel: &ChannelConfig, previous: f64) -> f64 {
        self.jittered(previous, channel.walk_jitter, channel.clamp.as_ref())
    }

    /// Fixed-baseline instantaneous reading, using the walk step width.
    pub fn resample_value(&mut self, channel: &ChannelConfig) -> f64 {
        self.jittered(channel.baseline, channel.walk_jitter, channel.clamp.as_ref())
    }

    pub fn field_value(&mut self, field: &FieldConfig) -> f64 {
        self.jittered(field.baseline, field.jitter, field.clamp.as_ref())
    }

    pub fn sample(
        &mut self,
        channel: &ChannelConfig,
        at: &DateTime<Local>,
        time_format: &str,
    ) -> Sample {
        Sample::new(display_time(at, time_format), self.history_value(channel))
    }

    /// Draws voltage, current, power and energy in that order.
    pub fn log_row(
        &mut self,
        table: &TableConfig,
        at: &DateTime<Local>,
        time_format: &str,
    ) -> LogRow {
        LogRow {
            time: display_time(at, time_format),
            voltage: self.field_value(&table.voltage),
            current: self.field_value(&table.current),
            power: self.field_value(&table.power),
            energy: self.field_value(&table.energy),
            status: table.status.clone(),
        }
    }
}
