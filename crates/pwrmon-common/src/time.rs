//! ---
//! pwrmon_section: "01-core-functionality"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Wall-clock helpers for display timestamps."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};

/// Capture the local wall-clock time used to stamp samples.
pub fn wall_clock_now() -> DateTime<Local> {
    Local::now()
}

/// Format a timestamp for display, e.g. `14:30` for `%H:%M`.
pub fn display_time<Tz: TimeZone>(at: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(format).to_string()
}

/// Timestamps for `count` points ending at `now`, spaced `spacing` apart, oldest first.
///
/// Slots that would fall outside chrono's representable range collapse onto
/// the earliest slot that still fits.
pub fn history_slots<Tz: TimeZone>(
    now: &DateTime<Tz>,
    count: usize,
    spacing: Duration,
) -> Vec<DateTime<Tz>> {
    let step = chrono::Duration::from_std(spacing).unwrap_or_else(|_| chrono::Duration::zero());
    let mut slots: Vec<DateTime<Tz>> = Vec::with_capacity(count);
    let mut earliest = now.clone();
    for offset in 0..count {
        let slot = i32::try_from(offset)
            .ok()
            .and_then(|offset| step.checked_mul(offset))
            .and_then(|back| now.clone().checked_sub_signed(back))
            .unwrap_or_else(|| earliest.clone());
        earliest = slot.clone();
        slots.push(slot);
    }
    slots.reverse();
    slots
}
