//! ---
//! pwrmon_section: "11-simulation"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Synthetic reading records shared with the presentation layer."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// One reading of a channel. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    time: String,
    value: f64,
}

impl Sample {
    pub fn new(time: impl Into<String>, value: f64) -> Self {
        Self {
            time: time.into(),
            value,
        }
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// One row of the tabular monitoring log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub time: String,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub energy: f64,
    pub status: String,
}

/// Instantaneous reading per channel, mutated in place by the fast ticker.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    readings: IndexMap<String, f64>,
    updated_at: DateTime<Local>,
}

impl Snapshot {
    pub fn new(updated_at: DateTime<Local>) -> Self {
        Self {
            readings: IndexMap::new(),
            updated_at,
        }
    }

    pub fn get(&self, channel_id: &str) -> Result<f64> {
        self.readings
            .get(channel_id)
            .copied()
            .ok_or_else(|| SimError::MissingReading(channel_id.to_owned()))
    }

    pub fn set(&mut self, channel_id: &str, value: f64) {
        match self.readings.get_mut(channel_id) {
            Some(slot) => *slot = value,
            None => {
                self.readings.insert(channel_id.to_owned(), value);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.readings.iter().map(|(id, value)| (id.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn updated_at(&self) -> DateTime<Local> {
        self.updated_at
    }

    pub fn touch(&mut self, at: DateTime<Local>) {
        self.updated_at = at;
    }
}
