//! ---
//! pwrmon_section: "11-simulation"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Shared channel configuration map keyed by channel identity."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
use indexmap::IndexMap;
use pwrmon_common::config::ChannelConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Dashboard page a channel belongs to.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DashboardView {
    #[default]
    SinglePhase,
    ThreePhase,
}

impl DashboardView {
    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardView::SinglePhase => "single-phase",
            DashboardView::ThreePhase => "three-phase",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            DashboardView::SinglePhase => DashboardView::ThreePhase,
            DashboardView::ThreePhase => DashboardView::SinglePhase,
        }
    }

    fn includes(&self, channel: &ChannelConfig) -> bool {
        match self {
            DashboardView::SinglePhase => channel.phase.is_none(),
            DashboardView::ThreePhase => channel.phase.is_some(),
        }
    }
}

/// Single source of truth for per-channel generator and styling metadata.
#[derive(Debug, Clone, Default)]
pub struct ChannelMap {
    channels: IndexMap<String, ChannelConfig>,
}

impl ChannelMap {
    pub fn new(channels: IndexMap<String, ChannelConfig>) -> Self {
        Self { channels }
    }

    pub fn get(&self, channel_id: &str) -> Result<&ChannelConfig> {
        self.channels
            .get(channel_id)
            .ok_or_else(|| SimError::UnknownChannel(channel_id.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChannelConfig)> + '_ {
        self.channels.iter().map(|(id, cfg)| (id.as_str(), cfg))
    }

    /// Channels that keep a chart history window.
    pub fn charted(&self) -> impl Iterator<Item = (&str, &ChannelConfig)> + '_ {
        self.iter().filter(|(_, cfg)| cfg.chart)
    }

    /// Channels shown on a dashboard view, in configuration order.
    pub fn in_view(
        &self,
        view: DashboardView,
    ) -> impl Iterator<Item = (&str, &ChannelConfig)> + '_ {
        self.iter().filter(move |(_, cfg)| view.includes(cfg))
    }

    /// Channels contributing a pie slice.
    pub fn pie_slices(&self) -> impl Iterator<Item = (&str, &ChannelConfig)> + '_ {
        self.iter().filter(|(_, cfg)| cfg.pie.is_some())
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl From<IndexMap<String, ChannelConfig>> for ChannelMap {
    fn from(channels: IndexMap<String, ChannelConfig>) -> Self {
        Self::new(channels)
    }
}
