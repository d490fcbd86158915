//! ---
//! pwrmon_section: "01-core-functionality"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Dashboard configuration model and TOML loading."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_fast_tick() -> Duration {
    Duration::from_secs(2)
}

fn default_history_tick() -> Duration {
    Duration::from_secs(30)
}

fn default_log_tick() -> Duration {
    Duration::from_secs(30)
}

fn default_history_spacing() -> Duration {
    Duration::from_secs(600)
}

fn default_chart_window() -> usize {
    6
}

fn default_table_capacity() -> usize {
    12
}

fn default_status_label() -> String {
    "Normal".to_owned()
}

fn default_table_title() -> String {
    "Monitoring Data".to_owned()
}

fn default_precision() -> u8 {
    2
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    15
}

fn default_batch_delay() -> Duration {
    Duration::from_millis(10)
}

fn default_refresh() -> Duration {
    Duration::from_millis(250)
}

fn default_time_format() -> String {
    "%H:%M".to_owned()
}

fn default_clock_format() -> String {
    "%A, %d %B %Y %H:%M".to_owned()
}

fn default_title() -> String {
    "Electrical Power Monitoring".to_owned()
}

fn default_subtitle() -> String {
    "Real-time monitoring and analysis system".to_owned()
}

fn default_banner() -> Option<PathBuf> {
    Some(PathBuf::from("assets/banner.txt"))
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

/// Furthest back the seeded history may reach from start-up.
pub const MAX_HISTORY_REACH: Duration = Duration::from_secs(365 * 86_400);

/// Primary configuration object for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default = "default_channels")]
    pub channels: IndexMap<String, ChannelConfig>,
    #[serde(default)]
    pub table: TableConfig,
    #[serde(default)]
    pub activation: ActivationConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    /// `None` when the built-in dashboard was used.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "PWRMON_CONFIG";

    /// Load configuration from disk together with the effective source path,
    /// respecting the `PWRMON_CONFIG` override.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        match Self::locate(candidates)? {
            Some(loaded) => Ok(loaded),
            None => Err(anyhow!(
                "no configuration files found. inspected: {}",
                candidates
                    .iter()
                    .map(|p| p.as_ref().display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }

    /// Like [`AppConfig::load_with_source`] but falls back to the built-in dashboard.
    pub fn load_or_default<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        match Self::locate(candidates)? {
            Some(loaded) => Ok(loaded),
            None => {
                debug!("no configuration file found; using built-in dashboard");
                Ok(LoadedAppConfig {
                    config: Self::default(),
                    source: None,
                })
            }
        }
    }

    fn locate<P: AsRef<Path>>(candidates: &[P]) -> Result<Option<LoadedAppConfig>> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(Some(LoadedAppConfig {
                    config,
                    source: Some(path),
                }));
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_path(path)?;
                return Ok(Some(LoadedAppConfig {
                    config,
                    source: Some(path.to_path_buf()),
                }));
            }
        }
        Ok(None)
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        contents
            .parse::<AppConfig>()
            .with_context(|| format!("failed to load config file {}", path.display()))
    }

    /// Retrieve a channel configuration by identifier.
    pub fn channel(&self, channel_id: &str) -> Option<&ChannelConfig> {
        self.channels.get(channel_id)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(anyhow!("configuration must contain at least one channel"));
        }
        for (channel_id, channel) in &self.channels {
            channel.validate(channel_id)?;
        }
        self.simulation.validate()?;
        self.schedule.validate()?;
        self.table.validate()?;
        self.activation.validate()?;
        self.validate_history_reach()
    }

    /// Seeded history must stay within [`MAX_HISTORY_REACH`] of start-up.
    fn validate_history_reach(&self) -> Result<()> {
        let points = self.simulation.chart_window.max(self.table.capacity);
        let reach = u32::try_from(points.saturating_sub(1))
            .ok()
            .and_then(|steps| self.schedule.history_spacing.checked_mul(steps));
        match reach {
            Some(reach) if reach <= MAX_HISTORY_REACH => Ok(()),
            _ => Err(anyhow!(
                "schedule.history_spacing of {}s over {} points reaches back more than {} days",
                self.schedule.history_spacing.as_secs(),
                points,
                MAX_HISTORY_REACH.as_secs() / 86_400
            )),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            schedule: ScheduleConfig::default(),
            channels: default_channels(),
            table: TableConfig::default(),
            activation: ActivationConfig::default(),
            ui: UiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// How the fast ticker derives the next instantaneous reading.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotMode {
    /// Jitter around the previous reading.
    #[default]
    RandomWalk,
    /// Jitter around the channel's fixed baseline.
    Resample,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed for the random sources. `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub snapshot_mode: SnapshotMode,
    #[serde(default = "default_chart_window")]
    pub chart_window: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            snapshot_mode: SnapshotMode::default(),
            chart_window: default_chart_window(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chart_window == 0 {
            return Err(anyhow!("simulation.chart_window must be greater than zero"));
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_fast_tick")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub fast_tick: Duration,
    #[serde(default = "default_history_tick")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub history_tick: Duration,
    #[serde(default = "default_log_tick")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub log_tick: Duration,
    /// Spacing between the synthetic points seeded backward from start-up.
    #[serde(default = "default_history_spacing")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub history_spacing: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            fast_tick: default_fast_tick(),
            history_tick: default_history_tick(),
            log_tick: default_log_tick(),
            history_spacing: default_history_spacing(),
        }
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, period) in [
            ("fast_tick", self.fast_tick),
            ("history_tick", self.history_tick),
            ("log_tick", self.log_tick),
        ] {
            if period.is_zero() {
                return Err(anyhow!("schedule.{} must be greater than zero", name));
            }
        }
        Ok(())
    }
}

/// Closed numeric interval used for clamping and bar scaling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    fn validate(&self, what: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(anyhow!("{} bounds must be finite", what));
        }
        if self.min > self.max {
            return Err(anyhow!(
                "{} min {} exceeds max {}",
                what,
                self.min,
                self.max
            ));
        }
        Ok(())
    }
}

/// Phase conductor for three-phase channels.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    R,
    S,
    T,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::R => "R",
            Phase::S => "S",
            Phase::T => "T",
        }
    }
}

/// Named palette entry shared by cards and charts.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Blue,
    Yellow,
    Purple,
    Green,
    Red,
    Cyan,
    #[default]
    Gray,
}

impl ColorTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorTag::Blue => "blue",
            ColorTag::Yellow => "yellow",
            ColorTag::Purple => "purple",
            ColorTag::Green => "green",
            ColorTag::Red => "red",
            ColorTag::Cyan => "cyan",
            ColorTag::Gray => "gray",
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            ColorTag::Blue => "#3B82F6",
            ColorTag::Yellow => "#EAB308",
            ColorTag::Purple => "#8B5CF6",
            ColorTag::Green => "#10B981",
            ColorTag::Red => "#EF4444",
            ColorTag::Cyan => "#06B6D4",
            ColorTag::Gray => "#6B7280",
        }
    }
}

/// Pie slice metadata; the share is a fixed constant, not derived from readings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PieSliceConfig {
    pub share: f64,
    pub color_hex: String,
}

/// Per-channel metadata consulted by the generator and every renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub label: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub phase: Option<Phase>,
    pub baseline: f64,
    /// Full width of the uniform jitter applied by the history ticker.
    pub jitter: f64,
    /// Full width of the step applied by the fast ticker.
    #[serde(default)]
    pub walk_jitter: f64,
    /// Reading shown before the first fast tick; defaults to the baseline.
    #[serde(default)]
    pub initial: Option<f64>,
    #[serde(default = "default_precision")]
    pub precision: u8,
    #[serde(default = "default_precision")]
    pub card_precision: u8,
    #[serde(default)]
    pub clamp: Option<ValueRange>,
    #[serde(default)]
    pub display_range: Option<ValueRange>,
    #[serde(default)]
    pub color: ColorTag,
    #[serde(default)]
    pub chart_color: Option<ColorTag>,
    #[serde(default)]
    pub trend_percent: f64,
    #[serde(default)]
    pub pie: Option<PieSliceConfig>,
    #[serde(default = "default_true")]
    pub chart: bool,
}

impl ChannelConfig {
    pub fn initial_value(&self) -> f64 {
        self.initial.unwrap_or(self.baseline)
    }

    /// Range used to scale bars; falls back to the jitter envelope.
    pub fn effective_display_range(&self) -> ValueRange {
        self.display_range.unwrap_or_else(|| {
            let half = (self.jitter / 2.0).max(f64::EPSILON);
            ValueRange::new(self.baseline - half, self.baseline + half)
        })
    }

    pub fn effective_chart_color(&self) -> ColorTag {
        self.chart_color.unwrap_or(self.color)
    }

    pub fn validate(&self, channel_id: &str) -> Result<()> {
        if !self.baseline.is_finite() {
            return Err(anyhow!("channel '{}' baseline must be finite", channel_id));
        }
        for (name, jitter) in [("jitter", self.jitter), ("walk_jitter", self.walk_jitter)] {
            if !jitter.is_finite() || jitter < 0.0 {
                return Err(anyhow!(
                    "channel '{}' {} must be a finite, non-negative number",
                    channel_id,
                    name
                ));
            }
        }
        if let Some(initial) = self.initial {
            if !initial.is_finite() {
                return Err(anyhow!("channel '{}' initial must be finite", channel_id));
            }
        }
        if let Some(clamp) = &self.clamp {
            clamp.validate(&format!("channel '{}' clamp", channel_id))?;
        }
        if let Some(range) = &self.display_range {
            range.validate(&format!("channel '{}' display_range", channel_id))?;
        }
        if self.precision > 6 || self.card_precision > 6 {
            return Err(anyhow!(
                "channel '{}' precision must not exceed 6 digits",
                channel_id
            ));
        }
        Ok(())
    }
}

/// Generator parameters for one tabular log column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    pub baseline: f64,
    pub jitter: f64,
    #[serde(default)]
    pub clamp: Option<ValueRange>,
}

impl FieldConfig {
    pub const fn new(baseline: f64, jitter: f64) -> Self {
        Self {
            baseline,
            jitter,
            clamp: None,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !self.baseline.is_finite() || !self.jitter.is_finite() || self.jitter < 0.0 {
            return Err(anyhow!(
                "table.{} requires a finite baseline and non-negative jitter",
                name
            ));
        }
        if let Some(clamp) = &self.clamp {
            clamp.validate(&format!("table.{} clamp", name))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default = "default_table_title")]
    pub title: String,
    #[serde(default = "default_table_capacity")]
    pub capacity: usize,
    #[serde(default = "default_status_label")]
    pub status: String,
    #[serde(default = "TableConfig::default_voltage")]
    pub voltage: FieldConfig,
    #[serde(default = "TableConfig::default_current")]
    pub current: FieldConfig,
    #[serde(default = "TableConfig::default_power")]
    pub power: FieldConfig,
    #[serde(default = "TableConfig::default_energy")]
    pub energy: FieldConfig,
}

impl TableConfig {
    fn default_voltage() -> FieldConfig {
        FieldConfig::new(215.0, 20.0)
    }

    fn default_current() -> FieldConfig {
        FieldConfig::new(4.5, 3.0)
    }

    fn default_power() -> FieldConfig {
        FieldConfig::new(950.0, 600.0)
    }

    fn default_energy() -> FieldConfig {
        FieldConfig::new(150.0, 100.0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(anyhow!("table.capacity must be greater than zero"));
        }
        self.voltage.validate("voltage")?;
        self.current.validate("current")?;
        self.power.validate("power")?;
        self.energy.validate("energy")?;
        Ok(())
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            title: default_table_title(),
            capacity: default_table_capacity(),
            status: default_status_label(),
            voltage: Self::default_voltage(),
            current: Self::default_current(),
            power: Self::default_power(),
            energy: Self::default_energy(),
        }
    }
}

/// Visibility thresholds for one activation service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ObserverConfig {
    /// Minimum visible fraction of an element before it activates.
    pub threshold: f64,
    /// Rows added around the viewport so elements trigger slightly early.
    pub margin: u16,
}

impl ObserverConfig {
    fn validate(&self, name: &str) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(anyhow!(
                "activation.{}.threshold must lie within [0, 1]",
                name
            ));
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_delay")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub batch_delay: Duration,
    #[serde(default)]
    pub reduced_motion: bool,
    /// Set to false to force the degraded mode where everything shows at once.
    #[serde(default = "default_true")]
    pub observer_available: bool,
    #[serde(default = "ActivationConfig::default_animation")]
    pub animation: ObserverConfig,
    #[serde(default = "ActivationConfig::default_lazy_assets")]
    pub lazy_assets: ObserverConfig,
}

impl ActivationConfig {
    fn default_animation() -> ObserverConfig {
        ObserverConfig {
            threshold: 0.05,
            margin: 1,
        }
    }

    fn default_lazy_assets() -> ObserverConfig {
        ObserverConfig {
            threshold: 0.01,
            margin: 5,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(anyhow!("activation.batch_size must be greater than zero"));
        }
        self.animation.validate("animation")?;
        self.lazy_assets.validate("lazy_assets")?;
        Ok(())
    }
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay: default_batch_delay(),
            reduced_motion: false,
            observer_available: true,
            animation: Self::default_animation(),
            lazy_assets: Self::default_lazy_assets(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_subtitle")]
    pub subtitle: String,
    /// chrono format string for sample timestamps.
    #[serde(default = "default_time_format")]
    pub time_format: String,
    /// chrono format string for the header clock.
    #[serde(default = "default_clock_format")]
    pub clock_format: String,
    #[serde(default = "default_refresh")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub refresh: Duration,
    #[serde(default = "default_banner")]
    pub banner: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            subtitle: default_subtitle(),
            time_format: default_time_format(),
            clock_format: default_clock_format(),
            refresh: default_refresh(),
            banner: default_banner(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
    /// Mirror events to stdout; disabled by the terminal UI.
    #[serde(default = "default_true")]
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
            stdout: true,
        }
    }
}

/// Built-in dashboard channels: one single-phase feeder plus a three-phase board.
pub fn default_channels() -> IndexMap<String, ChannelConfig> {
    let mut channels = IndexMap::new();
    channels.insert(
        "voltage".to_owned(),
        ChannelConfig {
            label: "Voltage".to_owned(),
            unit: "V".to_owned(),
            phase: None,
            baseline: 215.0,
            jitter: 20.0,
            walk_jitter: 2.0,
            initial: Some(210.08),
            precision: 1,
            card_precision: 2,
            clamp: None,
            display_range: Some(ValueRange::new(200.0, 240.0)),
            color: ColorTag::Blue,
            chart_color: Some(ColorTag::Cyan),
            trend_percent: 2.3,
            pie: Some(PieSliceConfig {
                share: 36.0,
                color_hex: "#3B82F6".to_owned(),
            }),
            chart: true,
        },
    );
    channels.insert(
        "current".to_owned(),
        ChannelConfig {
            label: "Current".to_owned(),
            unit: "A".to_owned(),
            phase: None,
            baseline: 4.5,
            jitter: 0.8,
            walk_jitter: 0.2,
            initial: Some(4.54),
            precision: 2,
            card_precision: 2,
            clamp: None,
            display_range: Some(ValueRange::new(3.0, 6.0)),
            color: ColorTag::Yellow,
            chart_color: None,
            trend_percent: -1.2,
            pie: Some(PieSliceConfig {
                share: 28.0,
                color_hex: "#F59E0B".to_owned(),
            }),
            chart: true,
        },
    );
    channels.insert(
        "power".to_owned(),
        ChannelConfig {
            label: "Power".to_owned(),
            unit: "W".to_owned(),
            phase: None,
            baseline: 950.0,
            jitter: 200.0,
            walk_jitter: 20.0,
            initial: Some(953.76),
            precision: 0,
            card_precision: 2,
            clamp: None,
            display_range: Some(ValueRange::new(700.0, 1200.0)),
            color: ColorTag::Purple,
            chart_color: Some(ColorTag::Blue),
            trend_percent: 5.7,
            pie: Some(PieSliceConfig {
                share: 20.0,
                color_hex: "#6B7280".to_owned(),
            }),
            chart: true,
        },
    );
    channels.insert(
        "power_factor".to_owned(),
        ChannelConfig {
            label: "Cos φ".to_owned(),
            unit: String::new(),
            phase: None,
            baseline: 0.88,
            jitter: 0.1,
            walk_jitter: 0.02,
            initial: Some(0.891),
            precision: 3,
            card_precision: 3,
            clamp: Some(ValueRange::new(0.7, 1.0)),
            display_range: Some(ValueRange::new(0.7, 1.0)),
            color: ColorTag::Green,
            chart_color: Some(ColorTag::Purple),
            trend_percent: 1.8,
            pie: Some(PieSliceConfig {
                share: 16.0,
                color_hex: "#10B981".to_owned(),
            }),
            chart: true,
        },
    );
    for (phase, voltage, current, trend) in [
        (Phase::R, 220.0, 4.2, 1.1),
        (Phase::S, 219.0, 4.6, -0.4),
        (Phase::T, 221.0, 4.4, 0.7),
    ] {
        let suffix = phase.as_str().to_lowercase();
        channels.insert(
            format!("voltage_{}", suffix),
            ChannelConfig {
                label: format!("Voltage {}", phase.as_str()),
                unit: "V".to_owned(),
                phase: Some(phase),
                baseline: voltage,
                jitter: 20.0,
                walk_jitter: 2.0,
                initial: None,
                precision: 1,
                card_precision: 2,
                clamp: None,
                display_range: Some(ValueRange::new(200.0, 240.0)),
                color: ColorTag::Blue,
                chart_color: Some(ColorTag::Cyan),
                trend_percent: trend,
                pie: None,
                chart: true,
            },
        );
        channels.insert(
            format!("current_{}", suffix),
            ChannelConfig {
                label: format!("Current {}", phase.as_str()),
                unit: "A".to_owned(),
                phase: Some(phase),
                baseline: current,
                jitter: 0.8,
                walk_jitter: 0.2,
                initial: None,
                precision: 2,
                card_precision: 2,
                clamp: None,
                display_range: Some(ValueRange::new(3.0, 6.0)),
                color: ColorTag::Yellow,
                chart_color: None,
                trend_percent: -trend,
                pie: None,
                chart: true,
            },
        );
    }
    channels
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.simulation.chart_window, 6);
        assert_eq!(config.table.capacity, 12);
        assert_eq!(config.schedule.fast_tick, Duration::from_secs(2));
        assert_eq!(config.schedule.history_tick, Duration::from_secs(30));
        assert_eq!(
            config.channel("power_factor").unwrap().clamp,
            Some(ValueRange::new(0.7, 1.0))
        );
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let raw = r#"
            [simulation]
            seed = 7
            snapshot_mode = "resample"

            [schedule]
            fast_tick = 500

            [channels.voltage_r]
            label = "Voltage R"
            unit = "V"
            phase = "R"
            baseline = 220.0
            jitter = 10.0
            clamp = { min = 200.0, max = 240.0 }
        "#;
        let config: AppConfig = raw.parse().unwrap();
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.snapshot_mode, SnapshotMode::Resample);
        assert_eq!(config.schedule.fast_tick, Duration::from_millis(500));
        assert_eq!(config.schedule.log_tick, Duration::from_secs(30));
        assert_eq!(config.channels.len(), 1);
        let channel = config.channel("voltage_r").unwrap();
        assert_eq!(channel.phase, Some(Phase::R));
        assert_eq!(channel.initial_value(), 220.0);
        assert_eq!(channel.effective_chart_color(), ColorTag::Gray);
    }

    #[test]
    fn rejects_inverted_clamp() {
        let raw = r#"
            [channels.pf]
            label = "pf"
            baseline = 0.9
            jitter = 0.1
            clamp = { min = 1.0, max = 0.7 }
        "#;
        let err = raw.parse::<AppConfig>().unwrap_err();
        assert!(format!("{err:#}").contains("exceeds max"));
    }

    #[test]
    fn rejects_negative_jitter_and_zero_periods() {
        let raw = r#"
            [channels.v]
            label = "v"
            baseline = 1.0
            jitter = -1.0
        "#;
        assert!(raw.parse::<AppConfig>().is_err());

        let mut config = AppConfig::default();
        config.schedule.log_tick = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_history_spacing_beyond_representable_reach() {
        let err = "[schedule]\nhistory_spacing = 10000000000000\n"
            .parse::<AppConfig>()
            .unwrap_err();
        assert!(format!("{err:#}").contains("history_spacing"));

        let mut config = AppConfig::default();
        config.schedule.history_spacing = Duration::from_secs(40 * 86_400);
        assert!(config.validate().is_err());
        config.schedule.history_spacing = Duration::from_secs(30 * 86_400);
        config.validate().unwrap();
    }

    #[test]
    fn display_range_falls_back_to_jitter_envelope() {
        let mut channel = AppConfig::default().channels["voltage"].clone();
        channel.display_range = None;
        let range = channel.effective_display_range();
        assert_eq!(range, ValueRange::new(205.0, 225.0));
    }

    #[test]
    fn load_or_default_prefers_existing_candidate() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            "[table]\ncapacity = 4\nstatus = \"Simulated\"\n"
        )?;
        file.flush()?;
        let missing = PathBuf::from("/definitely/not/here.toml");
        let loaded = AppConfig::load_or_default(&[missing.as_path(), file.path()])?;
        assert_eq!(loaded.source.as_deref(), Some(file.path()));
        assert_eq!(loaded.config.table.capacity, 4);
        assert_eq!(loaded.config.table.status, "Simulated");

        let fallback = AppConfig::load_or_default(&[missing.as_path()])?;
        assert!(fallback.source.is_none());
        assert!(AppConfig::load_with_source(&[missing.as_path()]).is_err());
        Ok(())
    }
}
