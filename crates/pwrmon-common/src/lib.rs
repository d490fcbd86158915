//! ---
//! pwrmon_section: "01-core-functionality"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Shared primitives and utilities for the dashboard runtime."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
//! Core shared primitives for the pwrmon workspace.
//! This crate exposes configuration loading, tracing setup, and the
//! wall-clock helpers consumed across the workspace.

pub mod config;
pub mod logging;
pub mod time;

pub use config::{
    ActivationConfig, AppConfig, ChannelConfig, ColorTag, FieldConfig, LoadedAppConfig,
    LoggingConfig, ObserverConfig, Phase, PieSliceConfig, ScheduleConfig, SimulationConfig,
    SnapshotMode, TableConfig, UiConfig, ValueRange,
};
pub use logging::{init_tracing, LogFormat};
