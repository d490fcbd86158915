//! ---
//! pwrmon_section: "11-simulation"
//! pwrmon_subsection: "01-bootstrap"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Simulation module exports and shared types."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
//! Synthetic reading generation for the pwrmon dashboard.
//!
//! Readings are drawn uniformly around a baseline from an injectable
//! [`RandomSource`], optionally clamped, and kept in fixed-capacity
//! [`RollingWindow`]s.

pub mod channel;
pub mod error;
pub mod frames;
pub mod generator;
pub mod source;
pub mod window;

pub use channel::{ChannelMap, DashboardView};
pub use error::SimError;
pub use frames::{LogRow, Sample, Snapshot};
pub use generator::{jitter_value, SampleGenerator};
pub use source::{RandomSource, SeededSource, SequenceSource};
pub use window::RollingWindow;
