//! ---
//! pwrmon_section: "01-core-functionality"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Runtime helpers supporting the update scheduler."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
//! Timer and task helpers for the pwrmon runtime.

pub mod scheduling;

pub use scheduling::{RateLimiter, TaskGroup};
