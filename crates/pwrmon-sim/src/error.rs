//! ---
//! pwrmon_section: "11-simulation"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Error type for channel lookups."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("channel {0} not found in channel map")]
    UnknownChannel(String),
    #[error("channel {0} has no snapshot reading")]
    MissingReading(String),
}
