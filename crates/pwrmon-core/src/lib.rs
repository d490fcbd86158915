//! ---
//! pwrmon_section: "01-core-functionality"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Dashboard state, scheduling and activation lifecycle."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
//! Dashboard store, periodic update scheduling, visibility-triggered
//! activation, and the presentation model consumed by renderers.

pub mod activation;
pub mod assets;
pub mod scheduler;
pub mod store;
pub mod views;

pub use activation::{
    ActivationOptions, ActivationService, ActivationState, DegradedReason, ElementBounds,
    ElementId, IntersectionEntry, ServiceMode, TrackingObserver, Viewport, VisibilityObserver,
};
pub use assets::{AssetError, AssetLoader, AssetState, FileAssetLoader, LazyAssets};
pub use scheduler::{run_tick, SchedulerHandle, TickerSources, UpdateScheduler};
pub use store::{DashboardState, SharedDashboard, TickKind};
pub use views::{CardInput, ChartInput, ChartPoint, DashboardFrame, PieSlice, TableRow};
