//! ---
//! pwrmon_section: "01-core-functionality"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Visibility-triggered activation for scroll-in animation and lazy assets."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
//! An [`ActivationService`] owns one [`VisibilityObserver`] and a set of
//! registered elements. Elements start `Pending`, are handed to the observer in
//! small batches, and flip to `Active` exactly once when enough of them enters
//! the (margin-expanded) viewport. When no observer exists, or reduced motion
//! is requested for animations, every element activates on registration.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use indexmap::{IndexMap, IndexSet};
use pwrmon_common::config::{ActivationConfig, ObserverConfig};
use pwrmon_logging::{log_system_event, SystemEventOutcome};
use serde::Serialize;
use tracing::debug;

/// Identity of a registered element (a card, chart or asset placeholder).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationState {
    Pending,
    Active,
}

/// Subscription seam between the service and whatever reports visibility.
pub trait VisibilityObserver {
    fn observe(&mut self, id: &ElementId);
    fn unobserve(&mut self, id: &ElementId);
    fn disconnect(&mut self);
}

/// Observer that simply records subscriptions. The terminal UI pairs it with
/// [`Viewport::entry`] to compute intersections for the observed set.
#[derive(Debug, Default, Clone)]
pub struct TrackingObserver {
    observed: IndexSet<ElementId>,
    observe_calls: usize,
    unobserve_calls: usize,
    disconnected: bool,
}

impl TrackingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_observing(&self, id: &ElementId) -> bool {
        self.observed.contains(id)
    }

    pub fn observed(&self) -> impl Iterator<Item = &ElementId> + '_ {
        self.observed.iter()
    }

    pub fn observe_calls(&self) -> usize {
        self.observe_calls
    }

    pub fn unobserve_calls(&self) -> usize {
        self.unobserve_calls
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl VisibilityObserver for TrackingObserver {
    fn observe(&mut self, id: &ElementId) {
        self.observe_calls += 1;
        self.observed.insert(id.clone());
    }

    fn unobserve(&mut self, id: &ElementId) {
        self.unobserve_calls += 1;
        self.observed.shift_remove(id);
    }

    fn disconnect(&mut self) {
        self.observed.clear();
        self.disconnected = true;
    }
}

/// One visibility report for an observed element.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub id: ElementId,
    /// Visible fraction of the element, in `[0, 1]`.
    pub ratio: f64,
    pub is_intersecting: bool,
}

/// Vertical extent of an element in content rows.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ElementBounds {
    pub top: i32,
    pub height: u16,
}

/// The visible window over the scrolled content, in rows.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Viewport {
    pub top: i32,
    pub height: u16,
}

impl Viewport {
    pub fn new(top: i32, height: u16) -> Self {
        Self { top, height }
    }

    /// Intersection of `bounds` with this viewport grown by `margin` rows on both edges.
    pub fn entry(&self, id: ElementId, bounds: ElementBounds, margin: u16) -> IntersectionEntry {
        let view_start = self.top - i32::from(margin);
        let view_end = self.top + i32::from(self.height) + i32::from(margin);
        let start = bounds.top;
        let end = bounds.top + i32::from(bounds.height);

        if bounds.height == 0 {
            let inside = start >= view_start && start <= view_end;
            return IntersectionEntry {
                id,
                ratio: if inside { 1.0 } else { 0.0 },
                is_intersecting: inside,
            };
        }

        let overlap = (end.min(view_end) - start.max(view_start)).max(0);
        IntersectionEntry {
            id,
            ratio: f64::from(overlap) / f64::from(bounds.height),
            is_intersecting: overlap > 0,
        }
    }
}

/// Tuning for one activation purpose.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationOptions {
    pub threshold: f64,
    pub margin: u16,
    pub batch_size: usize,
    pub batch_delay: Duration,
    /// Only animations honour the reduced-motion preference.
    pub respect_reduced_motion: bool,
}

impl ActivationOptions {
    fn from_observer(
        config: &ActivationConfig,
        observer: &ObserverConfig,
        respect_reduced_motion: bool,
    ) -> Self {
        Self {
            threshold: observer.threshold,
            margin: observer.margin,
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay,
            respect_reduced_motion,
        }
    }

    pub fn animation(config: &ActivationConfig) -> Self {
        Self::from_observer(config, &config.animation, true)
    }

    pub fn lazy_assets(config: &ActivationConfig) -> Self {
        Self::from_observer(config, &config.lazy_assets, false)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DegradedReason {
    ObserverUnavailable,
    ReducedMotion,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceMode {
    Observing,
    /// Every registration activates immediately; no subscription is made.
    Degraded(DegradedReason),
    ShutDown,
}

/// Shared visibility-activation service for one purpose.
pub struct ActivationService<O: VisibilityObserver> {
    name: &'static str,
    options: ActivationOptions,
    observer: Option<O>,
    mode: ServiceMode,
    states: IndexMap<ElementId, ActivationState>,
    queue: VecDeque<ElementId>,
    observed: IndexSet<ElementId>,
    processing: bool,
    next_batch_at: Option<Instant>,
}

impl<O: VisibilityObserver> ActivationService<O> {
    pub fn new(
        name: &'static str,
        options: ActivationOptions,
        observer: Option<O>,
        reduced_motion: bool,
    ) -> Self {
        let (mode, observer) = if reduced_motion && options.respect_reduced_motion {
            (ServiceMode::Degraded(DegradedReason::ReducedMotion), None)
        } else if observer.is_none() {
            (ServiceMode::Degraded(DegradedReason::ObserverUnavailable), None)
        } else {
            (ServiceMode::Observing, observer)
        };

        if let ServiceMode::Degraded(reason) = mode {
            let cause = match reason {
                DegradedReason::ReducedMotion => "reduced motion requested",
                DegradedReason::ObserverUnavailable => "visibility observer unavailable",
            };
            log_system_event(
                None,
                "activation.degraded",
                &format!("{name}: {cause}; activating immediately"),
                SystemEventOutcome::Degraded,
            );
        }

        Self {
            name,
            options,
            observer,
            mode,
            states: IndexMap::new(),
            queue: VecDeque::new(),
            observed: IndexSet::new(),
            processing: false,
            next_batch_at: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn options(&self) -> &ActivationOptions {
        &self.options
    }

    pub fn mode(&self) -> ServiceMode {
        self.mode
    }

    pub fn observer(&self) -> Option<&O> {
        self.observer.as_ref()
    }

    /// Track `id`. Returns the state right after registration; re-registering
    /// a known element leaves it untouched. A shut-down service refuses every
    /// registration and returns `None`.
    pub fn register(&mut self, id: impl Into<ElementId>) -> Option<ActivationState> {
        let id = id.into();
        if self.mode == ServiceMode::ShutDown {
            return None;
        }
        if let Some(state) = self.states.get(&id) {
            return Some(*state);
        }
        let state = match self.mode {
            ServiceMode::Observing => {
                self.states.insert(id.clone(), ActivationState::Pending);
                self.queue.push_back(id);
                if !self.processing {
                    self.processing = true;
                    self.next_batch_at = None;
                }
                ActivationState::Pending
            }
            _ => {
                self.states.insert(id, ActivationState::Active);
                ActivationState::Active
            }
        };
        Some(state)
    }

    /// Forget `id`, unsubscribing it if it was observed.
    pub fn unregister(&mut self, id: &ElementId) {
        self.states.shift_remove(id);
        self.queue.retain(|queued| queued != id);
        if self.observed.shift_remove(id) {
            if let Some(observer) = self.observer.as_mut() {
                observer.unobserve(id);
            }
        }
    }

    /// Hand up to `batch_size` queued elements to the observer. Returns how many
    /// were subscribed; an empty queue ends the processing run.
    pub fn process_next_batch(&mut self) -> usize {
        if self.queue.is_empty() {
            self.processing = false;
            self.next_batch_at = None;
            return 0;
        }
        self.processing = true;
        let take = self.options.batch_size.min(self.queue.len());
        let mut subscribed = 0;
        for id in self.queue.drain(..take) {
            if let Some(observer) = self.observer.as_mut() {
                observer.observe(&id);
                self.observed.insert(id);
                subscribed += 1;
            }
        }
        debug!(service = self.name, subscribed, remaining = self.queue.len(), "batch observed");
        subscribed
    }

    /// Drive batch processing from an event loop: runs at most one batch when
    /// one is due at `now`, then schedules the next one `batch_delay` later.
    pub fn poll_batches(&mut self, now: Instant) -> usize {
        if !self.processing {
            return 0;
        }
        if let Some(due) = self.next_batch_at {
            if now < due {
                return 0;
            }
        }
        let subscribed = self.process_next_batch();
        if self.processing {
            self.next_batch_at = Some(now + self.options.batch_delay);
        }
        subscribed
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Apply visibility reports. Returns the elements that became active now.
    pub fn on_intersection(&mut self, entries: &[IntersectionEntry]) -> Vec<ElementId> {
        if self.mode != ServiceMode::Observing {
            return Vec::new();
        }
        let mut activated = Vec::new();
        for entry in entries {
            if !entry.is_intersecting
                || entry.ratio <= 0.0
                || entry.ratio < self.options.threshold
                || !self.observed.contains(&entry.id)
            {
                continue;
            }
            let Some(state) = self.states.get_mut(&entry.id) else {
                continue;
            };
            if *state == ActivationState::Active {
                continue;
            }
            *state = ActivationState::Active;
            self.observed.shift_remove(&entry.id);
            if let Some(observer) = self.observer.as_mut() {
                observer.unobserve(&entry.id);
            }
            activated.push(entry.id.clone());
        }
        if !activated.is_empty() {
            debug!(service = self.name, count = activated.len(), "elements activated");
        }
        activated
    }

    pub fn state(&self, id: &ElementId) -> Option<ActivationState> {
        self.states.get(id).copied()
    }

    pub fn is_active(&self, id: &ElementId) -> bool {
        self.state(id) == Some(ActivationState::Active)
    }

    pub fn pending_count(&self) -> usize {
        self.states
            .values()
            .filter(|state| **state == ActivationState::Pending)
            .count()
    }

    pub fn active_count(&self) -> usize {
        self.states.len() - self.pending_count()
    }

    /// Elements currently subscribed with the observer.
    pub fn observed(&self) -> impl Iterator<Item = &ElementId> + '_ {
        self.observed.iter()
    }

    /// Disconnect the observer and drop queued work. Later callbacks are no-ops.
    pub fn shutdown(&mut self) {
        if self.mode == ServiceMode::ShutDown {
            return;
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.disconnect();
        }
        self.queue.clear();
        self.observed.clear();
        self.processing = false;
        self.next_batch_at = None;
        self.mode = ServiceMode::ShutDown;
        debug!(service = self.name, "activation service shut down");
    }
}

impl<O: VisibilityObserver> Drop for ActivationService<O> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<O: VisibilityObserver> fmt::Debug for ActivationService<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationService")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("registered", &self.states.len())
            .field("queued", &self.queue.len())
            .field("observed", &self.observed.len())
            .finish()
    }
}
