//! ---
//! pwrmon_section: "02-presentation"
//! pwrmon_subsection: "binary"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Scroll, view and visibility state for the terminal dashboard."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use pwrmon_common::config::AppConfig;
use pwrmon_core::{
    ActivationOptions, ActivationService, AssetState, DashboardFrame, ElementBounds, ElementId,
    FileAssetLoader, IntersectionEntry, LazyAssets, TrackingObserver, Viewport,
};
use pwrmon_logging::{pm_info, LogContext};
use pwrmon_sim::DashboardView;

pub const BANNER_HEIGHT: u16 = 7;
pub const CARD_HEIGHT: u16 = 5;
pub const CHART_HEIGHT: u16 = 11;
pub const PIE_HEIGHT: u16 = 8;

const BANNER_ID: &str = "banner";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SectionKind {
    Banner,
    Card(usize),
    Chart(usize),
    Pie,
    Table,
}

/// One scrollable element of the current view, positioned in content rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: ElementId,
    pub kind: SectionKind,
    pub bounds: ElementBounds,
}

/// Stack the frame's widgets top to bottom. Cards share a single row.
pub fn layout_sections(frame: &DashboardFrame, has_banner: bool) -> Vec<Section> {
    let view = frame.view.as_str();
    let mut sections = Vec::new();
    let mut top = 0i32;
    let mut push = |id: String, kind: SectionKind, top: i32, height: u16| {
        sections.push(Section {
            id: ElementId::new(id),
            kind,
            bounds: ElementBounds { top, height },
        });
    };

    if has_banner {
        push(BANNER_ID.to_owned(), SectionKind::Banner, top, BANNER_HEIGHT);
        top += i32::from(BANNER_HEIGHT);
    }
    for (index, card) in frame.cards.iter().enumerate() {
        push(format!("{view}/card/{}", card.channel), SectionKind::Card(index), top, CARD_HEIGHT);
    }
    if !frame.cards.is_empty() {
        top += i32::from(CARD_HEIGHT);
    }
    for (index, chart) in frame.charts.iter().enumerate() {
        push(format!("{view}/chart/{}", chart.channel), SectionKind::Chart(index), top, CHART_HEIGHT);
        top += i32::from(CHART_HEIGHT);
    }
    if !frame.pie.is_empty() {
        push(format!("{view}/pie"), SectionKind::Pie, top, PIE_HEIGHT);
        top += i32::from(PIE_HEIGHT);
    }
    if !frame.table.is_empty() {
        let height = u16::try_from(frame.table.len()).unwrap_or(u16::MAX).saturating_add(4);
        push(format!("{view}/table"), SectionKind::Table, top, height);
    }
    sections
}

pub fn content_height(sections: &[Section]) -> i32 {
    sections
        .iter()
        .map(|section| section.bounds.top + i32::from(section.bounds.height))
        .max()
        .unwrap_or(0)
}

pub struct App {
    pub view: DashboardView,
    scroll: i32,
    viewport_height: u16,
    content_height: i32,
    animation: ActivationService<TrackingObserver>,
    assets: LazyAssets<FileAssetLoader, TrackingObserver>,
    banner: Option<PathBuf>,
}

impl App {
    pub fn new(config: &AppConfig, view: DashboardView, reduced_motion: bool) -> Self {
        let activation = &config.activation;
        let observer = || {
            activation
                .observer_available
                .then(TrackingObserver::new)
        };
        let reduced_motion = reduced_motion || activation.reduced_motion;
        let animation = ActivationService::new(
            "animation",
            ActivationOptions::animation(activation),
            observer(),
            reduced_motion,
        );
        let lazy = ActivationService::new(
            "lazy-assets",
            ActivationOptions::lazy_assets(activation),
            observer(),
            reduced_motion,
        );
        let mut assets = LazyAssets::new(FileAssetLoader::default(), lazy);
        if let Some(banner) = &config.ui.banner {
            assets.register(BANNER_ID, banner.clone());
        }
        Self {
            view,
            scroll: 0,
            viewport_height: 1,
            content_height: 0,
            animation,
            assets,
            banner: config.ui.banner.clone(),
        }
    }

    pub fn has_banner(&self) -> bool {
        self.banner.is_some()
    }

    pub fn scroll(&self) -> i32 {
        self.scroll
    }

    pub fn set_viewport_height(&mut self, height: u16) {
        self.viewport_height = height.max(1);
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn max_scroll(&self) -> i32 {
        (self.content_height - i32::from(self.viewport_height)).max(0)
    }

    pub fn scroll_by(&mut self, delta: i32) {
        self.scroll = (self.scroll + delta).clamp(0, self.max_scroll());
    }

    pub fn page_step(&self) -> i32 {
        i32::from(self.viewport_height.max(1))
    }

    pub fn scroll_to_start(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_to_end(&mut self) {
        self.scroll = self.max_scroll();
    }

    pub fn toggle_view(&mut self) {
        self.view = self.view.toggled();
        self.scroll = 0;
        pm_info!(context = LogContext::new().with_view(self.view.as_str()), "view switched");
    }

    /// Register the view's elements, feed queued batches to the observers and
    /// report which observed elements intersect the viewport.
    pub fn update_visibility(&mut self, sections: &[Section], now: Instant) {
        self.content_height = content_height(sections);
        self.scroll = self.scroll.min(self.max_scroll());
        for section in sections {
            if section.kind != SectionKind::Banner {
                self.animation.register(section.id.clone());
            }
        }
        self.animation.poll_batches(now);
        self.assets.poll_batches(now);

        let viewport = Viewport::new(self.scroll, self.viewport_height);
        let bounds: HashMap<&ElementId, ElementBounds> = sections
            .iter()
            .map(|section| (&section.id, section.bounds))
            .collect();

        let margin = self.animation.options().margin;
        let entries = intersect(self.animation.observed(), &bounds, &viewport, margin);
        self.animation.on_intersection(&entries);

        let margin = self.assets.service().options().margin;
        let entries = intersect(self.assets.service().observed(), &bounds, &viewport, margin);
        self.assets.on_intersection(&entries);
    }

    pub fn is_revealed(&self, id: &ElementId) -> bool {
        self.animation.is_active(id)
    }

    pub fn banner(&self) -> Option<&AssetState> {
        self.assets.state(&ElementId::new(BANNER_ID))
    }

    pub fn shutdown(&mut self) {
        self.animation.shutdown();
        self.assets.shutdown();
    }
}

fn intersect<'a>(
    observed: impl Iterator<Item = &'a ElementId>,
    bounds: &HashMap<&ElementId, ElementBounds>,
    viewport: &Viewport,
    margin: u16,
) -> Vec<IntersectionEntry> {
    observed
        .filter_map(|id| {
            bounds
                .get(id)
                .map(|bounds| viewport.entry(id.clone(), *bounds, margin))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use pwrmon_core::DashboardState;
    use pwrmon_sim::{SampleGenerator, SeededSource};

    fn frame(config: &AppConfig, view: DashboardView) -> DashboardFrame {
        let now = Local.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        let mut generator = SampleGenerator::new(SeededSource::new(4));
        let state = DashboardState::seed(config, &mut generator, now);
        DashboardFrame::build(&state, view, "%H:%M").unwrap()
    }

    fn config_without_banner() -> AppConfig {
        let mut config = AppConfig::default();
        config.ui.banner = None;
        config
    }

    #[test]
    fn sections_stack_without_overlap() {
        let config = config_without_banner();
        let frame = frame(&config, DashboardView::SinglePhase);
        let sections = layout_sections(&frame, false);
        assert_eq!(sections.len(), 4 + 4 + 2);
        let charts: Vec<i32> = sections
            .iter()
            .filter(|section| matches!(section.kind, SectionKind::Chart(_)))
            .map(|section| section.bounds.top)
            .collect();
        assert_eq!(charts, vec![5, 16, 27, 38]);
        assert_eq!(content_height(&sections), 49 + 8 + 16);
    }

    #[test]
    fn scrolling_reveals_lower_sections_once() {
        let config = config_without_banner();
        let frame = frame(&config, DashboardView::SinglePhase);
        let sections = layout_sections(&frame, false);
        let mut app = App::new(&config, DashboardView::SinglePhase, false);
        app.set_viewport_height(20);

        let start = Instant::now();
        // first pass subscribes, second pass reports intersections
        app.update_visibility(&sections, start);
        app.update_visibility(&sections, start);
        let table = ElementId::new("single-phase/table");
        let first_card = ElementId::new("single-phase/card/voltage");
        assert!(app.is_revealed(&first_card));
        assert!(!app.is_revealed(&table));

        app.scroll_to_end();
        app.update_visibility(&sections, start);
        assert!(app.is_revealed(&table));

        app.scroll_to_start();
        app.update_visibility(&sections, start);
        assert!(app.is_revealed(&table));
    }

    #[test]
    fn reduced_motion_reveals_everything_immediately() {
        let config = config_without_banner();
        let frame = frame(&config, DashboardView::ThreePhase);
        let sections = layout_sections(&frame, false);
        let mut app = App::new(&config, DashboardView::ThreePhase, true);
        app.set_viewport_height(5);
        app.update_visibility(&sections, Instant::now());
        assert!(sections.iter().all(|section| app.is_revealed(&section.id)));
    }

    #[test]
    fn missing_banner_keeps_placeholder() {
        let mut config = AppConfig::default();
        config.ui.banner = Some(PathBuf::from("does/not/exist.txt"));
        let frame = frame(&config, DashboardView::SinglePhase);
        let sections = layout_sections(&frame, true);
        let mut app = App::new(&config, DashboardView::SinglePhase, false);
        app.set_viewport_height(20);
        let start = Instant::now();
        app.update_visibility(&sections, start);
        app.update_visibility(&sections, start);
        assert_eq!(app.banner(), Some(&AssetState::Failed));
    }

    #[test]
    fn toggling_resets_scroll() {
        let config = config_without_banner();
        let frame = frame(&config, DashboardView::SinglePhase);
        let sections = layout_sections(&frame, false);
        let mut app = App::new(&config, DashboardView::SinglePhase, false);
        app.set_viewport_height(10);
        app.update_visibility(&sections, Instant::now());
        app.scroll_by(12);
        assert_eq!(app.scroll(), 12);
        app.toggle_view();
        assert_eq!(app.view, DashboardView::ThreePhase);
        assert_eq!(app.scroll(), 0);
    }
}
