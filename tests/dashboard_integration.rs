//! ---
//! pwrmon_section: "15-testing"
//! pwrmon_subsection: "integration-tests"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "End-to-end runs of the seeded dashboard, tickers and frames."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
use std::time::Duration;

use chrono::{Local, TimeZone};
use pwrmon_common::config::AppConfig;
use pwrmon_common::time::wall_clock_now;
use pwrmon_core::{
    run_tick, ActivationOptions, ActivationService, DashboardFrame, DashboardState,
    ElementBounds, ElementId, TickKind, TickerSources, TrackingObserver, UpdateScheduler,
    Viewport,
};
use pwrmon_sim::{DashboardView, SampleGenerator, SeededSource, SequenceSource};

fn seeded(config: &AppConfig, seed: u64) -> DashboardState {
    let now = Local.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
    let mut generator = SampleGenerator::new(SeededSource::new(seed));
    DashboardState::seed(config, &mut generator, now)
}

#[test]
fn same_seed_gives_same_dashboard() {
    let config = AppConfig::default();
    let a = DashboardFrame::build(&seeded(&config, 77), DashboardView::SinglePhase, "%H:%M")
        .unwrap();
    let b = DashboardFrame::build(&seeded(&config, 77), DashboardView::SinglePhase, "%H:%M")
        .unwrap();
    assert_eq!(a, b);
    let c = DashboardFrame::build(&seeded(&config, 78), DashboardView::SinglePhase, "%H:%M")
        .unwrap();
    assert_ne!(a.table, c.table);
}

#[tokio::test(start_paused = true)]
async fn ten_minutes_of_ticks_keep_every_window_bounded() {
    let config = AppConfig::default();
    let dashboard = seeded(&config, 5).into_shared();
    let handle = UpdateScheduler::new(dashboard.clone(), config.schedule.clone())
        .start(TickerSources::seeded(Some(5)))
        .unwrap();

    // 20 x 31.25 s never lands exactly on a ticker deadline
    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(31_250)).await;
        let state = dashboard.lock();
        for (_, window) in state.charts() {
            assert_eq!(window.len(), config.simulation.chart_window);
        }
        assert_eq!(state.log().len(), config.table.capacity);
        let pf = state.snapshot().get("power_factor").unwrap();
        assert!((0.7..=1.0).contains(&pf), "power factor {pf} escaped clamp");
    }
    {
        let state = dashboard.lock();
        assert_eq!(state.ticks(TickKind::Fast), 312);
        assert_eq!(state.ticks(TickKind::History), 20);
        assert_eq!(state.ticks(TickKind::Log), 20);
    }
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn teardown_freezes_the_frame() {
    let config = AppConfig::default();
    let dashboard = seeded(&config, 6).into_shared();
    let handle = UpdateScheduler::new(dashboard.clone(), config.schedule.clone())
        .start(TickerSources::seeded(Some(6)))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(65)).await;
    handle.shutdown().await.unwrap();

    let before = DashboardFrame::build(&dashboard.lock(), DashboardView::SinglePhase, "%H:%M:%S")
        .unwrap();
    tokio::time::sleep(Duration::from_secs(300)).await;
    let mut generator = SampleGenerator::new(SequenceSource::constant(0.0));
    assert!(!run_tick(&dashboard, TickKind::History, &mut generator, wall_clock_now()));
    let after = DashboardFrame::build(&dashboard.lock(), DashboardView::SinglePhase, "%H:%M:%S")
        .unwrap();
    assert_eq!(before, after);
}

#[test]
fn seeding_survives_unvalidated_history_spacing() {
    let mut config = AppConfig::default();
    config.schedule.history_spacing = Duration::from_secs(10_000_000_000_000);
    let state = seeded(&config, 3);
    for (_, window) in state.charts() {
        assert_eq!(window.len(), config.simulation.chart_window);
    }
    assert_eq!(state.log().len(), config.table.capacity);
}

#[test]
fn frame_json_exposes_renderer_inputs() {
    let config = AppConfig::default();
    let frame = DashboardFrame::build(&seeded(&config, 9), DashboardView::SinglePhase, "%H:%M")
        .unwrap();
    let json = serde_json::to_value(&frame).unwrap();
    assert_eq!(json["view"], "single-phase");
    assert_eq!(json["cards"][0]["title"], "Voltage");
    assert_eq!(json["cards"][0]["color_tag"], "blue");
    assert_eq!(json["charts"][0]["points"].as_array().unwrap().len(), 6);
    assert_eq!(json["table"].as_array().unwrap().len(), 12);
    assert_eq!(json["pie"][3]["percentage"], 16.0);
}

#[test]
fn scrolling_activates_each_chart_once() {
    let config = AppConfig::default();
    let mut service = ActivationService::new(
        "animation",
        ActivationOptions::animation(&config.activation),
        Some(TrackingObserver::new()),
        false,
    );
    let charts: Vec<(ElementId, ElementBounds)> = (0..4)
        .map(|index| {
            (
                ElementId::new(format!("chart-{index}")),
                ElementBounds {
                    top: index * 10,
                    height: 10,
                },
            )
        })
        .collect();
    for (id, _) in &charts {
        service.register(id.clone());
    }
    assert_eq!(service.process_next_batch(), 4);

    let mut activations = 0;
    for top in [0, 5, 15, 25, 0, 30] {
        let viewport = Viewport::new(top, 10);
        let margin = service.options().margin;
        let entries: Vec<_> = charts
            .iter()
            .filter(|(id, _)| service.observed().any(|observed| observed == id))
            .map(|(id, bounds)| viewport.entry(id.clone(), *bounds, margin))
            .collect();
        activations += service.on_intersection(&entries).len();
    }
    assert_eq!(activations, 4);
    assert_eq!(service.active_count(), 4);
    assert_eq!(service.observer().unwrap().unobserve_calls(), 4);
}
