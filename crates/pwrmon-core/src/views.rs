//! ---
//! pwrmon_section: "02-presentation"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Stateless mapping from dashboard state to renderer inputs."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
use pwrmon_common::config::{ColorTag, Phase, ValueRange};
use pwrmon_common::time::display_time;
use pwrmon_sim::error::Result as SimResult;
use pwrmon_sim::{DashboardView, LogRow};
use serde::Serialize;

use crate::store::DashboardState;

/// Smallest bar height, so low readings stay visible.
pub const BAR_FLOOR_PERCENT: f64 = 5.0;

/// Format `value` with a fixed number of decimals.
pub fn format_reading(value: f64, precision: u8) -> String {
    format!("{:.*}", usize::from(precision), value)
}

/// Bar height for `value` normalized against `range`, floored at 5 %.
pub fn bar_percent(value: f64, range: &ValueRange) -> f64 {
    let span = range.span();
    if span <= 0.0 {
        return 100.0;
    }
    (((value - range.min) / span) * 100.0).clamp(BAR_FLOOR_PERCENT, 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardInput {
    pub channel: String,
    pub title: String,
    pub value: String,
    pub unit: String,
    pub color_tag: ColorTag,
    pub trend_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub time: String,
    pub value: f64,
    pub label: String,
    pub bar_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartInput {
    pub channel: String,
    pub title: String,
    pub unit: String,
    pub color_tag: ColorTag,
    pub display_range: ValueRange,
    pub points: Vec<ChartPoint>,
    /// Observed extremes of the window, for the range caption.
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub time: String,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub energy: f64,
    pub status: String,
}

impl TableRow {
    /// Display cells with two decimals, in column order.
    pub fn cells(&self) -> [String; 6] {
        [
            self.time.clone(),
            format_reading(self.voltage, 2),
            format_reading(self.current, 2),
            format_reading(self.power, 2),
            format_reading(self.energy, 2),
            self.status.clone(),
        ]
    }
}

impl From<&LogRow> for TableRow {
    fn from(row: &LogRow) -> Self {
        Self {
            time: row.time.clone(),
            voltage: row.voltage,
            current: row.current,
            power: row.power,
            energy: row.energy,
            status: row.status.clone(),
        }
    }
}

/// Pie slice; `percentage` is the configured share and ignores `value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub color_hex: String,
    pub percentage: f64,
}

/// Everything a renderer needs for one dashboard view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardFrame {
    pub view: DashboardView,
    pub clock: String,
    pub cards: Vec<CardInput>,
    pub charts: Vec<ChartInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub table: Vec<TableRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pie: Vec<PieSlice>,
}

impl DashboardFrame {
    pub fn build(
        state: &DashboardState,
        view: DashboardView,
        clock_format: &str,
    ) -> SimResult<Self> {
        let snapshot = state.snapshot();
        let channels = state.channels();

        let mut cards = Vec::new();
        let mut charts = Vec::new();
        for (channel_id, channel) in channels.in_view(view) {
            let reading = snapshot.get(channel_id)?;
            cards.push(CardInput {
                channel: channel_id.to_owned(),
                title: channel.label.clone(),
                value: format_reading(reading, channel.card_precision),
                unit: channel.unit.clone(),
                color_tag: channel.color,
                trend_percent: channel.trend_percent,
                phase: channel.phase,
            });

            if !channel.chart {
                continue;
            }
            let window = state.chart(channel_id)?;
            let range = channel.effective_display_range();
            let points = window
                .iter()
                .map(|sample| ChartPoint {
                    time: sample.time().to_owned(),
                    value: sample.value(),
                    label: format_reading(sample.value(), channel.precision),
                    bar_percent: bar_percent(sample.value(), &range),
                })
                .collect::<Vec<_>>();
            let (min, max) = points.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(min, max), point| (min.min(point.value), max.max(point.value)),
            );
            charts.push(ChartInput {
                channel: channel_id.to_owned(),
                title: channel.label.clone(),
                unit: channel.unit.clone(),
                color_tag: channel.effective_chart_color(),
                display_range: range,
                points,
                min: if min.is_finite() { min } else { range.min },
                max: if max.is_finite() { max } else { range.max },
            });
        }

        let (table_title, table, pie) = match view {
            DashboardView::SinglePhase => {
                let table = state.log().iter().map(TableRow::from).collect();
                let mut pie = Vec::new();
                for (channel_id, channel) in channels.pie_slices() {
                    if let Some(slice) = &channel.pie {
                        pie.push(PieSlice {
                            label: channel.label.clone(),
                            value: snapshot.get(channel_id)?,
                            color_hex: slice.color_hex.clone(),
                            percentage: slice.share,
                        });
                    }
                }
                (Some(state.table_config().title.clone()), table, pie)
            }
            DashboardView::ThreePhase => (None, Vec::new(), Vec::new()),
        };

        Ok(Self {
            view,
            clock: display_time(&snapshot.updated_at(), clock_format),
            cards,
            charts,
            table_title,
            table,
            pie,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use pwrmon_common::config::AppConfig;
    use pwrmon_sim::{SampleGenerator, SeededSource, SequenceSource};

    fn state() -> DashboardState {
        let now = Local.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        let mut generator = SampleGenerator::new(SeededSource::new(21));
        DashboardState::seed(&AppConfig::default(), &mut generator, now)
    }

    #[test]
    fn bar_heights_are_floored_and_capped() {
        let range = ValueRange::new(200.0, 240.0);
        assert_eq!(bar_percent(220.0, &range), 50.0);
        assert_eq!(bar_percent(190.0, &range), BAR_FLOOR_PERCENT);
        assert_eq!(bar_percent(201.0, &range), BAR_FLOOR_PERCENT);
        assert_eq!(bar_percent(260.0, &range), 100.0);
    }

    #[test]
    fn single_phase_frame_has_cards_table_and_pie() {
        let frame = DashboardFrame::build(&state(), DashboardView::SinglePhase, "%H:%M").unwrap();
        assert_eq!(frame.clock, "12:00");
        let titles: Vec<&str> = frame.cards.iter().map(|card| card.title.as_str()).collect();
        assert_eq!(titles, vec!["Voltage", "Current", "Power", "Cos φ"]);
        assert_eq!(frame.cards[0].value, "210.08");
        assert_eq!(frame.cards[3].value, "0.891");
        assert_eq!(frame.cards[1].trend_percent, -1.2);
        assert_eq!(frame.charts.len(), 4);
        assert!(frame.charts.iter().all(|chart| chart.points.len() == 6));
        assert_eq!(frame.table.len(), 12);
        assert_eq!(frame.table_title.as_deref(), Some("Monitoring Data"));
        let shares: Vec<f64> = frame.pie.iter().map(|slice| slice.percentage).collect();
        assert_eq!(shares, vec![36.0, 28.0, 20.0, 16.0]);
    }

    #[test]
    fn pie_percentages_ignore_readings() {
        let mut state = state();
        let mut generator = SampleGenerator::new(SequenceSource::constant(0.99));
        for _ in 0..50 {
            state.apply_fast_tick(&mut generator, Local::now());
        }
        let frame = DashboardFrame::build(&state, DashboardView::SinglePhase, "%H:%M").unwrap();
        assert_eq!(frame.pie[0].percentage, 36.0);
        assert_eq!(frame.pie[0].value, state.snapshot().get("voltage").unwrap());
    }

    #[test]
    fn three_phase_frame_has_no_table_or_pie() {
        let frame = DashboardFrame::build(&state(), DashboardView::ThreePhase, "%H:%M").unwrap();
        assert_eq!(frame.cards.len(), 6);
        assert!(frame.cards.iter().all(|card| card.phase.is_some()));
        assert!(frame.table.is_empty());
        assert!(frame.pie.is_empty());
        assert_eq!(frame.table_title, None);
    }

    #[test]
    fn chart_points_carry_formatted_labels() {
        let frame = DashboardFrame::build(&state(), DashboardView::SinglePhase, "%H:%M").unwrap();
        let power = frame
            .charts
            .iter()
            .find(|chart| chart.channel == "power")
            .unwrap();
        for point in &power.points {
            assert!(!point.label.contains('.'));
            assert!((BAR_FLOOR_PERCENT..=100.0).contains(&point.bar_percent));
            assert!(power.min <= point.value && point.value <= power.max);
        }
        assert_eq!(power.color_tag, ColorTag::Blue);
    }

    #[test]
    fn frame_serializes_to_json() {
        let frame = DashboardFrame::build(&state(), DashboardView::ThreePhase, "%H:%M").unwrap();
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["view"], "three-phase");
        assert_eq!(json["cards"].as_array().unwrap().len(), 6);
        assert!(json.get("pie").is_none());
    }

    #[test]
    fn table_cells_use_two_decimals() {
        let row = TableRow {
            time: "10:00".to_owned(),
            voltage: 215.0,
            current: 4.5,
            power: 950.0,
            energy: 151.234,
            status: "Normal".to_owned(),
        };
        assert_eq!(
            row.cells(),
            [
                "10:00".to_owned(),
                "215.00".to_owned(),
                "4.50".to_owned(),
                "950.00".to_owned(),
                "151.23".to_owned(),
                "Normal".to_owned()
            ]
        );
    }
}
