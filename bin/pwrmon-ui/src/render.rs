//! ---
//! pwrmon_section: "02-presentation"
//! pwrmon_subsection: "binary"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "ratatui renderers for cards, charts, pie, table and banner."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
use pwrmon_common::config::{ColorTag, UiConfig};
use pwrmon_core::{AssetState, CardInput, ChartInput, DashboardFrame, PieSlice, TableRow};
use pwrmon_sim::DashboardView;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Row, Table, Tabs};
use ratatui::Frame;

use crate::app::{App, Section, SectionKind};

const HEADER_HEIGHT: u16 = 4;

fn tag_color(tag: ColorTag) -> Color {
    hex_color(tag.hex())
}

fn hex_color(hex: &str) -> Color {
    hex.parse::<Color>().unwrap_or(Color::Gray)
}

/// Header, scrollable body and help line.
fn screen_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .split(area)
}

pub fn body_area(area: Rect) -> Rect {
    screen_layout(area)[1]
}

pub fn draw(
    frame: &mut Frame,
    app: &App,
    dashboard: &DashboardFrame,
    sections: &[Section],
    ui: &UiConfig,
) {
    let layout = screen_layout(frame.size());

    draw_header(frame, layout[0], dashboard, ui);

    let body = layout[1];
    for section in sections {
        let Some(area) = visible_rect(body, section, app.scroll()) else {
            continue;
        };
        match section.kind {
            SectionKind::Banner => draw_banner(frame, area, app.banner()),
            _ if !app.is_revealed(&section.id) => draw_placeholder(frame, area),
            SectionKind::Card(index) => {
                let count = dashboard.cards.len().max(1) as u32;
                let columns = Layout::horizontal(
                    (0..count).map(|_| Constraint::Ratio(1, count)).collect::<Vec<_>>(),
                )
                .split(area);
                if let (Some(card), Some(column)) =
                    (dashboard.cards.get(index), columns.get(index))
                {
                    draw_card(frame, *column, card);
                }
            }
            SectionKind::Chart(index) => {
                if let Some(chart) = dashboard.charts.get(index) {
                    draw_chart(frame, area, chart);
                }
            }
            SectionKind::Pie => draw_pie(frame, area, &dashboard.pie),
            SectionKind::Table => draw_table(
                frame,
                area,
                dashboard.table_title.as_deref().unwrap_or_default(),
                &dashboard.table,
            ),
        }
    }

    let help = Paragraph::new(
        "↑/↓ or j/k scroll  PgUp/PgDn page  g/G top/bottom  tab switch view  q quit",
    )
    .style(Style::default().fg(Color::Gray));
    frame.render_widget(help, layout[2]);
}

/// Screen rectangle for the on-screen part of `section`, if any.
fn visible_rect(body: Rect, section: &Section, scroll: i32) -> Option<Rect> {
    let top = section.bounds.top - scroll;
    let bottom = top + i32::from(section.bounds.height);
    let start = top.max(0);
    let end = bottom.min(i32::from(body.height));
    if end <= start {
        return None;
    }
    Some(Rect {
        x: body.x,
        y: body.y + u16::try_from(start).ok()?,
        width: body.width,
        height: u16::try_from(end - start).ok()?,
    })
}

fn draw_header(frame: &mut Frame, area: Rect, dashboard: &DashboardFrame, ui: &UiConfig) {
    let rows = Layout::vertical([Constraint::Length(2), Constraint::Length(2)]).split(area);
    let title = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                ui.title.as_str(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled(dashboard.clock.as_str(), Style::default().fg(Color::White)),
        ]),
        Line::from(Span::styled(ui.subtitle.as_str(), Style::default().fg(Color::Gray))),
    ]);
    frame.render_widget(title, rows[0]);

    let selected = match dashboard.view {
        DashboardView::SinglePhase => 0,
        DashboardView::ThreePhase => 1,
    };
    let tabs = Tabs::new(vec!["Single Phase", "Three Phase"])
        .select(selected)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(tabs, rows[1]);
}

fn draw_placeholder(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let dots = Paragraph::new("…")
        .style(Style::default().fg(Color::DarkGray))
        .block(block);
    frame.render_widget(dots, area);
}

fn draw_banner(frame: &mut Frame, area: Rect, banner: Option<&AssetState>) {
    let text = match banner.and_then(AssetState::content) {
        Some(content) => content.to_owned(),
        None => String::new(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::Cyan)).block(block),
        area,
    );
}

fn draw_card(frame: &mut Frame, area: Rect, card: &CardInput) {
    let color = tag_color(card.color_tag);
    let (arrow, trend_color) = if card.trend_percent >= 0.0 {
        ("▲", Color::Green)
    } else {
        ("▼", Color::Red)
    };
    let lines = vec![
        Line::from(vec![
            Span::styled(
                card.value.as_str(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::raw(card.unit.as_str()),
        ]),
        Line::from(Span::styled(
            format!("{arrow} {:.1}%", card.trend_percent.abs()),
            Style::default().fg(trend_color),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(card.title.as_str());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_chart(frame: &mut Frame, area: Rect, chart: &ChartInput) {
    let color = tag_color(chart.color_tag);
    let bars: Vec<Bar> = chart
        .points
        .iter()
        .map(|point| {
            Bar::default()
                .value(point.bar_percent.round() as u64)
                .label(Line::from(point.time.as_str()))
                .text_value(point.label.clone())
                .style(Style::default().fg(color))
        })
        .collect();
    let count = u16::try_from(bars.len().max(1)).unwrap_or(1);
    let bar_width = (area.width.saturating_sub(2) / count).saturating_sub(1).clamp(3, 12);
    let title = format!(
        "{} ({})  range {:.1} - {:.1}",
        chart.title, chart.unit, chart.min, chart.max
    );
    let widget = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .max(100);
    frame.render_widget(widget, area);
}

fn draw_pie(frame: &mut Frame, area: Rect, slices: &[PieSlice]) {
    let inner_width = usize::from(area.width.saturating_sub(2));
    let mut strip = Vec::new();
    for slice in slices {
        let cells = ((slice.percentage / 100.0) * inner_width as f64).round() as usize;
        strip.push(Span::styled(
            "█".repeat(cells),
            Style::default().fg(hex_color(&slice.color_hex)),
        ));
    }
    let mut lines = vec![Line::from(strip), Line::default()];
    for slice in slices {
        lines.push(Line::from(vec![
            Span::styled("■ ", Style::default().fg(hex_color(&slice.color_hex))),
            Span::raw(format!(
                "{:<10} {:>3}%  {:.2}",
                slice.label, slice.percentage, slice.value
            )),
        ]));
    }
    let block = Block::default().borders(Borders::ALL).title("Load Distribution");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_table(frame: &mut Frame, area: Rect, title: &str, rows: &[TableRow]) {
    let header = Row::new([
        "Time",
        "Voltage (V)",
        "Current (A)",
        "Power (W)",
        "Energy (kWh)",
        "Status",
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));
    let body = rows
        .iter()
        .map(|row| Row::new(row.cells()).style(Style::default().fg(Color::White)));
    let widths = [
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(11),
        Constraint::Length(13),
        Constraint::Min(8),
    ];
    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pwrmon_core::{ElementBounds, ElementId};

    fn section(top: i32, height: u16) -> Section {
        Section {
            id: ElementId::new("x"),
            kind: SectionKind::Pie,
            bounds: ElementBounds { top, height },
        }
    }

    #[test]
    fn visible_rect_clips_to_body() {
        let body = Rect::new(0, 4, 80, 20);
        assert_eq!(visible_rect(body, &section(0, 5), 0), Some(Rect::new(0, 4, 80, 5)));
        assert_eq!(visible_rect(body, &section(0, 5), 3), Some(Rect::new(0, 4, 80, 2)));
        assert_eq!(visible_rect(body, &section(18, 5), 0), Some(Rect::new(0, 22, 80, 2)));
        assert_eq!(visible_rect(body, &section(30, 5), 0), None);
        assert_eq!(visible_rect(body, &section(0, 5), 5), None);
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(hex_color("#3B82F6"), Color::Rgb(0x3B, 0x82, 0xF6));
        assert_eq!(hex_color("nonsense"), Color::Gray);
    }

    #[test]
    fn palette_tags_use_their_hex_shade() {
        assert_eq!(tag_color(ColorTag::Blue), Color::Rgb(0x3B, 0x82, 0xF6));
        assert_eq!(tag_color(ColorTag::Red), Color::Rgb(0xEF, 0x44, 0x44));
        assert_eq!(tag_color(ColorTag::Gray), Color::Rgb(0x6B, 0x72, 0x80));
    }
}
