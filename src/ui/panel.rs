//! Preview of the e-paper panel.
//!
//! Draws the composed [`Screen`] inside a frame the size of the physical
//! display, with gauge bars to the right of the lines that carry one.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, LineGauge, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::Channel;
use crate::ui::compose::{Screen, RAIN_LINE};

/// Width of the gauge column next to the text.
const GAUGE_WIDTH: u16 = 12;

/// Render the panel preview centered in `area`.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(screen) = &app.screen else {
        let paragraph = Paragraph::new("Waiting for first render...")
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM));
        frame.render_widget(paragraph, area);
        return;
    };

    let lines = screen.status_lines(&app.layout);
    let text_width = app.layout.width as u16;
    let panel = centered(
        area,
        text_width + GAUGE_WIDTH + 3,
        lines.len() as u16 + 2,
    );

    let border_style = match screen {
        Screen::Alert { .. } => app.theme.alert_style(),
        _ => Style::default().fg(app.theme.border),
    };
    let block = Block::default()
        .title(" e-paper ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(border_style);
    let inner = block.inner(panel);
    frame.render_widget(block, panel);

    let rows = Layout::vertical(vec![Constraint::Length(1); lines.len()]).split(inner);
    for (index, (line, row)) in lines.iter().zip(rows.iter()).enumerate() {
        let [text_area, gauge_area] =
            Layout::horizontal([Constraint::Length(text_width + 1), Constraint::Min(0)])
                .areas(*row);

        let style = line_style(app, screen, index);
        frame.render_widget(Paragraph::new(Span::styled(line.text.as_str(), style)), text_area);

        if let Some(ratio) = line.gauge {
            let gauge = LineGauge::default()
                .filled_style(app.theme.gauge)
                .unfilled_style(Style::default().add_modifier(Modifier::DIM))
                .label("")
                .ratio(ratio);
            frame.render_widget(gauge, gauge_area);
        }
    }
}

fn line_style(app: &App, screen: &Screen, index: usize) -> Style {
    match screen {
        Screen::Alert { .. } => app.theme.alert_style(),
        Screen::Waiting { .. } => app.theme.text_style().add_modifier(Modifier::ITALIC),
        Screen::Status { lines, rain } => {
            if index == RAIN_LINE {
                app.theme.rain_style(*rain)
            } else if lines
                .get(index)
                .is_some_and(|l| l.text.contains("ERROR"))
            {
                Style::default().fg(app.theme.fault)
            } else {
                app.theme.text_style()
            }
        }
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// One-line summary of channel ages shown under the panel.
pub fn render_ages(frame: &mut Frame, app: &App, area: Rect) {
    let now = std::time::SystemTime::now();
    let store = app.monitor.store();
    let mut spans = Vec::new();
    for channel in Channel::ALL {
        let age = match store.record(channel) {
            Some(_) => crate::data::duration::format_duration(store.age(channel, now)),
            None => "-".to_string(),
        };
        spans.push(Span::styled(
            format!("{} ", channel.name()),
            Style::default().add_modifier(Modifier::DIM),
        ));
        spans.push(Span::raw(format!("{}  ", age)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}
