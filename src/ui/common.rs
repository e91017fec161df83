//! Common UI components shared across views.
//!
//! This module contains the header bar, status bar, and help overlay.

use std::time::SystemTime;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_duration;

/// Render the header bar: rain status, service state and traffic counters.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let rain = app.monitor.rain().classify(SystemTime::now());
    let down = app.monitor.health().down_services();

    let services = if down.is_empty() {
        Span::styled("services ok", Style::default().add_modifier(Modifier::DIM))
    } else {
        Span::styled(format!("{} down", down.len()), app.theme.alert_style())
    };

    let line = Line::from(vec![
        Span::styled(" ENVPAPER ", app.theme.header),
        Span::raw("│ rain "),
        Span::styled(rain.status.token(), app.theme.rain_style(rain.status)),
        Span::raw(" │ "),
        services,
        Span::raw(format!(
            " │ {} msgs, {} readings",
            app.deliveries, app.accepted
        )),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar with source state and controls.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph = Paragraph::new(format!(" {} ", msg)).style(app.theme.header);
        frame.render_widget(paragraph, area);
        return;
    }

    let rendered = match app.last_render {
        Some(at) => {
            let next = app.render_interval().saturating_sub(at.elapsed());
            format!("next render in {}", format_duration(next))
        }
        None => "not rendered yet".to_string(),
    };

    let status = match app.source_error() {
        Some(err) => format!(
            " {} ({}) | {} | r:render ?:help q:quit",
            app.source_description(),
            err,
            rendered
        ),
        None => format!(
            " {} | {} | r:render ?:help q:quit",
            app.source_description(),
            rendered
        ),
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<8}", k), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(what),
        ])
    };
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        key("r", "Render now"),
        key("?", "Toggle this help"),
        key("q / Esc", "Quit"),
        key("Ctrl-C", "Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(help_text.len() as u16 + 2),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, popup, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(36),
        Constraint::Fill(1),
    ])
    .areas(middle);

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(help_text).block(block), popup);
}
