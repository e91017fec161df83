//! Theme configuration for the terminal preview.
//!
//! The e-paper panel is monochrome, so the preview mostly renders ink on
//! paper; colour is reserved for faults so they stand out on a terminal.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::RainStatus;

#[derive(Debug, Clone)]
pub struct Theme {
    /// Foreground for display text.
    pub ink: Color,
    /// Colour for device faults and ERROR fields.
    pub fault: Color,
    /// Colour for the service alert screen.
    pub critical: Color,
    /// Colour for an active rain status.
    pub rain: Color,
    /// Colour for borders and chrome.
    pub border: Color,
    /// Filled part of gauges.
    pub gauge: Style,
    /// Style for the header bar.
    pub header: Style,
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            ink: Color::White,
            fault: Color::Yellow,
            critical: Color::Red,
            rain: Color::Cyan,
            border: Color::Gray,
            gauge: Style::default().fg(Color::White),
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            ink: Color::Black,
            fault: Color::Magenta,
            critical: Color::Red,
            rain: Color::Blue,
            border: Color::DarkGray,
            gauge: Style::default().fg(Color::Black),
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.ink)
    }

    /// Style for the rain line.
    pub fn rain_style(&self, status: RainStatus) -> Style {
        match status {
            s if s.is_fault() => Style::default().fg(self.fault).add_modifier(Modifier::BOLD),
            RainStatus::Rain => Style::default().fg(self.rain).add_modifier(Modifier::BOLD),
            RainStatus::PreRain => Style::default().fg(self.rain),
            _ => self.text_style(),
        }
    }

    pub fn alert_style(&self) -> Style {
        Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
    }
}
