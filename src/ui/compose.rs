//! Turns a [`StatusView`] into the lines shown on the display.
//!
//! Composition is a pure function of the view and the line layout, so the
//! same inputs always produce the same [`Screen`].

use std::time::Duration;

use serde::Serialize;

use crate::data::duration::format_duration;
use crate::data::{Channel, Classification, RainStatus, StatusView};

const ERROR_TEXT: &str = "ERROR";
const ELLIPSIS: char = '…';

/// Index of the rain line on a status screen.
pub const RAIN_LINE: usize = 3;

/// Value range a gauge spans, in the channel's unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeRange {
    pub min: f64,
    pub max: f64,
}

impl GaugeRange {
    /// Position of `value` within the range, clamped to `0.0..=1.0`.
    pub fn ratio(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

pub const TEMPERATURE_GAUGE: GaugeRange = GaugeRange { min: -10.0, max: 50.0 };
pub const HUMIDITY_GAUGE: GaugeRange = GaugeRange { min: 0.0, max: 100.0 };
pub const CPU_GAUGE: GaugeRange = GaugeRange { min: 30.0, max: 60.0 };

/// Display geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLayout {
    /// Maximum characters per line.
    pub width: usize,
}

impl Default for LineLayout {
    fn default() -> Self {
        Self { width: 24 }
    }
}

/// One rendered line plus an optional gauge fill ratio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusLine {
    pub text: String,
    pub gauge: Option<f64>,
}

impl StatusLine {
    fn plain(text: String) -> Self {
        Self { text, gauge: None }
    }
}

/// What the display shows this cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    /// First render after a cold start with nothing recovered.
    Waiting { retry_in: Duration },
    Status {
        lines: Vec<StatusLine>,
        /// The rain status the rain line was composed from.
        rain: RainStatus,
    },
    /// A monitored service is down; overrides everything else.
    Alert { services: Vec<String> },
}

impl Screen {
    pub fn kind(&self) -> &'static str {
        match self {
            Screen::Waiting { .. } => "waiting",
            Screen::Status { .. } => "status",
            Screen::Alert { .. } => "alert",
        }
    }

    /// The screen's lines, fitted to the layout they were composed for.
    pub fn status_lines(&self, layout: &LineLayout) -> Vec<StatusLine> {
        match self {
            Screen::Status { lines, .. } => lines.clone(),
            Screen::Waiting { retry_in } => vec![StatusLine::plain(fit(
                &format!("Please wait {}", format_duration(*retry_in)),
                layout.width,
            ))],
            Screen::Alert { services } => {
                let mut lines = vec![StatusLine::plain(fit("!! ALERT !!", layout.width))];
                lines.extend(
                    services
                        .iter()
                        .map(|name| StatusLine::plain(fit(name, layout.width))),
                );
                lines.push(StatusLine::plain(fit("SERVICE DOWN", layout.width)));
                lines
            }
        }
    }

    /// The rain status behind the rain line, if this is a status screen.
    pub fn rain_status(&self) -> Option<RainStatus> {
        match self {
            Screen::Status { rain, .. } => Some(*rain),
            _ => None,
        }
    }

    pub fn lines(&self, layout: &LineLayout) -> Vec<String> {
        self.status_lines(layout).into_iter().map(|l| l.text).collect()
    }
}

/// Build the screen for a view.
pub fn compose(view: &StatusView, layout: &LineLayout) -> Screen {
    if view.critical_alert() {
        return Screen::Alert {
            services: view.down_services.clone(),
        };
    }
    if let Some(retry_in) = view.waiting {
        return Screen::Waiting { retry_in };
    }

    let width = layout.width;
    let temp = view.channel(Channel::Temperature).fresh_value();
    let hum = view.channel(Channel::Humidity).fresh_value();
    let pi = view.channel(Channel::CpuTempPi).fresh_value();
    let ads = view.channel(Channel::CpuTempAds).fresh_value();
    let thi = view.channel(Channel::Thi).fresh_value();
    let co2 = view.channel(Channel::Co2).fresh_value();

    let lines = vec![
        StatusLine {
            text: fit(&format!("Temp:{}", field(temp, |v| format!("{:5.1}°C", v))), width),
            gauge: temp.map(|v| TEMPERATURE_GAUGE.ratio(v)),
        },
        StatusLine {
            text: fit(&format!("Hum:{}", field(hum, |v| format!("{:5.1}%", v))), width),
            gauge: hum.map(|v| HUMIDITY_GAUGE.ratio(v)),
        },
        StatusLine {
            text: fit(
                &format!(
                    "Pi5:{} / ADS:{}",
                    field(pi, |v| format!("{:.1}℃", v)),
                    field(ads, |v| format!("{:.1}℃", v))
                ),
                width,
            ),
            gauge: pi.map(|v| CPU_GAUGE.ratio(v)),
        },
        StatusLine::plain(rain_line(&view.rain, width)),
        StatusLine::plain(fit(
            &format!(
                "THI:{} / CO2:{}",
                field(thi, |v| format!("{:.1}", v)),
                field(co2, |v| format!("{:.0}ppm", v))
            ),
            width,
        )),
    ];

    Screen::Status {
        lines,
        rain: view.rain.status,
    }
}

fn field(value: Option<f64>, format: impl Fn(f64) -> String) -> String {
    value.map(format).unwrap_or_else(|| ERROR_TEXT.to_string())
}

/// Status word, intensity letter, then the change rate if it fits.
pub fn rain_line(rain: &Classification, width: usize) -> String {
    let mut head = rain.status.token().to_string();
    if let Some(intensity) = rain.intensity {
        head.push(intensity.letter());
    }

    match rain.change_rate {
        Some(rate) => {
            let full = format!("{} Δ:{:.1}%", head, rate);
            if full.chars().count() <= width {
                full
            } else {
                fit(&head, width)
            }
        }
        None => fit(&head, width),
    }
}

/// Truncate to `width` characters, marking the cut with an ellipsis.
pub fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push(ELLIPSIS);
    out
}
