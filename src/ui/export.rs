//! JSON export of the composed screen for an external e-paper driver.
//!
//! ```json
//! {"kind": "status", "lines": ["Temp: 21.4°C", ...], "gauges": [0.52, null, ...]}
//! ```

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::{LineLayout, Screen};

#[derive(Debug, Serialize)]
struct ScreenExport<'a> {
    kind: &'a str,
    lines: Vec<String>,
    gauges: Vec<Option<f64>>,
}

/// Write the screen to `path`, replacing any previous export atomically.
pub fn export_screen(screen: &Screen, layout: &LineLayout, path: &Path) -> Result<()> {
    let (lines, gauges) = screen
        .status_lines(layout)
        .into_iter()
        .map(|line| (line.text, line.gauge))
        .unzip();
    let export = ScreenExport {
        kind: screen.kind(),
        lines,
        gauges,
    };
    let json = serde_json::to_string_pretty(&export)?;

    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    let mut file =
        fs::File::create(tmp).with_context(|| format!("creating {}", tmp.display()))?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    fs::rename(tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RainStatus;
    use crate::ui::StatusLine;
    use serde_json::Value;

    #[test]
    fn test_export_status_screen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen.json");
        let screen = Screen::Status {
            lines: vec![
                StatusLine {
                    text: "Temp: 20.0°C".to_string(),
                    gauge: Some(0.5),
                },
                StatusLine {
                    text: "ALL CLEAR".to_string(),
                    gauge: None,
                },
            ],
            rain: RainStatus::AllClear,
        };

        export_screen(&screen, &LineLayout::default(), &path).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["kind"], "status");
        assert_eq!(value["lines"][0], "Temp: 20.0°C");
        assert_eq!(value["gauges"][0], 0.5);
        assert!(value["gauges"][1].is_null());
        assert!(!dir.path().join("screen.json.tmp").exists());
    }

    #[test]
    fn test_export_alert_screen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen.json");
        let screen = Screen::Alert {
            services: vec!["dump1090-fa.service".to_string()],
        };

        export_screen(&screen, &LineLayout::default(), &path).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["kind"], "alert");
        assert_eq!(value["lines"].as_array().unwrap().len(), 3);
    }
}
