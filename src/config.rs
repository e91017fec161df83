//! Runtime configuration.
//!
//! [`Settings`] is built once at startup from an optional TOML file and
//! `ENVPAPER_*` environment variables, then passed down by reference. No
//! logic code reads the process environment itself.
//!
//! ```toml
//! data_staleness_threshold_seconds = 5400
//! monitored_services = ["dump1090-fa.service"]
//!
//! [rain]
//! clear_after_samples = 3
//!
//! [topics]
//! environment = "home/env4"
//! rain = "home/weather/rain_sensor"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::warn;

use crate::data::Channel;

/// File name of the persisted snapshot inside `base_directory`.
pub const SNAPSHOT_FILE_NAME: &str = "envpaper-state.json";

/// Top-level settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Age after which a numeric channel renders as `ERROR`.
    pub data_staleness_threshold_seconds: u64,
    /// Time without a changed value after which a channel is considered stuck.
    pub no_change_error_threshold_seconds: u64,
    /// The rain sensor is offline when it has not measured for this long.
    pub rain_online_threshold_seconds: u64,
    pub prerain_threshold_percent: f64,
    pub dew_threshold_percent: f64,
    /// Render tick interval.
    pub display_update_interval_seconds: u64,
    /// Directory holding the snapshot file (and the default log file).
    pub base_directory: PathBuf,
    pub enable_service_monitoring: bool,
    pub monitored_services: Vec<String>,
    /// Per-channel staleness thresholds, keyed by channel name.
    pub staleness_overrides: BTreeMap<String, u64>,
    pub persist_debounce_millis: u64,
    /// Only CO₂/THI payloads carrying this `device_id` are accepted.
    pub device_id: Option<String>,
    pub rain: RainSettings,
    pub topics: TopicSettings,
    pub display: DisplaySettings,
}

/// Rain classifier tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RainSettings {
    /// Number of raw samples kept for the rolling baseline.
    pub history_capacity: usize,
    /// Consecutive clean samples needed to clear a latched fault.
    pub clear_after_samples: u32,
    /// Change rate (%) at which rain is considered active without a device flag.
    pub rain_active_percent: f64,
    pub high_percent: f64,
    pub medium_percent: f64,
    pub low_percent: f64,
}

/// Static topic → route mapping. Unset topics are not routed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TopicSettings {
    /// JSON with `temperature` and `humidity`.
    pub environment: Option<String>,
    /// `vcgencmd`-style text: `temp=48.3'C`.
    pub pi_cpu: Option<String>,
    pub ads_cpu: Option<String>,
    pub co2: Option<String>,
    pub thi: Option<String>,
    pub rain: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Maximum characters per display line.
    pub line_width: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_staleness_threshold_seconds: 5400,
            no_change_error_threshold_seconds: 3600,
            rain_online_threshold_seconds: 90,
            prerain_threshold_percent: 3.0,
            dew_threshold_percent: 2.0,
            display_update_interval_seconds: 300,
            base_directory: PathBuf::from("."),
            enable_service_monitoring: true,
            monitored_services: vec!["dump1090-fa.service".to_string()],
            staleness_overrides: BTreeMap::new(),
            persist_debounce_millis: 2000,
            device_id: None,
            rain: RainSettings::default(),
            topics: TopicSettings::default(),
            display: DisplaySettings::default(),
        }
    }
}

impl Default for RainSettings {
    fn default() -> Self {
        Self {
            history_capacity: 12,
            clear_after_samples: 3,
            rain_active_percent: 7.0,
            high_percent: 15.0,
            medium_percent: 7.0,
            low_percent: 3.0,
        }
    }
}

impl Default for TopicSettings {
    fn default() -> Self {
        Self {
            environment: None,
            pi_cpu: None,
            ads_cpu: None,
            co2: None,
            thi: None,
            rain: Some("home/weather/rain_sensor".to_string()),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { line_width: 24 }
    }
}

impl Settings {
    /// Load settings from an optional TOML file overlaid by `ENVPAPER_*`
    /// environment variables.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("ENVPAPER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("monitored_services"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Staleness threshold for a channel, honouring overrides.
    pub fn staleness_threshold(&self, channel: Channel) -> Duration {
        let secs = self
            .staleness_overrides
            .get(channel.name())
            .copied()
            .unwrap_or(self.data_staleness_threshold_seconds);
        Duration::from_secs(secs)
    }

    pub fn no_change_threshold(&self) -> Duration {
        Duration::from_secs(self.no_change_error_threshold_seconds)
    }

    pub fn rain_online_threshold(&self) -> Duration {
        Duration::from_secs(self.rain_online_threshold_seconds)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_secs(self.display_update_interval_seconds)
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_millis)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.base_directory.join(SNAPSHOT_FILE_NAME)
    }

    /// Services whose state is polled each render tick.
    pub fn services_to_probe(&self) -> &[String] {
        if self.enable_service_monitoring {
            &self.monitored_services
        } else {
            &[]
        }
    }

    /// Warn about settings that parse but cannot take effect.
    pub fn check(&self) {
        for name in self.staleness_overrides.keys() {
            if name.parse::<Channel>().is_err() {
                warn!("Ignoring staleness override for unknown channel '{}'", name);
            }
        }
    }
}
