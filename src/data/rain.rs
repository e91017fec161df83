//! Rain sensor state machine and classification.
//!
//! The sensor publishes a capacitive reading plus device diagnostics. This
//! module folds those reports into a [`RainState`] and derives one primary
//! [`RainStatus`] from it, in a fixed precedence order:
//!
//! ```text
//! RESTART > CABLE_FAULT > ERROR > DEW > NOISE > OFFLINE > RAIN > PRE_RAIN > ALL_CLEAR
//! ```
//!
//! Error, restart, dew and noise conditions are latched: once raised they
//! stay raised until a run of `clear_after_samples` consecutive clean
//! measurements has been seen. A cable fault stays latched until the
//! device explicitly reports the cable as connected again.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::history::SampleHistory;
use super::store::elapsed;
use crate::config::Settings;

/// A single decoded observation from the rain sensor feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RainEvent {
    /// A raw capacitive sample, optionally with the device's own baseline.
    Measurement { raw: f64, baseline: Option<f64> },
    /// `true` when the device reports its cable as disconnected.
    CableFault(bool),
    /// Device-reported error count.
    DeviceError(u32),
    RestartMarker,
    /// Device uptime in seconds. A decrease means the device restarted.
    Uptime(f64),
    RainFlag(bool),
    Dew(bool),
    Noise(bool),
    /// The payload could not be decoded.
    Malformed,
}

/// The rain sensor payload as published by the device.
///
/// Every field is optional; absent fields produce no event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RainReport {
    pub id: Option<String>,
    pub baseline: Option<f64>,
    pub current: Option<f64>,
    /// Device-side change figure. Informational; the rate is recomputed here.
    pub change: Option<f64>,
    pub rain: Option<bool>,
    pub method: Option<i64>,
    pub uptime: Option<f64>,
    pub cable_ok: Option<bool>,
    pub errors: Option<u32>,
    pub dew: Option<bool>,
    pub noise: Option<bool>,
    pub restart: Option<bool>,
    /// Device clock, epoch seconds. Arrival time is used for freshness.
    pub timestamp: Option<f64>,
}

impl RainReport {
    /// Expand the report into events, diagnostics first and the measurement last.
    pub fn events(&self) -> Vec<RainEvent> {
        let mut events = Vec::new();
        if let Some(uptime) = self.uptime {
            events.push(RainEvent::Uptime(uptime));
        }
        if self.restart == Some(true) {
            events.push(RainEvent::RestartMarker);
        }
        if let Some(cable_ok) = self.cable_ok {
            events.push(RainEvent::CableFault(!cable_ok));
        }
        if let Some(errors) = self.errors {
            events.push(RainEvent::DeviceError(errors));
        }
        if let Some(dew) = self.dew {
            events.push(RainEvent::Dew(dew));
        }
        if let Some(noise) = self.noise {
            events.push(RainEvent::Noise(noise));
        }
        if let Some(rain) = self.rain {
            events.push(RainEvent::RainFlag(rain));
        }
        if let Some(raw) = self.current {
            events.push(RainEvent::Measurement {
                raw,
                baseline: self.baseline,
            });
        }
        events
    }
}

/// A condition that is raised at once and cleared only by a clean run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Latch {
    #[default]
    Clear,
    Raised {
        /// Consecutive clean samples seen since the last fault.
        clean_run: u32,
    },
}

impl Latch {
    pub fn raise(&mut self) {
        *self = Latch::Raised { clean_run: 0 };
    }

    pub fn is_raised(&self) -> bool {
        matches!(self, Latch::Raised { .. })
    }

    /// Count a clean sample. Returns true if this sample cleared the latch.
    pub fn observe_clean(&mut self, clear_after: u32) -> bool {
        match self {
            Latch::Clear => false,
            Latch::Raised { clean_run } => {
                *clean_run += 1;
                if *clean_run >= clear_after {
                    *self = Latch::Clear;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Cable state as last reported by the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CableState {
    #[default]
    Connected,
    /// Latched until the device reports `cable_ok: true`.
    Fault,
}

/// Everything the classifier remembers about the rain sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainState {
    pub device_id: Option<String>,
    pub last_raw: Option<f64>,
    pub history: SampleHistory,
    pub device_baseline: Option<f64>,
    /// Change rate (%) of the last measurement against its baseline.
    pub change_rate: Option<f64>,
    pub device_rain: Option<bool>,
    /// Highest error count reported during the current incident.
    pub error_count: u32,
    pub error: Latch,
    pub restart: Latch,
    pub dew: Latch,
    pub noise: Latch,
    pub cable: CableState,
    /// Arrival time of the last measurement.
    pub last_seen: Option<SystemTime>,
    pub last_uptime: Option<f64>,
    /// Consecutive measurements inside the dew band.
    #[serde(default)]
    pub dew_band_run: u32,
    /// A fault arrived since the last measurement.
    #[serde(default)]
    pub fault_pending: bool,
}

impl RainState {
    /// The state of a sensor that has never been heard from.
    pub fn offline(history_capacity: usize) -> Self {
        Self {
            device_id: None,
            last_raw: None,
            history: SampleHistory::new(history_capacity),
            device_baseline: None,
            change_rate: None,
            device_rain: None,
            error_count: 0,
            error: Latch::Clear,
            restart: Latch::Clear,
            dew: Latch::Clear,
            noise: Latch::Clear,
            cable: CableState::Connected,
            last_seen: None,
            last_uptime: None,
            dew_band_run: 0,
            fault_pending: false,
        }
    }
}

impl Default for RainState {
    fn default() -> Self {
        Self::offline(crate::config::RainSettings::default().history_capacity)
    }
}

/// Primary rain line status, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RainStatus {
    Restart,
    CableFault,
    Error,
    Dew,
    Noise,
    Offline,
    Rain,
    PreRain,
    AllClear,
}

impl RainStatus {
    /// Display token for the rain line.
    pub fn token(&self) -> &'static str {
        match self {
            RainStatus::Restart => "RESTART",
            RainStatus::CableFault => "CABLE",
            RainStatus::Error => "ERROR",
            RainStatus::Dew => "DEW",
            RainStatus::Noise => "NOISE",
            RainStatus::Offline => "OFFLINE",
            RainStatus::Rain => "RAIN",
            RainStatus::PreRain => "RAIN→",
            RainStatus::AllClear => "ALL CLEAR",
        }
    }

    /// True for states caused by the device rather than the weather.
    pub fn is_fault(&self) -> bool {
        *self <= RainStatus::Offline
    }
}

/// Rain intensity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intensity {
    High,
    Medium,
    Low,
}

impl Intensity {
    pub fn letter(&self) -> char {
        match self {
            Intensity::High => 'H',
            Intensity::Medium => 'M',
            Intensity::Low => 'L',
        }
    }
}

/// Classifier output for one render cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub status: RainStatus,
    pub intensity: Option<Intensity>,
    pub change_rate: Option<f64>,
}

/// Thresholds the classifier needs, taken from [`Settings`].
#[derive(Debug, Clone)]
pub struct RainThresholds {
    pub online: Duration,
    pub prerain_percent: f64,
    pub dew_percent: f64,
    pub rain_active_percent: f64,
    pub high_percent: f64,
    pub medium_percent: f64,
    pub low_percent: f64,
    pub clear_after_samples: u32,
    pub history_capacity: usize,
}

impl RainThresholds {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            online: settings.rain_online_threshold(),
            prerain_percent: settings.prerain_threshold_percent,
            dew_percent: settings.dew_threshold_percent,
            rain_active_percent: settings.rain.rain_active_percent,
            high_percent: settings.rain.high_percent,
            medium_percent: settings.rain.medium_percent,
            low_percent: settings.rain.low_percent,
            clear_after_samples: settings.rain.clear_after_samples.max(1),
            history_capacity: settings.rain.history_capacity,
        }
    }

    fn bucket(&self, rate: f64) -> Option<Intensity> {
        if rate >= self.high_percent {
            Some(Intensity::High)
        } else if rate >= self.medium_percent {
            Some(Intensity::Medium)
        } else if rate >= self.low_percent {
            Some(Intensity::Low)
        } else {
            None
        }
    }

    fn in_dew_band(&self, rate: f64) -> bool {
        rate >= self.dew_percent && rate < self.prerain_percent
    }
}

/// Owns the [`RainState`] and turns events into classifications.
#[derive(Debug, Clone)]
pub struct RainClassifier {
    thresholds: RainThresholds,
    state: RainState,
}

impl RainClassifier {
    /// Create a classifier in the offline baseline state.
    pub fn new(settings: &Settings) -> Self {
        let thresholds = RainThresholds::from_settings(settings);
        let state = RainState::offline(thresholds.history_capacity);
        Self { thresholds, state }
    }

    /// Resume from a persisted state, re-applying the configured history capacity.
    pub fn restore(settings: &Settings, mut state: RainState) -> Self {
        let thresholds = RainThresholds::from_settings(settings);
        state.history.set_capacity(thresholds.history_capacity);
        Self { thresholds, state }
    }

    pub fn state(&self) -> &RainState {
        &self.state
    }

    /// Apply every event of a decoded report.
    pub fn ingest(&mut self, report: &RainReport, at: SystemTime) {
        if report.id.is_some() {
            self.state.device_id = report.id.clone();
        }
        for event in report.events() {
            self.apply(event, at);
        }
    }

    /// Fold one event into the state. Never fails.
    pub fn apply(&mut self, event: RainEvent, at: SystemTime) {
        match event {
            RainEvent::Measurement { raw, baseline } => self.measure(raw, baseline, at),
            RainEvent::CableFault(true) => {
                if self.state.cable != CableState::Fault {
                    warn!("Rain sensor reports cable fault");
                }
                self.state.cable = CableState::Fault;
                self.state.fault_pending = true;
            }
            RainEvent::CableFault(false) => {
                if self.state.cable == CableState::Fault {
                    info!("Rain sensor cable reconnected");
                }
                self.state.cable = CableState::Connected;
            }
            RainEvent::DeviceError(0) => {}
            RainEvent::DeviceError(count) => {
                self.state.error.raise();
                self.state.error_count = self.state.error_count.max(count);
                self.state.fault_pending = true;
            }
            RainEvent::Malformed => {
                warn!("Malformed rain sensor payload");
                self.state.error.raise();
                self.state.error_count = self.state.error_count.saturating_add(1);
                self.state.fault_pending = true;
            }
            RainEvent::RestartMarker => self.reset_for_restart(),
            RainEvent::Uptime(uptime) => {
                if self.state.last_uptime.is_some_and(|prev| uptime < prev) {
                    self.reset_for_restart();
                }
                self.state.last_uptime = Some(uptime);
            }
            RainEvent::RainFlag(flag) => self.state.device_rain = Some(flag),
            RainEvent::Dew(true) => {
                self.state.dew.raise();
                self.state.fault_pending = true;
            }
            RainEvent::Noise(true) => {
                self.state.noise.raise();
                self.state.fault_pending = true;
            }
            RainEvent::Dew(false) | RainEvent::Noise(false) => {}
        }
    }

    fn measure(&mut self, raw: f64, baseline: Option<f64>, at: SystemTime) {
        if !raw.is_finite() {
            self.apply(RainEvent::Malformed, at);
            return;
        }

        let state = &mut self.state;
        let reference = baseline
            .filter(|b| *b != 0.0)
            .or_else(|| state.history.mean());
        let change_rate = reference
            .filter(|b| *b != 0.0)
            .map(|b| (raw - b) / b * 100.0)
            .filter(|r| r.is_finite());

        state.device_baseline = baseline;
        state.change_rate = change_rate;
        state.history.push(raw);
        state.last_raw = Some(raw);
        state.last_seen = Some(at);

        let in_dew_band = change_rate.is_some_and(|r| self.thresholds.in_dew_band(r));
        if in_dew_band {
            state.dew_band_run = state.dew_band_run.saturating_add(1);
            if state.dew.is_raised() {
                // Still in the band: the clean run starts over.
                state.dew.raise();
            } else if state.dew_band_run >= self.thresholds.clear_after_samples {
                debug!("Rain sensor change rate holding in dew band, raising dew");
                state.dew.raise();
            }
        } else {
            state.dew_band_run = 0;
        }

        let clean = !state.fault_pending && !in_dew_band;
        state.fault_pending = false;
        if !clean {
            return;
        }

        let clear_after = self.thresholds.clear_after_samples;
        if state.error.observe_clean(clear_after) {
            info!("Rain sensor errors cleared after {} clean samples", clear_after);
            state.error_count = 0;
        }
        if state.restart.observe_clean(clear_after) {
            info!("Rain sensor restart acknowledged");
        }
        state.dew.observe_clean(clear_after);
        state.noise.observe_clean(clear_after);
    }

    fn reset_for_restart(&mut self) {
        warn!("Rain sensor restart detected");
        let device_id = self.state.device_id.take();
        self.state = RainState::offline(self.thresholds.history_capacity);
        self.state.device_id = device_id;
        self.state.restart.raise();
        self.state.fault_pending = true;
    }

    /// Derive the primary status at `now`.
    pub fn classify(&self, now: SystemTime) -> Classification {
        let state = &self.state;
        let rate = state.change_rate;

        let status = if state.restart.is_raised() {
            RainStatus::Restart
        } else if state.cable == CableState::Fault {
            RainStatus::CableFault
        } else if state.error.is_raised() {
            RainStatus::Error
        } else if state.dew.is_raised() {
            RainStatus::Dew
        } else if state.noise.is_raised() {
            RainStatus::Noise
        } else if state.last_seen.is_none_or(|t| elapsed(t, now) > self.thresholds.online) {
            RainStatus::Offline
        } else if state.device_rain == Some(true)
            || rate.is_some_and(|r| r >= self.thresholds.rain_active_percent)
        {
            RainStatus::Rain
        } else if rate.is_some_and(|r| r >= self.thresholds.prerain_percent) {
            RainStatus::PreRain
        } else {
            RainStatus::AllClear
        };

        let intensity = match status {
            RainStatus::Rain | RainStatus::PreRain => rate.and_then(|r| self.thresholds.bucket(r)),
            _ => None,
        };

        Classification {
            status,
            intensity,
            // An offline sensor's last rate is history, not news.
            change_rate: if status == RainStatus::Offline { None } else { rate },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn classifier() -> RainClassifier {
        RainClassifier::new(&Settings::default())
    }

    fn sample(c: &mut RainClassifier, raw: f64, t: u64) {
        c.apply(
            RainEvent::Measurement {
                raw,
                baseline: Some(100.0),
            },
            at(t),
        );
    }

    #[test]
    fn test_new_classifier_is_offline() {
        let c = classifier();
        let result = c.classify(at(1_000));
        assert_eq!(result.status, RainStatus::Offline);
        assert!(result.change_rate.is_none());
    }

    #[test]
    fn test_fresh_dry_sample_is_all_clear() {
        let mut c = classifier();
        sample(&mut c, 100.5, 1_000);
        let result = c.classify(at(1_030));
        assert_eq!(result.status, RainStatus::AllClear);
        assert!((result.change_rate.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_goes_offline_after_threshold() {
        let mut c = classifier();
        sample(&mut c, 100.0, 1_000);
        assert_eq!(c.classify(at(1_090)).status, RainStatus::AllClear);
        assert_eq!(c.classify(at(1_091)).status, RainStatus::Offline);
    }

    #[test]
    fn test_cable_fault_outranks_error_count() {
        let mut c = classifier();
        sample(&mut c, 100.0, 1_000);
        c.apply(RainEvent::CableFault(true), at(1_001));
        c.apply(RainEvent::DeviceError(3), at(1_001));
        assert_eq!(c.classify(at(1_002)).status, RainStatus::CableFault);
        assert_eq!(c.state().error_count, 3);
    }

    #[test]
    fn test_cable_fault_needs_explicit_clear() {
        let mut c = classifier();
        c.apply(RainEvent::CableFault(true), at(1_000));
        for t in 1..=5 {
            sample(&mut c, 100.0, 1_000 + t);
        }
        assert_eq!(c.classify(at(1_006)).status, RainStatus::CableFault);

        c.apply(RainEvent::CableFault(false), at(1_007));
        assert_eq!(c.classify(at(1_007)).status, RainStatus::AllClear);
    }

    #[test]
    fn test_single_clean_sample_does_not_clear_error() {
        let mut c = classifier();
        for t in 0..4 {
            c.apply(RainEvent::DeviceError(2), at(1_000 + t));
            sample(&mut c, 100.0, 1_000 + t);
        }
        sample(&mut c, 100.0, 1_010);
        assert_eq!(c.classify(at(1_010)).status, RainStatus::Error);
        assert_eq!(c.state().error_count, 2);

        sample(&mut c, 100.0, 1_011);
        assert_eq!(c.classify(at(1_011)).status, RainStatus::Error);
        sample(&mut c, 100.0, 1_012);
        assert_eq!(c.classify(at(1_012)).status, RainStatus::AllClear);
        assert_eq!(c.state().error_count, 0);
    }

    #[test]
    fn test_fault_interrupts_clean_run() {
        let mut c = classifier();
        c.apply(RainEvent::Noise(true), at(1_000));
        sample(&mut c, 100.0, 1_001);
        sample(&mut c, 100.0, 1_002);
        sample(&mut c, 100.0, 1_003);
        c.apply(RainEvent::Noise(true), at(1_004));
        sample(&mut c, 100.0, 1_004);
        sample(&mut c, 100.0, 1_005);
        sample(&mut c, 100.0, 1_006);
        assert_eq!(c.classify(at(1_006)).status, RainStatus::Noise);
        sample(&mut c, 100.0, 1_007);
        assert_eq!(c.classify(at(1_007)).status, RainStatus::AllClear);
    }

    #[test]
    fn test_dew_outranks_offline() {
        let mut c = classifier();
        c.apply(RainEvent::Dew(true), at(1_000));
        assert_eq!(c.classify(at(5_000)).status, RainStatus::Dew);
    }

    #[test]
    fn test_sustained_dew_band_raises_dew() {
        let mut c = classifier();
        // 2.5% sits between the dew and pre-rain thresholds.
        sample(&mut c, 102.5, 1_000);
        sample(&mut c, 102.5, 1_001);
        assert_ne!(c.classify(at(1_001)).status, RainStatus::Dew);
        sample(&mut c, 102.5, 1_002);
        assert_eq!(c.classify(at(1_002)).status, RainStatus::Dew);
    }

    #[test]
    fn test_dew_flag_clears_after_clean_run() {
        let mut c = classifier();
        c.apply(RainEvent::Dew(true), at(1_000));
        // The first measurement after the flag is not clean.
        sample(&mut c, 100.0, 1_001);
        assert_eq!(c.classify(at(1_001)).status, RainStatus::Dew);
        sample(&mut c, 100.0, 1_002);
        assert_eq!(c.classify(at(1_002)).status, RainStatus::Dew);
        sample(&mut c, 100.0, 1_003);
        assert_eq!(c.classify(at(1_003)).status, RainStatus::Dew);
        sample(&mut c, 100.0, 1_004);
        assert_eq!(c.classify(at(1_004)).status, RainStatus::AllClear);
    }

    #[test]
    fn test_dew_band_raise_clears_only_after_clean_run() {
        let mut c = classifier();
        for t in 1_000..1_005 {
            sample(&mut c, 102.5, t);
        }
        assert_eq!(c.classify(at(1_004)).status, RainStatus::Dew);

        sample(&mut c, 100.0, 1_005);
        sample(&mut c, 100.0, 1_006);
        assert_eq!(c.classify(at(1_006)).status, RainStatus::Dew);

        // A band sample is not clean and restarts the run.
        sample(&mut c, 102.5, 1_007);
        sample(&mut c, 100.0, 1_008);
        sample(&mut c, 100.0, 1_009);
        assert_eq!(c.classify(at(1_009)).status, RainStatus::Dew);
        sample(&mut c, 100.0, 1_010);
        assert_eq!(c.classify(at(1_010)).status, RainStatus::AllClear);
        assert_eq!(c.state().dew_band_run, 0);
    }

    #[test]
    fn test_dew_band_run_saturates() {
        let mut state = RainState::offline(12);
        state.dew_band_run = u32::MAX;
        let mut c = RainClassifier::restore(&Settings::default(), state);
        sample(&mut c, 102.5, 1_000);
        assert_eq!(c.state().dew_band_run, u32::MAX);
        assert_eq!(c.classify(at(1_000)).status, RainStatus::Dew);
    }

    #[test]
    fn test_rain_intensity_buckets() {
        let mut c = classifier();
        sample(&mut c, 120.0, 1_000);
        let result = c.classify(at(1_000));
        assert_eq!(result.status, RainStatus::Rain);
        assert_eq!(result.intensity, Some(Intensity::High));

        sample(&mut c, 108.0, 1_001);
        assert_eq!(c.classify(at(1_001)).intensity, Some(Intensity::Medium));
    }

    #[test]
    fn test_pre_rain_below_active_cut_point() {
        let mut c = classifier();
        sample(&mut c, 104.0, 1_000);
        let result = c.classify(at(1_000));
        assert_eq!(result.status, RainStatus::PreRain);
        assert_eq!(result.intensity, Some(Intensity::Low));
    }

    #[test]
    fn test_device_rain_flag_forces_rain() {
        let mut c = classifier();
        c.apply(RainEvent::RainFlag(true), at(1_000));
        sample(&mut c, 100.0, 1_000);
        let result = c.classify(at(1_000));
        assert_eq!(result.status, RainStatus::Rain);
        assert_eq!(result.intensity, None);
    }

    #[test]
    fn test_zero_baseline_omits_change_rate() {
        let mut c = classifier();
        c.apply(
            RainEvent::Measurement {
                raw: 50.0,
                baseline: Some(0.0),
            },
            at(1_000),
        );
        let result = c.classify(at(1_000));
        assert!(result.change_rate.is_none());
        assert_eq!(result.status, RainStatus::AllClear);
    }

    #[test]
    fn test_rolling_baseline_without_device_baseline() {
        let mut c = classifier();
        for (t, raw) in [(0, 200.0), (1, 200.0)] {
            c.apply(RainEvent::Measurement { raw, baseline: None }, at(1_000 + t));
        }
        c.apply(
            RainEvent::Measurement {
                raw: 240.0,
                baseline: None,
            },
            at(1_002),
        );
        assert!((c.state().change_rate.unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_sample_without_baseline_has_no_rate() {
        let mut c = classifier();
        c.apply(
            RainEvent::Measurement {
                raw: 200.0,
                baseline: None,
            },
            at(1_000),
        );
        assert!(c.classify(at(1_000)).change_rate.is_none());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut c = classifier();
        for t in 0..50 {
            sample(&mut c, 100.0 + t as f64, 1_000 + t);
        }
        assert_eq!(c.state().history.len(), c.state().history.capacity());
    }

    #[test]
    fn test_uptime_decrease_is_restart() {
        let mut c = classifier();
        c.apply(RainEvent::Uptime(5_000.0), at(1_000));
        sample(&mut c, 100.0, 1_000);
        c.apply(RainEvent::CableFault(true), at(1_001));
        c.apply(RainEvent::Uptime(12.0), at(1_002));

        let state = c.state();
        assert!(state.restart.is_raised());
        assert_eq!(state.cable, CableState::Connected);
        assert!(state.history.is_empty());
        assert_eq!(state.last_uptime, Some(12.0));
        assert_eq!(c.classify(at(1_002)).status, RainStatus::Restart);
    }

    #[test]
    fn test_restart_clears_after_clean_run() {
        let mut c = classifier();
        c.apply(RainEvent::RestartMarker, at(1_000));
        sample(&mut c, 100.0, 1_000);
        sample(&mut c, 100.0, 1_001);
        sample(&mut c, 100.0, 1_002);
        assert_eq!(c.classify(at(1_002)).status, RainStatus::Restart);
        sample(&mut c, 100.0, 1_003);
        assert_eq!(c.classify(at(1_003)).status, RainStatus::AllClear);
    }

    #[test]
    fn test_malformed_payload_counts_as_error() {
        let mut c = classifier();
        c.apply(RainEvent::Malformed, at(1_000));
        c.apply(RainEvent::Malformed, at(1_001));
        assert_eq!(c.state().error_count, 2);
        assert_eq!(c.classify(at(1_001)).status, RainStatus::Error);
    }

    #[test]
    fn test_report_expands_in_order() {
        let report = RainReport {
            current: Some(101.0),
            baseline: Some(100.0),
            cable_ok: Some(true),
            errors: Some(0),
            uptime: Some(60.0),
            ..Default::default()
        };
        let events = report.events();
        assert_eq!(events.first(), Some(&RainEvent::Uptime(60.0)));
        assert_eq!(
            events.last(),
            Some(&RainEvent::Measurement {
                raw: 101.0,
                baseline: Some(100.0)
            })
        );
    }

    #[test]
    fn test_restore_reapplies_capacity() {
        let mut state = RainState::offline(50);
        for v in 0..50 {
            state.history.push(v as f64);
        }
        let c = RainClassifier::restore(&Settings::default(), state);
        assert_eq!(c.state().history.len(), 12);
    }
}
