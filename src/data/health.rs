//! Channel freshness and monitored-service health.

use std::collections::BTreeMap;
use std::process::Command;
use std::time::{Duration, SystemTime};

use tracing::{error, info, warn};

use super::{Channel, ReadingStore};
use crate::config::Settings;

/// Freshness of a single channel, worst first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChannelHealth {
    /// Never received.
    Absent,
    /// Silent for longer than the staleness threshold.
    Stale,
    /// Still reporting, but the value has not changed for too long.
    Stuck,
    Fresh,
}

impl ChannelHealth {
    pub fn is_fresh(&self) -> bool {
        *self == ChannelHealth::Fresh
    }
}

/// Answers whether an external service is running.
pub trait ServiceProbe: Send {
    fn is_active(&self, name: &str) -> bool;
}

/// Asks systemd via `systemctl is-active --quiet <unit>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemctlProbe;

impl ServiceProbe for SystemctlProbe {
    fn is_active(&self, name: &str) -> bool {
        if name.is_empty() {
            return true;
        }
        match Command::new("systemctl").args(["is-active", "--quiet", name]).status() {
            Ok(status) => status.success(),
            Err(e) => {
                error!("Cannot check service status for {}: {}", name, e);
                false
            }
        }
    }
}

/// Evaluates staleness per channel and aggregates service health.
#[derive(Debug, Clone)]
pub struct HealthEvaluator {
    thresholds: BTreeMap<Channel, Duration>,
    no_change: Duration,
    services: BTreeMap<String, bool>,
}

impl HealthEvaluator {
    pub fn new(settings: &Settings) -> Self {
        let thresholds = Channel::ALL
            .into_iter()
            .map(|c| (c, settings.staleness_threshold(c)))
            .collect();
        Self {
            thresholds,
            no_change: settings.no_change_threshold(),
            services: BTreeMap::new(),
        }
    }

    pub fn threshold(&self, channel: Channel) -> Duration {
        self.thresholds.get(&channel).copied().unwrap_or(Duration::MAX)
    }

    pub fn is_stale(&self, store: &ReadingStore, channel: Channel, now: SystemTime) -> bool {
        store.age(channel, now) > self.threshold(channel)
    }

    /// The sensor is talking but the value has not moved for too long.
    pub fn is_stuck(&self, store: &ReadingStore, channel: Channel, now: SystemTime) -> bool {
        store.record(channel).is_some() && store.unchanged_for(channel, now) > self.no_change
    }

    pub fn channel_health(
        &self,
        store: &ReadingStore,
        channel: Channel,
        now: SystemTime,
    ) -> ChannelHealth {
        if store.record(channel).is_none() {
            ChannelHealth::Absent
        } else if self.is_stale(store, channel, now) {
            ChannelHealth::Stale
        } else if self.is_stuck(store, channel, now) {
            ChannelHealth::Stuck
        } else {
            ChannelHealth::Fresh
        }
    }

    /// Record the latest state of a monitored service.
    pub fn report_service(&mut self, name: &str, active: bool) {
        let previous = self.services.insert(name.to_string(), active);
        match (previous, active) {
            (Some(true) | None, false) => warn!("Monitored service {} is down", name),
            (Some(false), true) => info!("Monitored service {} recovered", name),
            _ => {}
        }
    }

    /// Forget services that are no longer monitored.
    pub fn retain_services(&mut self, names: &[String]) {
        self.services.retain(|name, _| names.contains(name));
    }

    /// True iff any monitored service was last reported inactive.
    pub fn critical_alert(&self) -> bool {
        self.services.values().any(|active| !active)
    }

    pub fn down_services(&self) -> Vec<String> {
        self.services
            .iter()
            .filter(|(_, active)| !**active)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_channel_health_progression() {
        let evaluator = HealthEvaluator::new(&Settings::default());
        let mut store = ReadingStore::new();
        assert_eq!(
            evaluator.channel_health(&store, Channel::Temperature, at(0)),
            ChannelHealth::Absent
        );

        store.update(Channel::Temperature, 21.4, at(1_000));
        assert_eq!(
            evaluator.channel_health(&store, Channel::Temperature, at(1_000)),
            ChannelHealth::Fresh
        );
        assert_eq!(
            evaluator.channel_health(&store, Channel::Temperature, at(7_000)),
            ChannelHealth::Stale
        );
    }

    #[test]
    fn test_stuck_is_distinct_from_stale() {
        let evaluator = HealthEvaluator::new(&Settings::default());
        let mut store = ReadingStore::new();
        for t in (0..=4_000).step_by(600) {
            store.update(Channel::Humidity, 55.0, at(1_000 + t));
        }
        let now = at(1_000 + 4_000);
        assert!(!evaluator.is_stale(&store, Channel::Humidity, now));
        assert!(evaluator.is_stuck(&store, Channel::Humidity, now));
        assert_eq!(
            evaluator.channel_health(&store, Channel::Humidity, now),
            ChannelHealth::Stuck
        );
    }

    #[test]
    fn test_staleness_override() {
        let mut settings = Settings::default();
        settings.staleness_overrides.insert("cpu_temp_ads".to_string(), 60);
        let evaluator = HealthEvaluator::new(&settings);
        let mut store = ReadingStore::new();
        store.update(Channel::CpuTempAds, 50.0, at(1_000));
        assert!(evaluator.is_stale(&store, Channel::CpuTempAds, at(1_061)));
    }

    #[test]
    fn test_critical_alert_tracks_services() {
        let mut evaluator = HealthEvaluator::new(&Settings::default());
        assert!(!evaluator.critical_alert());

        evaluator.report_service("dump1090-fa.service", true);
        assert!(!evaluator.critical_alert());

        evaluator.report_service("dump1090-fa.service", false);
        assert!(evaluator.critical_alert());
        assert_eq!(evaluator.down_services(), vec!["dump1090-fa.service".to_string()]);

        evaluator.retain_services(&[]);
        assert!(!evaluator.critical_alert());
    }
}
