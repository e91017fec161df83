//! The classification engine.
//!
//! [`Monitor`] owns every piece of mutable sensor state: the reading store,
//! the rain classifier and the service health table. Deliveries go in,
//! [`StatusView`]s and [`PersistedSnapshot`]s come out.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use super::health::{ChannelHealth, HealthEvaluator};
use super::rain::{Classification, RainClassifier, RainEvent};
use super::{Channel, ReadingStore};
use crate::config::Settings;
use crate::persist::PersistedSnapshot;
use crate::source::{Decoded, Delivery, Route, TopicRouter};

/// What happened to a single delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Channel readings stored.
    pub accepted: usize,
    /// Channel readings rejected as out of order.
    pub rejected: usize,
    /// The rain state changed.
    pub rain_updated: bool,
}

impl DeliveryOutcome {
    /// True if the delivery changed anything worth persisting.
    pub fn changed(&self) -> bool {
        self.accepted > 0 || self.rain_updated
    }
}

/// One channel as seen at render time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelView {
    pub value: Option<f64>,
    pub health: ChannelHealth,
}

impl ChannelView {
    /// The value, if it is fit to display.
    pub fn fresh_value(&self) -> Option<f64> {
        self.value.filter(|_| self.health.is_fresh())
    }
}

/// Everything the display composer needs, evaluated at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusView {
    pub channels: BTreeMap<Channel, ChannelView>,
    pub rain: Classification,
    pub down_services: Vec<String>,
    /// Set when nothing has been shown yet and data is still being awaited.
    pub waiting: Option<Duration>,
}

impl StatusView {
    pub fn channel(&self, channel: Channel) -> ChannelView {
        self.channels.get(&channel).copied().unwrap_or(ChannelView {
            value: None,
            health: ChannelHealth::Absent,
        })
    }

    pub fn critical_alert(&self) -> bool {
        !self.down_services.is_empty()
    }
}

/// Sensor state for one display.
#[derive(Debug, Clone)]
pub struct Monitor {
    store: ReadingStore,
    rain: RainClassifier,
    health: HealthEvaluator,
    router: TopicRouter,
}

impl Monitor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            store: ReadingStore::new(),
            rain: RainClassifier::new(settings),
            health: HealthEvaluator::new(settings),
            router: TopicRouter::new(settings),
        }
    }

    /// Resume from a persisted snapshot.
    pub fn restore(settings: &Settings, snapshot: PersistedSnapshot) -> Self {
        Self {
            store: ReadingStore::restore(snapshot.channels),
            rain: RainClassifier::restore(settings, snapshot.rain),
            health: HealthEvaluator::new(settings),
            router: TopicRouter::new(settings),
        }
    }

    pub fn store(&self) -> &ReadingStore {
        &self.store
    }

    pub fn rain(&self) -> &RainClassifier {
        &self.rain
    }

    pub fn health(&self) -> &HealthEvaluator {
        &self.health
    }

    /// True until the first reading or rain report has been applied.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty() && self.rain.state().last_seen.is_none()
    }

    /// Route, decode and apply one delivery. Never fails.
    pub fn deliver(&mut self, delivery: &Delivery) -> DeliveryOutcome {
        let mut outcome = DeliveryOutcome::default();

        let Some(route) = self.router.route(&delivery.topic) else {
            debug!("No route for topic {}", delivery.topic);
            return outcome;
        };

        match self.router.decode(route, &delivery.payload) {
            Ok(Decoded::Readings(readings)) => {
                for (channel, value) in readings {
                    if self.store.update(channel, value, delivery.arrival) {
                        outcome.accepted += 1;
                    } else {
                        debug!("Rejected out-of-order {} reading", channel);
                        outcome.rejected += 1;
                    }
                }
            }
            Ok(Decoded::Rain(report)) => {
                if let Some(current) = report.current {
                    if self.store.update(Channel::Rain, current, delivery.arrival) {
                        outcome.accepted += 1;
                    } else {
                        debug!("Rejected out-of-order rain report");
                        outcome.rejected += 1;
                        return outcome;
                    }
                }
                self.rain.ingest(&report, delivery.arrival);
                outcome.rain_updated = true;
            }
            Err(e) if route == Route::Rain => {
                warn!("Malformed rain payload on {}: {}", delivery.topic, e);
                self.rain.apply(RainEvent::Malformed, delivery.arrival);
                outcome.rain_updated = true;
            }
            Err(e) => {
                warn!("Dropping {:?} payload on {}: {}", route, delivery.topic, e);
            }
        }

        outcome
    }

    /// Record the latest state of a monitored service.
    pub fn report_service(&mut self, name: &str, active: bool) {
        self.health.report_service(name, active);
    }

    pub fn retain_services(&mut self, names: &[String]) {
        self.health.retain_services(names);
    }

    pub fn critical_alert(&self) -> bool {
        self.health.critical_alert()
    }

    /// Evaluate every channel and the rain status at `now`.
    pub fn view(&self, now: SystemTime) -> StatusView {
        let channels = Channel::ALL
            .into_iter()
            .map(|channel| {
                let view = ChannelView {
                    value: self.store.record(channel).map(|r| r.value),
                    health: self.health.channel_health(&self.store, channel, now),
                };
                (channel, view)
            })
            .collect();

        StatusView {
            channels,
            rain: self.rain.classify(now),
            down_services: self.health.down_services(),
            waiting: None,
        }
    }

    /// Capture the persistable state.
    pub fn snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            channels: self.store.records().clone(),
            rain: self.rain.state().clone(),
            ..PersistedSnapshot::default()
        }
    }
}
