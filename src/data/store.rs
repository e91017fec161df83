//! Latest value per channel, with the timestamps needed for staleness.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use super::Channel;

/// The stored state of one channel.
///
/// A value never exists without its timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub value: f64,
    /// Arrival time of the reading that produced `value`.
    pub timestamp: SystemTime,
    /// Arrival time of the last reading whose value differed from its predecessor.
    pub last_changed: SystemTime,
}

/// Holds the latest reading for every channel.
#[derive(Debug, Clone, Default)]
pub struct ReadingStore {
    records: BTreeMap<Channel, ChannelRecord>,
}

impl ReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted records.
    pub fn restore(records: BTreeMap<Channel, ChannelRecord>) -> Self {
        Self { records }
    }

    /// Apply a reading.
    ///
    /// Returns `false` (and leaves the store untouched) if the channel
    /// already holds a reading at or after `timestamp`.
    pub fn update(&mut self, channel: Channel, value: f64, timestamp: SystemTime) -> bool {
        match self.records.get_mut(&channel) {
            Some(record) if timestamp <= record.timestamp => false,
            Some(record) => {
                if record.value != value {
                    record.last_changed = timestamp;
                }
                record.value = value;
                record.timestamp = timestamp;
                true
            }
            None => {
                self.records.insert(
                    channel,
                    ChannelRecord {
                        value,
                        timestamp,
                        last_changed: timestamp,
                    },
                );
                true
            }
        }
    }

    pub fn get(&self, channel: Channel) -> Option<(f64, SystemTime)> {
        self.records.get(&channel).map(|r| (r.value, r.timestamp))
    }

    pub fn record(&self, channel: Channel) -> Option<&ChannelRecord> {
        self.records.get(&channel)
    }

    /// Time since the last accepted reading, or `Duration::MAX` if there is none.
    pub fn age(&self, channel: Channel, now: SystemTime) -> Duration {
        self.records
            .get(&channel)
            .map_or(Duration::MAX, |r| elapsed(r.timestamp, now))
    }

    /// Time since the value last changed, or `Duration::MAX` if there is none.
    pub fn unchanged_for(&self, channel: Channel, now: SystemTime) -> Duration {
        self.records
            .get(&channel)
            .map_or(Duration::MAX, |r| elapsed(r.last_changed, now))
    }

    pub fn records(&self) -> &BTreeMap<Channel, ChannelRecord> {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Clock steps backwards count as zero elapsed time.
pub(crate) fn elapsed(since: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(since).unwrap_or(Duration::ZERO)
}
