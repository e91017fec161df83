//! On-disk snapshot format.
//!
//! A snapshot holds everything needed to resume after a restart: the
//! latest record of every channel and the full rain sensor state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::{Channel, ChannelRecord, RainState};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// The persisted engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    pub version: u32,
    #[serde(default)]
    pub channels: BTreeMap<Channel, ChannelRecord>,
    #[serde(default)]
    pub rain: RainState,
}

impl Default for PersistedSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            channels: BTreeMap::new(),
            rain: RainState::default(),
        }
    }
}

impl PersistedSnapshot {
    /// True if the snapshot carries nothing learned from the bus.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.rain.last_seen.is_none() && self.rain.last_uptime.is_none()
    }
}
