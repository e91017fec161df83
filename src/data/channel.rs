//! The fixed set of telemetry channels shown on the display.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A telemetry channel.
///
/// The set is closed: every value the display knows how to show maps to
/// exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Temperature,
    Humidity,
    Co2,
    /// Temperature-humidity (discomfort) index.
    Thi,
    CpuTempPi,
    CpuTempAds,
    Rain,
}

impl Channel {
    /// All channels in display order.
    pub const ALL: [Channel; 7] = [
        Channel::Temperature,
        Channel::Humidity,
        Channel::CpuTempPi,
        Channel::CpuTempAds,
        Channel::Rain,
        Channel::Thi,
        Channel::Co2,
    ];

    /// Name used in configuration keys and the snapshot file.
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Temperature => "temperature",
            Channel::Humidity => "humidity",
            Channel::Co2 => "co2",
            Channel::Thi => "thi",
            Channel::CpuTempPi => "cpu_temp_pi",
            Channel::CpuTempAds => "cpu_temp_ads",
            Channel::Rain => "rain",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.name() == s.trim())
            .ok_or_else(|| anyhow::anyhow!("Unknown channel: {}", s))
    }
}
