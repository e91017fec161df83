//! Sensor state and its classification.
//!
//! ## Submodules
//!
//! - [`channel`]: The fixed set of measurement channels
//! - [`store`]: Latest reading per channel with arrival and change times
//! - [`history`]: Bounded sample window used for the rain baseline
//! - [`rain`]: Rain sensor state machine and status classification
//! - [`health`]: Staleness, stuck-value and service health evaluation
//! - [`monitor`]: The engine tying the above together ([`Monitor`])
//! - [`duration`]: Parsing and formatting of interval strings (e.g., "5m", "90s")
//!
//! ## Data Flow
//!
//! ```text
//! Delivery (topic, payload, arrival)
//!        │
//!        ▼
//! Monitor::deliver() ──▶ TopicRouter::decode()
//!        │
//!        ├──▶ ReadingStore::update()     (plain channels, out-of-order rejected)
//!        │
//!        └──▶ RainClassifier::ingest()   (rain events, latches)
//!
//! Monitor::view(now) ──▶ StatusView ──▶ ui::compose()
//! ```

pub mod channel;
pub mod duration;
pub mod health;
pub mod history;
pub mod monitor;
pub mod rain;
pub mod store;

pub use channel::Channel;
pub use health::{ChannelHealth, HealthEvaluator, ServiceProbe, SystemctlProbe};
pub use history::SampleHistory;
pub use monitor::{ChannelView, DeliveryOutcome, Monitor, StatusView};
pub use rain::{
    CableState, Classification, Intensity, Latch, RainClassifier, RainEvent, RainReport,
    RainState, RainStatus,
};
pub use store::{ChannelRecord, ReadingStore};
