//! # envpaper
//!
//! Sensor-state classification and alerting for a small e-paper telemetry
//! display.
//!
//! The crate takes timestamped readings from a publish/subscribe bus
//! (temperature, humidity, CO₂, discomfort index, two CPU temperatures and
//! a capacitive rain sensor), decides which of them are fresh, stale, stuck
//! or faulty, and composes the handful of short lines the panel shows. The
//! engine state survives restarts through an atomically written snapshot.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Application                           │
//! │  ┌─────────┐    ┌──────────┐    ┌──────────┐    ┌────────────┐  │
//! │  │  app    │───▶│   data   │───▶│    ui    │───▶│ Terminal / │  │
//! │  │ (owner) │    │ (engine) │    │(compose) │    │ export.json│  │
//! │  └────┬────┘    └────┬─────┘    └──────────┘    └────────────┘  │
//! │       │              │                                          │
//! │       ▼              ▼                                          │
//! │  ┌─────────┐    ┌──────────┐                                    │
//! │  │ source  │    │ persist  │──▶ envpaper-state.json             │
//! │  │ (input) │    │ (writer) │                                    │
//! │  └─────────┘    └──────────┘                                    │
//! │       ▲                                                         │
//! │       └── StreamSource (TCP/stdin) | FileSource | ChannelSource │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Single owner of the engine; drains sources, renders on a tick
//! - **[`source`]**: [`DataSource`] trait, envelope framing and the topic router
//! - **[`data`]**: Reading store, rain classifier, health evaluation ([`Monitor`])
//! - **[`persist`]**: Snapshot file and the debounced background writer
//! - **[`ui`]**: Pure screen composition, JSON export and the ratatui preview
//! - **[`config`]**: [`Settings`] from a TOML file and `ENVPAPER_*` variables
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Read envelopes from a bus bridge on stdin
//! mosquitto-bridge | envpaper --export /run/epaper/screen.json
//!
//! # Connect to a TCP bridge and run without the terminal preview
//! envpaper --connect localhost:9090 --headless
//!
//! # Replay captured traffic
//! envpaper --replay capture.ndjson --interval 5s
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::time::SystemTime;
//! use envpaper::{compose, Delivery, LineLayout, Monitor, Settings};
//!
//! let mut settings = Settings::default();
//! settings.topics.environment = Some("home/env4".to_string());
//!
//! let mut monitor = Monitor::new(&settings);
//! monitor.deliver(&Delivery::new(
//!     "home/env4",
//!     r#"{"temperature": 21.4, "humidity": 55.0}"#,
//!     SystemTime::now(),
//! ));
//!
//! let layout = LineLayout::default();
//! let screen = compose(&monitor.view(SystemTime::now()), &layout);
//! assert_eq!(screen.lines(&layout)[0], "Temp: 21.4°C");
//! ```
//!
//! ### With a stream source
//!
//! ```no_run
//! use std::io::Cursor;
//! use envpaper::{App, PersistedSnapshot, Settings, StreamSource, SystemctlProbe};
//!
//! # tokio_test::block_on(async {
//! // In practice, use a TcpStream
//! let data = b"{\"topic\":\"home/env4\",\"payload\":{\"temperature\":21.4}}\n";
//! let source = StreamSource::spawn(Cursor::new(data.to_vec()), "example");
//! let app = App::new(
//!     Box::new(source),
//!     Settings::default(),
//!     PersistedSnapshot::default(),
//!     Box::new(SystemctlProbe),
//! );
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod persist;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use data::{
    Channel, ChannelHealth, Classification, Monitor, RainStatus, ServiceProbe, StatusView,
    SystemctlProbe,
};
pub use error::{DecodeError, PersistError};
pub use persist::{PersistedSnapshot, Persister, SnapshotFile};
pub use source::{ChannelSource, DataSource, Delivery, FileSource, StreamSource};
pub use ui::{compose, LineLayout, Screen};
