//! Message bus ingestion.
//!
//! A [`DataSource`] yields raw [`Delivery`] values (topic, payload, arrival
//! time). Sources never interpret payloads; that is the job of the
//! [`TopicRouter`], which maps topics to decoders.

mod channel;
mod decode;
mod envelope;
mod file;
mod stream;

pub use channel::ChannelSource;
pub use decode::{Decoded, Route, TopicRouter};
pub use envelope::{parse_envelope, Envelope};
pub use file::FileSource;
pub use stream::StreamSource;

use std::fmt::Debug;
use std::time::SystemTime;

/// One message taken off the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub topic: String,
    pub payload: Vec<u8>,
    /// When the message reached this process; used as the reading timestamp.
    pub arrival: SystemTime,
}

impl Delivery {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>, arrival: SystemTime) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            arrival,
        }
    }
}

/// Trait for receiving bus deliveries from various transports.
///
/// # Example
///
/// ```
/// use std::time::SystemTime;
/// use envpaper::{ChannelSource, DataSource, Delivery};
///
/// let (tx, mut source) = ChannelSource::create("example");
/// tx.try_send(Delivery::new("home/env", r#"{"temperature":21.4}"#, SystemTime::now()))
///     .unwrap();
/// assert!(source.poll().is_some());
/// ```
pub trait DataSource: Send + Debug {
    /// Take the next pending delivery, if any. Must not block.
    fn poll(&mut self) -> Option<Delivery>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;

    /// The last transport error, if the source is currently unhealthy.
    fn error(&self) -> Option<&str>;
}
