//! Channel-based data source.
//!
//! Receives deliveries pushed by an in-process producer, such as a bus
//! client embedded in the same binary.

use tokio::sync::mpsc;

use super::{DataSource, Delivery};

/// Default number of deliveries buffered before producers wait.
pub const DEFAULT_CAPACITY: usize = 256;

/// A data source fed through a bounded tokio `mpsc` channel.
///
/// Unlike a watch channel every delivery is kept, so no reading is lost
/// between two polls.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<Delivery>,
    description: String,
    last_error: Option<String>,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<Delivery>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            last_error: None,
        }
    }

    /// Create a sender/source pair.
    pub fn create(source_description: &str) -> (mpsc::Sender<Delivery>, Self) {
        let (tx, rx) = mpsc::channel(DEFAULT_CAPACITY);
        (tx, Self::new(rx, source_description))
    }
}

impl DataSource for ChannelSource {
    fn poll(&mut self) -> Option<Delivery> {
        match self.receiver.try_recv() {
            Ok(delivery) => Some(delivery),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.last_error = Some("Producer disconnected".to_string());
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
