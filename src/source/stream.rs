//! Stream-based data source.
//!
//! Reads newline-delimited envelopes from an async byte stream, such as a
//! TCP connection to a bus bridge or the process's stdin.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{parse_envelope, DataSource, Delivery};

type ErrorSlot = Arc<Mutex<Option<String>>>;

fn set_error(slot: &ErrorSlot, error: Option<String>) {
    if let Ok(mut guard) = slot.lock() {
        *guard = error;
    }
}

/// A data source that receives envelopes from an async stream.
///
/// A background task reads lines and forwards parsed deliveries; `poll()`
/// never blocks.
///
/// # Example with a byte stream
///
/// ```
/// use std::io::Cursor;
/// use envpaper::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"{\"topic\":\"home/env4\",\"payload\":{\"temperature\":21.4}}\n";
/// let stream = Cursor::new(data.to_vec());
/// let source = StreamSource::spawn(stream, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<Delivery>,
    description: String,
    last_error: ErrorSlot,
    // Cached copy of `last_error` so `error()` can hand out a borrow.
    error_view: Option<String>,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(super::channel::DEFAULT_CAPACITY);
        let last_error: ErrorSlot = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        debug!("Stream reached end of input");
                        set_error(&error_handle, Some("Connection closed".to_string()));
                        break;
                    }
                    Ok(_) if line.trim().is_empty() => {}
                    Ok(_) => match parse_envelope(&line, SystemTime::now()) {
                        Ok(delivery) => {
                            set_error(&error_handle, None);
                            if tx.send(delivery).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Dropping unparseable envelope: {}", e);
                            set_error(&error_handle, Some(format!("Parse error: {}", e)));
                        }
                    },
                    Err(e) => {
                        set_error(&error_handle, Some(format!("Read error: {}", e)));
                        break;
                    }
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            last_error,
            error_view: None,
        }
    }

    /// Read envelopes from this process's stdin.
    pub fn stdin() -> Self {
        Self::spawn(tokio::io::stdin(), "stdin")
    }
}

impl DataSource for StreamSource {
    fn poll(&mut self) -> Option<Delivery> {
        let delivery = self.receiver.try_recv().ok();
        self.error_view = self.last_error.lock().ok().and_then(|guard| guard.clone());
        delivery
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.error_view.as_deref()
    }
}
