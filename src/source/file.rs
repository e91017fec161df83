//! File-based data source.
//!
//! Replays a recorded newline-delimited envelope file, one delivery per
//! poll. Useful for bench testing the classifier against captured bus
//! traffic.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{info, warn};

use super::{parse_envelope, DataSource, Delivery};

/// A data source that replays envelopes from a file.
///
/// The file is read lazily on the first poll. Lines without an `arrival`
/// field are stamped with the time the file was read plus their line number
/// in microseconds, so replayed readings stay strictly ordered.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    pending: VecDeque<Delivery>,
    loaded: bool,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("replay: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            pending: VecDeque::new(),
            loaded: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deliveries not yet handed out.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn load(&mut self) {
        self.loaded = true;
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                return;
            }
        };

        let now = SystemTime::now();
        let mut skipped = 0;
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let stamp = now + Duration::from_micros(number as u64);
            match parse_envelope(line, stamp) {
                Ok(delivery) => self.pending.push_back(delivery),
                Err(e) => {
                    warn!("{}:{}: {}", self.path.display(), number + 1, e);
                    self.last_error = Some(format!("Parse error on line {}: {}", number + 1, e));
                    skipped += 1;
                }
            }
        }

        info!(
            "Loaded {} deliveries from {} ({} skipped)",
            self.pending.len(),
            self.path.display(),
            skipped
        );
    }
}

impl DataSource for FileSource {
    fn poll(&mut self) -> Option<Delivery> {
        if !self.loaded {
            self.load();
        }
        self.pending.pop_front()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
