//! Crash-safe persistence of the engine state.
//!
//! ```text
//! Monitor::snapshot()
//!        │
//!        ▼
//! Persister::submit() ──watch──▶ writer task (debounce, skip unchanged)
//!                                      │
//!                                      ▼
//!                              SnapshotFile::save() (tmp + fsync + rename)
//! ```

mod file;
mod snapshot;
mod writer;

pub use file::SnapshotFile;
pub use snapshot::{PersistedSnapshot, SNAPSHOT_VERSION};
pub use writer::Persister;
