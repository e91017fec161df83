//! Error types for the library surface.
//!
//! Neither error ever escapes the render loop: decode failures degrade to a
//! device-error count or a dropped reading, persistence failures to a log
//! line and an empty snapshot.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a bus payload into readings.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload or envelope is not valid JSON of the expected shape.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A field every payload of this kind must carry is absent.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Text payload did not match the expected pattern.
    #[error("Unrecognised payload: {0}")]
    Pattern(String),
}

/// Failure to read or write the snapshot file.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Corrupt snapshot: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| PersistError::Io { path, source }
    }
}
