//! Error types for file event propagation.

use thiserror::Error;

/// Result type alias for file event operations.
pub type Result<T> = std::result::Result<T, FileEventsError>;

/// Errors that can occur while propagating file events.
///
/// Most failures inside a pipeline run are not surfaced as errors at all:
/// unresolvable files, stopped engines and unreadable entries are skipped so
/// that one bad entry never starves the other modules' notifications.
#[derive(Error, Debug)]
pub enum FileEventsError {
    /// The sequenced worker no longer accepts submissions.
    #[error("file events worker has been shut down")]
    WorkerShutdown,

    /// Directory not found.
    #[error("directory not found: {0}")]
    DirectoryNotFound(String),

    /// Directory is already being watched.
    #[error("already watching: {0}")]
    AlreadyWatching(String),

    /// Invalid metadata glob pattern.
    #[error("invalid metadata pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// File content is not valid UTF-8.
    #[error("file is not valid utf-8 text: {0}")]
    NotText(String),

    /// Notify error.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
