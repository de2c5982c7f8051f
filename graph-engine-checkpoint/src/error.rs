//! Error type for checkpoint sink implementations.

use thiserror::Error;

/// Errors a [`crate::CheckpointSink`] implementation can raise.
///
/// Kept separate from the graph engine's `GraphError` so that storage
/// backends can be implemented (and tested) without depending on the
/// engine crate at all.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The backend failed to persist a checkpoint (I/O, serialization, etc).
    #[error("failed to save checkpoint: {0}")]
    SaveFailed(String),

    /// The backend failed to load a checkpoint.
    #[error("failed to load checkpoint: {0}")]
    LoadFailed(String),

    /// No checkpoint matched the requested lookup.
    #[error("no checkpoint found for thread {0:?}")]
    NotFound(Option<String>),
}

/// Convenience alias used throughout the checkpoint crate.
pub type Result<T> = std::result::Result<T, CheckpointError>;
