//! The pluggable checkpoint sink abstraction.
//!
//! The engine does not prescribe a storage backend or wire format. Anything
//! that can durably accept a [`Checkpoint`] at a quiescent point qualifies:
//! a file, a database row, an object store, or (for tests) memory.

use async_trait::async_trait;

use crate::checkpoint::Checkpoint;
use crate::error::Result;

/// Storage backend for checkpoints, invoked by the scheduler at every
/// quiescent point (see `graph_engine::task`).
///
/// Implementations should treat `save` as append-only: the engine relies on
/// being able to enumerate every checkpoint a run emitted (for example, to
/// pick the earliest one with a given property) rather than only the latest.
#[async_trait]
pub trait CheckpointSink: Send + Sync {
    /// Persist a checkpoint. Failures are surfaced to the run as
    /// `GraphError::CheckpointSinkError` and treated like a handler failure.
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()>;
}
