//! In-memory [`CheckpointSink`] reference implementation.
//!
//! Ideal for development, testing, and short-lived single-process runs.
//! Every emitted checkpoint is kept (not just the latest) so callers can
//! inspect the full history, for example picking the earliest checkpoint
//! whose visited set contains one node but not a later one.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::checkpoint::Checkpoint;
use crate::error::Result;
use crate::sink::CheckpointSink;

/// Stores every checkpoint ever saved, in emission order, behind a single
/// `RwLock`. Never evicts; meant for tests and demos, not long-lived
/// production workloads.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointSink {
    checkpoints: RwLock<Vec<Checkpoint>>,
}

impl InMemoryCheckpointSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of every checkpoint saved so far, oldest first.
    pub fn checkpoints(&self) -> Vec<Checkpoint> {
        self.checkpoints.read().clone()
    }

    /// The most recently saved checkpoint, if any.
    pub fn latest(&self) -> Option<Checkpoint> {
        self.checkpoints.read().last().cloned()
    }

    /// The first saved checkpoint matching `predicate`.
    pub fn find<F>(&self, predicate: F) -> Option<Checkpoint>
    where
        F: Fn(&Checkpoint) -> bool,
    {
        self.checkpoints.read().iter().find(|cp| predicate(cp)).cloned()
    }

    /// Drops all stored checkpoints. Useful for test isolation.
    pub fn clear(&self) {
        self.checkpoints.write().clear();
    }
}

#[async_trait]
impl CheckpointSink for InMemoryCheckpointSink {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        tracing::debug!(visited = checkpoint.visited.len(), "saving checkpoint");
        self.checkpoints.write().push(checkpoint.clone());
        Ok(())
    }
}
