//! # graph-engine-checkpoint
//!
//! Checkpoint value type and the [`CheckpointSink`] trait abstraction used by
//! `graph-engine`'s task scheduler to persist quiescent snapshots, plus
//! [`InMemoryCheckpointSink`] as a reference implementation for tests and
//! small-scale use.
//!
//! The engine does not prescribe a serialization format. A `Checkpoint` is a
//! plain, `Serialize`/`Deserialize` value; sinks decide how (and whether) to
//! persist it durably.

mod checkpoint;
mod error;
mod memory;
mod sink;

pub use checkpoint::Checkpoint;
pub use error::{CheckpointError, Result};
pub use memory::InMemoryCheckpointSink;
pub use sink::CheckpointSink;
