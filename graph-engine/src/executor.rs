//! The immutable, compiled artifact produced by `Graph::compile`.

use std::collections::HashMap;
use std::sync::Arc;

use graph_engine_checkpoint::{Checkpoint, CheckpointSink};
use tokio_util::sync::CancellationToken;

use crate::error::GraphError;
use crate::graph::NodeInfo;
use crate::handler::Handler;
use crate::state::State;
use crate::task::Task;

/// Everything the scheduler needs, computed once at compile time and shared
/// read-only across every concurrent `execute` call.
pub(crate) struct ExecutorInner {
    pub(crate) nodes: HashMap<String, Handler>,
    pub(crate) node_info: HashMap<String, NodeInfo>,
    pub(crate) predecessors: HashMap<String, Vec<String>>,
    pub(crate) entry: String,
    pub(crate) finish: String,
    pub(crate) parallel: bool,
}

/// A validated, immutable graph ready to run. Thread-safe: multiple
/// concurrent `execute` calls each get their own [`Task`] and share only
/// this read-only compiled data.
#[derive(Clone)]
pub struct Executor {
    inner: Arc<ExecutorInner>,
}

impl Executor {
    pub(crate) fn new(inner: ExecutorInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// The name of the entry node.
    pub fn entry(&self) -> &str {
        &self.inner.entry
    }

    /// The name of the finish node.
    pub fn finish(&self) -> &str {
        &self.inner.finish
    }

    /// Runs the graph to completion (or failure) from `initial_state`,
    /// unless `options.resume_from` is set, in which case the supplied
    /// checkpoint's state is used instead and `initial_state` is ignored.
    /// A run resumes from exactly where it left off, not from a blend of
    /// the two.
    pub async fn execute(
        &self,
        initial_state: State,
        cancel: CancellationToken,
        options: ExecuteOptions,
    ) -> Result<State, GraphError> {
        let task = match options.resume_from {
            Some(checkpoint) => Task::resumed(self.inner.clone(), checkpoint, cancel, options.checkpoint_sink),
            None => Task::fresh(self.inner.clone(), initial_state, cancel, options.checkpoint_sink),
        };
        task.run().await
    }
}

/// Tuning knobs for a single `execute` call.
#[derive(Clone, Default)]
pub struct ExecuteOptions {
    /// If set, a checkpoint is emitted to this sink every time the run goes
    /// quiescent (no node in flight) with unsaved progress.
    pub checkpoint_sink: Option<Arc<dyn CheckpointSink>>,
    /// If set, the run resumes from this checkpoint instead of starting
    /// fresh from the caller-supplied initial state.
    pub resume_from: Option<Checkpoint>,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_checkpoint_sink(mut self, sink: Arc<dyn CheckpointSink>) -> Self {
        self.checkpoint_sink = Some(sink);
        self
    }

    pub fn with_resume_from(mut self, checkpoint: Checkpoint) -> Self {
        self.resume_from = Some(checkpoint);
        self
    }
}
