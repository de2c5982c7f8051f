//! Error taxonomy for the graph engine.
//!
//! Compile-time and run-time failures are kept in two distinct types: a
//! [`CompilationError`] means no [`crate::Executor`] was ever produced,
//! while a [`GraphError`] is raised mid-run by an already-compiled graph.

use thiserror::Error;

/// Failures raised by [`crate::Graph::compile`]. Fatal: no `Executor` is produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompilationError {
    /// Structural problem: missing entry/finish, unknown node referenced by
    /// an edge or entry/finish point, or a duplicate node/edge/entry/finish.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// The graph contains a directed cycle (in any connected component).
    #[error("cycle detected: {0}")]
    CycleDetected(String),

    /// The finish node is not reachable from the entry node, ignoring
    /// conditions (structural reachability).
    #[error("finish node unreachable from entry: {0}")]
    UnreachableFinish(String),
}

/// Failures raised while executing a compiled graph.
#[derive(Debug, Clone, Error)]
pub enum GraphError {
    /// A node handler returned an error. Wraps the handler's error message,
    /// annotated with the node name. The scheduler itself never retries;
    /// middleware is the seam for local retry/backoff.
    #[error("node '{node}' failed: {message}")]
    HandlerError {
        /// Name of the node whose handler failed.
        node: String,
        /// The handler's error, rendered to a string.
        message: String,
    },

    /// A node with conditional outgoing edges had every condition evaluate
    /// to false.
    #[error("node '{node}': no outgoing condition matched")]
    NoConditionMatched {
        /// Name of the router node.
        node: String,
    },

    /// Defensive check: a node with `has_conditions == true` had an outgoing
    /// edge with no condition attached. Should not occur for graphs built
    /// through the public builder API.
    #[error("node '{node}': outgoing edge is missing its condition")]
    ConditionMissing {
        /// Name of the router node.
        node: String,
    },

    /// The ready queue and in-flight set were both empty before the finish
    /// node was visited. Should be impossible if `compile` succeeded; the
    /// scheduler guards against it defensively.
    #[error("finish unreachable at runtime")]
    RuntimeUnreachable,

    /// The configured `CheckpointSink` failed to persist a checkpoint.
    /// Treated like a `HandlerError`: it terminates the run.
    #[error("checkpoint sink failed: {0}")]
    CheckpointSinkError(String),

    /// The run was cancelled via the ambient `CancellationToken`.
    #[error("run cancelled")]
    Cancelled,
}

/// Convenience alias for run-time results.
pub type Result<T> = std::result::Result<T, GraphError>;
