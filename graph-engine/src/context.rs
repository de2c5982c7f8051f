//! Per-node execution context handed to every handler and condition.

use tokio_util::sync::CancellationToken;

/// Ambient context passed to a node's handler and to any conditions guarding
/// its outgoing edges.
///
/// Cloning a `RunContext` is cheap: the cancellation token is itself a
/// cheaply-clonable handle onto the run's single cancellation source.
#[derive(Debug, Clone)]
pub struct RunContext {
    node: String,
    cancel: CancellationToken,
}

impl RunContext {
    pub(crate) fn new(node: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            node: node.into(),
            cancel,
        }
    }

    /// The name of the node this context was created for.
    pub fn node(&self) -> &str {
        &self.node
    }

    /// The run's cancellation token. Handlers that perform long-running or
    /// cancellable work should select against `cancel.cancelled()`.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Shorthand for `self.cancellation_token().is_cancelled()`.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
