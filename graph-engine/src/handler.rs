//! Handler, condition, and middleware type aliases.
//!
//! An `Arc`-wrapped closure returning a boxed future, generalized from a
//! fixed `Value -> Value` transform to a `(RunContext, State) -> Result`
//! side-effecting handler.

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::RunContext;
use crate::state::State;

/// A boxed, `'static` future, the way a `NodeExecutor`-style alias boxes
/// its return type so the surrounding trait object stays object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The error type a node handler may return. The scheduler wraps it into
/// `GraphError::HandlerError` with the failing node's name attached.
pub type HandlerError = Box<dyn StdError + Send + Sync>;

/// A node's unit of work: given the run context and the shared state, do
/// something (typically reading and writing state) and resolve or fail.
///
/// Handlers must not retain the `State` handle beyond the call; the
/// scheduler does not guarantee it stays valid afterward.
pub type Handler = Arc<
    dyn Fn(RunContext, State) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync,
>;

/// A predicate guarding a conditional outgoing edge.
pub type Condition = Arc<dyn Fn(&RunContext, &State) -> bool + Send + Sync>;

/// Wraps a `Handler`, producing a new `Handler`. Composed outermost-first:
/// the first middleware registered wraps every other, and ultimately the
/// node's own handler (see `Graph::with_middleware`).
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Helper for building a `Handler` from an `async fn`/closure without
/// spelling out the `Arc`/`Pin`/`Box` boilerplate at every call site.
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(RunContext, State) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(move |ctx, state| -> BoxFuture<'static, Result<(), HandlerError>> {
        Box::pin(f(ctx, state))
    })
}

/// Helper for building a `Condition` from a plain closure.
pub fn condition_fn<F>(f: F) -> Condition
where
    F: Fn(&RunContext, &State) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}
