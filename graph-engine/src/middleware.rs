//! Middleware composition and the bundled tracing middleware.

use crate::context::RunContext;
use crate::handler::{Handler, Middleware};
use crate::state::State;

/// Composes a list of middleware around `base`, outermost-first: the first
/// entry in `middleware` wraps the second, which wraps the third, and so on
/// down to `base` at the center. Applied once at `Graph::compile` time, not
/// per-call.
pub(crate) fn compose(middleware: &[Middleware], base: Handler) -> Handler {
    middleware.iter().rev().fold(base, |acc, mw| mw(acc))
}

/// A middleware that logs node entry, exit, and duration via `tracing`.
///
/// Logs the way `#[tracing::instrument]` would on a node function,
/// generalized to a composable wrapper since nodes here are values, not
/// functions the macro can annotate directly.
pub fn tracing_middleware() -> Middleware {
    std::sync::Arc::new(|inner: Handler| -> Handler {
        let inner = inner.clone();
        std::sync::Arc::new(
            move |ctx: RunContext, state: State| -> crate::handler::BoxFuture<'static, Result<(), crate::handler::HandlerError>> {
                let inner = inner.clone();
                Box::pin(async move {
                    let node = ctx.node().to_string();
                    tracing::debug!(node = %node, "node started");
                    let start = std::time::Instant::now();
                    let result = inner(ctx, state).await;
                    let elapsed_ms = start.elapsed().as_millis() as u64;
                    match &result {
                        Ok(()) => tracing::debug!(node = %node, elapsed_ms, "node completed"),
                        Err(err) => tracing::warn!(node = %node, elapsed_ms, error = %err, "node failed"),
                    }
                    result
                })
            },
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use tokio_util::sync::CancellationToken;

    fn ctx() -> RunContext {
        RunContext::new("n", CancellationToken::new())
    }

    #[tokio::test]
    async fn compose_applies_outermost_first() {
        let order = std::sync::Arc::new(parking_lot::Mutex::new(Vec::<&'static str>::new()));

        let make_mw = |tag: &'static str, order: std::sync::Arc<parking_lot::Mutex<Vec<&'static str>>>| {
            std::sync::Arc::new(move |inner: Handler| -> Handler {
                let inner = inner.clone();
                let order = order.clone();
                std::sync::Arc::new(
                    move |ctx: RunContext, state: State| -> crate::handler::BoxFuture<'static, Result<(), crate::handler::HandlerError>> {
                        let inner = inner.clone();
                        let order = order.clone();
                        Box::pin(async move {
                            order.lock().push(tag);
                            inner(ctx, state).await
                        })
                    },
                )
            }) as Middleware
        };

        let base = handler_fn(|_ctx, _state| async { Ok(()) });
        let composed = compose(&[make_mw("outer", order.clone()), make_mw("inner", order.clone())], base);
        composed(ctx(), State::new()).await.unwrap();

        assert_eq!(*order.lock(), vec!["outer", "inner"]);
    }

    #[tokio::test]
    async fn tracing_middleware_passes_through_result() {
        let base = handler_fn(|_ctx, _state| async { Ok(()) });
        let wrapped = tracing_middleware()(base);
        assert!(wrapped(ctx(), State::new()).await.is_ok());
    }
}
