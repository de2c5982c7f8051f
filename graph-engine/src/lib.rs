//! # graph-engine
//!
//! A small, dependency-light DAG execution engine: build a graph of named
//! nodes and edges, compile it once (structural validation, cycle
//! detection, reachability, and per-node scheduling facts precomputed up
//! front), then run it any number of times concurrently against fresh or
//! resumed state.
//!
//! ```no_run
//! use graph_engine::{Graph, State, ExecuteOptions};
//! use graph_engine::handler::handler_fn;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut graph = Graph::new();
//! graph
//!     .add_node("start", handler_fn(|_ctx, state| async move {
//!         state.store("seen", serde_json::json!(true));
//!         Ok(())
//!     }))
//!     .add_node("finish", handler_fn(|_ctx, _state| async { Ok(()) }))
//!     .add_edge("start", "finish")
//!     .set_entry_point("start")
//!     .set_finish_point("finish");
//!
//! let executor = graph.compile()?;
//! let result = executor
//!     .execute(State::new(), CancellationToken::new(), ExecuteOptions::new())
//!     .await?;
//! assert_eq!(result.load("seen"), Some(serde_json::json!(true)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module organization
//!
//! - [`state`]: the shared, cheaply-clonable run state bag.
//! - [`graph`]: the fluent builder and compile-time validation.
//! - [`executor`]: the immutable compiled artifact and `execute` entry point.
//! - [`task`] (private): the ready-queue scheduler that actually drives a run.
//! - [`middleware`]: handler wrapping, composed outermost-first.
//! - [`error`]: the compile-time/run-time error taxonomy.
//!
//! ## Non-goals
//!
//! This crate has no opinion on LLMs, prompts, tools, or conversational
//! memory; it schedules opaque async handlers over a DAG. It rejects
//! cycles at compile time rather than interpreting loops, and it does not
//! distribute work across machines. Checkpoint storage and wire format are
//! left to the caller via [`graph_engine_checkpoint::CheckpointSink`].

pub mod context;
pub mod error;
mod executor;
pub mod graph;
pub mod handler;
pub mod middleware;
pub mod state;
mod task;

pub use context::RunContext;
pub use error::{CompilationError, GraphError};
pub use executor::{ExecuteOptions, Executor};
pub use graph::Graph;
pub use handler::{condition_fn, handler_fn, Condition, Handler};
pub use middleware::tracing_middleware;
pub use state::State;

pub use graph_engine_checkpoint::{Checkpoint, CheckpointError, CheckpointSink};
