//! End-to-end scheduling scenarios: linear runs, fan-out/fan-in, conditional
//! routing with skip propagation, conditional exclusivity, handler failure,
//! checkpoint/resume, and the compile-time negative cases.

use std::sync::Arc;
use std::time::Duration;

use graph_engine::handler::{condition_fn, handler_fn};
use graph_engine::{CompilationError, ExecuteOptions, Graph, GraphError, State};
use graph_engine_checkpoint::InMemoryCheckpointSink;
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn record_handler(label: &'static str) -> graph_engine::Handler {
    handler_fn(move |_ctx, state| async move {
        let mut order: Vec<String> = state
            .load("order")
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        order.push(label.to_string());
        state.store("order", json!(order));
        Ok(())
    })
}

#[tokio::test]
async fn s1_linear_chain_runs_in_order() {
    let mut graph = Graph::new();
    graph
        .add_node("a", record_handler("a"))
        .add_node("b", record_handler("b"))
        .add_node("c", record_handler("c"))
        .add_edge("a", "b")
        .add_edge("b", "c")
        .set_entry_point("a")
        .set_finish_point("c")
        .with_parallel(false);

    let executor = graph.compile().expect("valid graph compiles");
    let result = executor
        .execute(State::new(), CancellationToken::new(), ExecuteOptions::new())
        .await
        .expect("run succeeds");

    let order: Vec<String> = serde_json::from_value(result.load("order").unwrap()).unwrap();
    assert_eq!(order, vec!["a", "b", "c"]);
}

fn flag_handler(key: &'static str) -> graph_engine::Handler {
    handler_fn(move |_ctx, state| async move {
        state.store(key, json!(true));
        Ok(())
    })
}

#[tokio::test]
async fn s2_fan_out_fan_in_waits_for_every_branch() {
    // start -> left, start -> right, left -> join, right -> join.
    // left/right run concurrently, so each sets its own key rather than
    // appending to a shared list (which would race); start/join never
    // overlap with each other and share the "order" list safely.
    let mut graph = Graph::new();
    graph
        .add_node("start", record_handler("start"))
        .add_node("left", flag_handler("left"))
        .add_node("right", flag_handler("right"))
        .add_node("join", record_handler("join"))
        .add_edge("start", "left")
        .add_edge("start", "right")
        .add_edge("left", "join")
        .add_edge("right", "join")
        .set_entry_point("start")
        .set_finish_point("join");

    let executor = graph.compile().expect("valid graph compiles");
    let result = executor
        .execute(State::new(), CancellationToken::new(), ExecuteOptions::new())
        .await
        .expect("run succeeds");

    let order: Vec<String> = serde_json::from_value(result.load("order").unwrap()).unwrap();
    assert_eq!(order, vec!["start", "join"]);
    assert_eq!(result.load("left"), Some(json!(true)));
    assert_eq!(result.load("right"), Some(json!(true)));
}

#[tokio::test]
async fn s3_conditional_routing_skips_the_untaken_branch() {
    // start -[true]-> taken -> finish
    // start -[false]-> skipped -> finish (never runs; finish must not wait on it)
    let mut graph = Graph::new();
    graph
        .add_node("start", record_handler("start"))
        .add_node("taken", record_handler("taken"))
        .add_node("skipped", record_handler("skipped"))
        .add_node("finish", record_handler("finish"))
        .add_conditional_edge("start", "taken", condition_fn(|_ctx, _state| true))
        .add_conditional_edge("start", "skipped", condition_fn(|_ctx, _state| false))
        .add_edge("taken", "finish")
        .add_edge("skipped", "finish")
        .set_entry_point("start")
        .set_finish_point("finish");

    let executor = graph.compile().expect("valid graph compiles");
    let result = executor
        .execute(State::new(), CancellationToken::new(), ExecuteOptions::new())
        .await
        .expect("run succeeds despite the untaken branch");

    let order: Vec<String> = serde_json::from_value(result.load("order").unwrap()).unwrap();
    assert!(order.contains(&"taken".to_string()));
    assert!(!order.contains(&"skipped".to_string()));
    assert!(order.contains(&"finish".to_string()));
}

#[tokio::test]
async fn s4_conditional_exclusivity_first_match_wins() {
    // Two edges would both match; only the first in insertion order fires.
    let mut graph = Graph::new();
    graph
        .add_node("start", record_handler("start"))
        .add_node("first", record_handler("first"))
        .add_node("second", record_handler("second"))
        .add_node("finish", record_handler("finish"))
        .add_conditional_edge("start", "first", condition_fn(|_ctx, _state| true))
        .add_conditional_edge("start", "second", condition_fn(|_ctx, _state| true))
        .add_edge("first", "finish")
        .add_edge("second", "finish")
        .set_entry_point("start")
        .set_finish_point("finish");

    let executor = graph.compile().expect("valid graph compiles");
    let result = executor
        .execute(State::new(), CancellationToken::new(), ExecuteOptions::new())
        .await
        .expect("run succeeds");

    let order: Vec<String> = serde_json::from_value(result.load("order").unwrap()).unwrap();
    assert!(order.contains(&"first".to_string()));
    assert!(!order.contains(&"second".to_string()));
}

#[tokio::test]
async fn s5_handler_failure_surfaces_as_handler_error() {
    let mut graph = Graph::new();
    graph
        .add_node(
            "boom",
            handler_fn(|_ctx, _state| async { Err("kaboom".into()) }),
        )
        .add_node("finish", record_handler("finish"))
        .add_edge("boom", "finish")
        .set_entry_point("boom")
        .set_finish_point("finish");

    let executor = graph.compile().expect("valid graph compiles");
    let err = executor
        .execute(State::new(), CancellationToken::new(), ExecuteOptions::new())
        .await
        .expect_err("handler failure must terminate the run");

    match err {
        GraphError::HandlerError { node, message } => {
            assert_eq!(node, "boom");
            assert!(message.contains("kaboom"));
        }
        other => panic!("expected HandlerError, got {other:?}"),
    }
}

#[tokio::test]
async fn s6_checkpoint_captures_an_earlier_quiescent_point_for_resume() {
    // start -> mid -> finish, each node pausing briefly so quiescent points
    // are distinct and the sink accumulates multiple checkpoints.
    let mut graph = Graph::new();
    graph
        .add_node(
            "start",
            handler_fn(|_ctx, state| async move {
                state.store("order", json!(vec!["start"]));
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(())
            }),
        )
        .add_node(
            "mid",
            handler_fn(|_ctx, state| async move {
                let mut order: Vec<String> =
                    serde_json::from_value(state.load("order").unwrap()).unwrap();
                order.push("mid".to_string());
                state.store("order", json!(order));
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(())
            }),
        )
        .add_node("finish", record_handler("finish"))
        .add_edge("start", "mid")
        .add_edge("mid", "finish")
        .set_entry_point("start")
        .set_finish_point("finish")
        .with_parallel(false);

    let executor = graph.compile().expect("valid graph compiles");
    let sink = Arc::new(InMemoryCheckpointSink::new());
    let options = ExecuteOptions::new().with_checkpoint_sink(sink.clone());

    executor
        .execute(State::new(), CancellationToken::new(), options)
        .await
        .expect("run succeeds");

    let pre_mid = sink
        .find(|cp| cp.has_visited("start") && !cp.has_visited("mid"))
        .expect("a checkpoint taken after 'start' but before 'mid' must exist");
    assert!(!pre_mid.has_visited("finish"));

    let resumed_executor = executor;
    let result = resumed_executor
        .execute(
            State::new(),
            CancellationToken::new(),
            ExecuteOptions::new().with_resume_from(pre_mid),
        )
        .await
        .expect("resume completes the remaining nodes");

    let order: Vec<String> = serde_json::from_value(result.load("order").unwrap()).unwrap();
    assert_eq!(order, vec!["start", "mid", "finish"]);
}

#[test]
fn n1_cycle_is_rejected_at_compile_time() {
    let mut graph = Graph::new();
    graph
        .add_node("a", record_handler("a"))
        .add_node("b", record_handler("b"))
        .add_edge("a", "b")
        .add_edge("b", "a")
        .set_entry_point("a")
        .set_finish_point("b");

    assert!(matches!(graph.compile(), Err(CompilationError::CycleDetected(_))));
}

#[test]
fn n2_unreachable_finish_is_rejected_at_compile_time() {
    let mut graph = Graph::new();
    graph
        .add_node("a", record_handler("a"))
        .add_node("b", record_handler("b"))
        .add_node("island", record_handler("island"))
        .set_entry_point("a")
        .set_finish_point("island");

    assert!(matches!(
        graph.compile(),
        Err(CompilationError::UnreachableFinish(_))
    ));
}

#[tokio::test]
async fn n3_no_matching_condition_is_a_runtime_error() {
    let mut graph = Graph::new();
    graph
        .add_node("start", record_handler("start"))
        .add_node("never", record_handler("never"))
        .add_conditional_edge("start", "never", condition_fn(|_ctx, _state| false))
        .set_entry_point("start")
        .set_finish_point("never");

    let executor = graph.compile().expect("structurally valid graph compiles");
    let err = executor
        .execute(State::new(), CancellationToken::new(), ExecuteOptions::new())
        .await
        .expect_err("no condition matches, run must fail");

    assert!(matches!(err, GraphError::NoConditionMatched { node } if node == "start"));
}

#[tokio::test]
async fn single_node_graph_where_entry_equals_finish_completes_immediately() {
    let mut graph = Graph::new();
    graph
        .add_node("only", record_handler("only"))
        .set_entry_point("only")
        .set_finish_point("only");

    let executor = graph.compile().expect("valid graph compiles");
    let result = executor
        .execute(State::new(), CancellationToken::new(), ExecuteOptions::new())
        .await
        .expect("run succeeds");

    let order: Vec<String> = serde_json::from_value(result.load("order").unwrap()).unwrap();
    assert_eq!(order, vec!["only"]);
}
