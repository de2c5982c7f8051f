//! The task scheduler: ready queue, dependency counting, skip propagation,
//! and quiescence-triggered checkpointing.
//!
//! This is the part of the engine with no direct analogue in a Pregel-style
//! superstep executor: a `parking_lot::Mutex` guards scheduler state and is
//! never held across an `.await`, with `tracing` instrumentation on every
//! transition and `thiserror`-based error propagation.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use graph_engine_checkpoint::{Checkpoint, CheckpointSink};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::context::RunContext;
use crate::error::GraphError;
use crate::executor::ExecutorInner;
use crate::state::State;

struct SchedulerState {
    ready: VecDeque<String>,
    remaining: HashMap<String, i64>,
    received: HashMap<String, u64>,
    in_flight: HashSet<String>,
    visited: HashSet<String>,
    finished: bool,
    err: Option<GraphError>,
    dirty: bool,
}

/// One in-flight run of a compiled graph. Not exposed publicly; callers
/// only ever see `Executor::execute`.
pub(crate) struct Task {
    run_id: uuid::Uuid,
    executor: Arc<ExecutorInner>,
    state: State,
    scheduler: Mutex<SchedulerState>,
    notify: Notify,
    cancel: CancellationToken,
    checkpoint_sink: Option<Arc<dyn CheckpointSink>>,
}

enum Step {
    Checkpoint(Checkpoint),
    ReturnOk,
    ReturnErr(GraphError),
    Dispatch(String),
    Wait,
    Loop,
}

impl Task {
    /// Builds a task starting from a fresh run: the entry node is the only
    /// one seeded ready, with a single active contribution of its own.
    pub(crate) fn fresh(
        executor: Arc<ExecutorInner>,
        state: State,
        cancel: CancellationToken,
        checkpoint_sink: Option<Arc<dyn CheckpointSink>>,
    ) -> Arc<Self> {
        let mut remaining = HashMap::new();
        for (name, info) in &executor.node_info {
            if info.dependencies > 0 {
                remaining.insert(name.clone(), info.dependencies as i64);
            }
        }
        let mut received = HashMap::new();
        received.insert(executor.entry.clone(), 1);
        let mut ready = VecDeque::new();
        ready.push_back(executor.entry.clone());

        let scheduler = SchedulerState {
            ready,
            remaining,
            received,
            in_flight: HashSet::new(),
            visited: HashSet::new(),
            finished: false,
            err: None,
            dirty: false,
        };

        Arc::new(Self {
            run_id: uuid::Uuid::new_v4(),
            executor,
            state,
            scheduler: Mutex::new(scheduler),
            notify: Notify::new(),
            cancel,
            checkpoint_sink,
        })
    }

    /// Builds a task resuming from `checkpoint`. The checkpoint's state
    /// replaces whatever initial state the caller supplied; `remaining` and
    /// `ready` are rebuilt from `visited` and the graph's static topology.
    pub(crate) fn resumed(
        executor: Arc<ExecutorInner>,
        checkpoint: Checkpoint,
        cancel: CancellationToken,
        checkpoint_sink: Option<Arc<dyn CheckpointSink>>,
    ) -> Arc<Self> {
        let Checkpoint {
            received,
            visited,
            state,
            ..
        } = checkpoint;

        let mut remaining = HashMap::new();
        for (name, info) in &executor.node_info {
            if info.dependencies == 0 {
                continue;
            }
            let satisfied = executor
                .predecessors
                .get(name)
                .map(|preds| preds.iter().filter(|p| visited.contains(*p)).count())
                .unwrap_or(0) as i64;
            remaining.insert(name.clone(), (info.dependencies as i64 - satisfied).max(0));
        }

        let mut ready = VecDeque::new();
        for (name, info) in &executor.node_info {
            if visited.contains(name) {
                continue;
            }
            let rem = *remaining.get(name).unwrap_or(&(info.dependencies as i64));
            let rec = *received.get(name).unwrap_or(&0);
            if rem == 0 && rec > 0 {
                ready.push_back(name.clone());
            }
        }

        let finished = visited.contains(&executor.finish);

        let scheduler = SchedulerState {
            ready,
            remaining,
            received,
            in_flight: HashSet::new(),
            visited,
            finished,
            err: None,
            dirty: false,
        };

        Arc::new(Self {
            run_id: uuid::Uuid::new_v4(),
            executor,
            state: State::restore(state),
            scheduler: Mutex::new(scheduler),
            notify: Notify::new(),
            cancel,
            checkpoint_sink,
        })
    }

    /// Drives the run to completion: the coordinator loop. Returns the
    /// final shared state on success, or the first fatal error observed.
    #[tracing::instrument(skip(self), fields(run_id = %self.run_id))]
    pub(crate) async fn run(self: Arc<Self>) -> Result<State, GraphError> {
        tracing::info!(entry = %self.executor.entry, finish = %self.executor.finish, "run started");
        loop {
            let step = self.next_step();
            match step {
                Step::Checkpoint(checkpoint) => {
                    if let Some(sink) = self.checkpoint_sink.clone() {
                        if let Err(err) = sink.save(&checkpoint).await {
                            self.fail(GraphError::CheckpointSinkError(err.to_string()));
                        }
                    }
                }
                Step::ReturnOk => {
                    tracing::info!(run_id = %self.run_id, "run completed");
                    return Ok(self.state.clone());
                }
                Step::ReturnErr(err) => {
                    tracing::error!(run_id = %self.run_id, error = %err, "run failed");
                    return Err(err);
                }
                Step::Loop => {}
                Step::Wait => {
                    tokio::select! {
                        _ = self.notify.notified() => {}
                        _ = self.cancel.cancelled() => self.fail(GraphError::Cancelled),
                    }
                }
                Step::Dispatch(node) => {
                    if self.executor.parallel {
                        let me = self.clone();
                        tokio::spawn(async move { me.run_node(node).await });
                    } else {
                        self.clone().run_node(node).await;
                    }
                }
            }
        }
    }

    /// Computes the next action under a single short critical section,
    /// mirroring the four-step order: quiescent checkpoint, termination
    /// check, starvation check, dequeue.
    fn next_step(&self) -> Step {
        let mut sched = self.scheduler.lock();

        if self.checkpoint_sink.is_some() && sched.dirty && sched.in_flight.is_empty() {
            sched.dirty = false;
            let checkpoint = Checkpoint::new(sched.received.clone(), sched.visited.clone(), self.state.snapshot());
            return Step::Checkpoint(checkpoint);
        }

        if let Some(err) = sched.err.clone() {
            return if sched.in_flight.is_empty() {
                Step::ReturnErr(err)
            } else {
                Step::Wait
            };
        }

        if sched.finished {
            return if sched.in_flight.is_empty() {
                Step::ReturnOk
            } else {
                Step::Wait
            };
        }

        if sched.ready.is_empty() {
            return if sched.in_flight.is_empty() {
                sched.err = Some(GraphError::RuntimeUnreachable);
                Step::Loop
            } else {
                Step::Wait
            };
        }

        let node = sched.ready.pop_front().expect("checked non-empty above");
        if sched.visited.contains(&node) {
            return Step::Loop;
        }
        sched.in_flight.insert(node.clone());
        Step::Dispatch(node)
    }

    /// Runs a single node's handler to completion, then processes its
    /// outgoing edges (or, for a failed node, just records the failure) and
    /// clears it from `in_flight`. Cancellation is the handler's own
    /// responsibility to observe via `ctx`; the scheduler never polls the
    /// token itself, only reacts to it while waiting (see `run`).
    async fn run_node(self: Arc<Self>, node: String) {
        let ctx = RunContext::new(node.clone(), self.cancel.clone());
        let handler = self
            .executor
            .nodes
            .get(&node)
            .cloned()
            .expect("dispatched node must be registered");
        let state = self.state.clone();

        tracing::debug!(node = %node, "dispatching node");
        let result = handler(ctx.clone(), state).await;
        let is_finish_node = self
            .executor
            .node_info
            .get(&node)
            .map(|info| info.is_finish)
            .unwrap_or(false);

        match result {
            Ok(()) => {
                let is_finish = {
                    let mut sched = self.scheduler.lock();
                    sched.visited.insert(node.clone());
                    sched.dirty = true;
                    if is_finish_node {
                        sched.finished = true;
                    }
                    is_finish_node
                };
                self.notify.notify_one();
                if !is_finish {
                    self.process_outgoing(&node, &ctx);
                }
            }
            Err(err) => {
                tracing::warn!(node = %node, error = %err, "handler failed");
                self.fail(GraphError::HandlerError {
                    node: node.clone(),
                    message: err.to_string(),
                });
            }
        }

        self.node_done(&node);
    }

    /// Evaluates `node`'s outgoing edges after a successful run and feeds
    /// each destination through `satisfy`.
    ///
    /// Unconditional nodes activate every destination. Conditional nodes
    /// route exclusively: the first edge whose condition is true is
    /// activated, every other edge (those evaluated false, and every edge
    /// after the match) is marked skipped.
    fn process_outgoing(&self, node: &str, ctx: &RunContext) {
        let info = self
            .executor
            .node_info
            .get(node)
            .expect("node_info covers every node");

        if !info.has_conditions {
            for dest in &info.unconditional_dests {
                self.satisfy(dest, true);
            }
            return;
        }

        let mut matched = false;
        for edge in &info.out_edges {
            if matched {
                self.satisfy(&edge.to, false);
                continue;
            }
            let Some(condition) = &edge.condition else {
                self.fail(GraphError::ConditionMissing { node: node.to_string() });
                return;
            };
            if condition(ctx, &self.state) {
                matched = true;
                self.satisfy(&edge.to, true);
            } else {
                self.satisfy(&edge.to, false);
            }
        }

        if !matched {
            self.fail(GraphError::NoConditionMatched { node: node.to_string() });
        }
    }

    /// The core scheduling primitive: records one incoming edge firing
    /// (active or skipped) at `to`, and if that was its last pending
    /// dependency, either enqueues it as ready (it received at least one
    /// active contribution) or marks it visited-by-skip and recursively
    /// propagates the skip to its own outgoing edges, all without holding
    /// the lock across the recursive calls.
    fn satisfy(&self, to: &str, activated: bool) {
        let mut sched = self.scheduler.lock();

        if sched.visited.contains(to) {
            return;
        }

        let info = match self.executor.node_info.get(to) {
            Some(info) => info,
            None => return,
        };

        if info.dependencies == 0 {
            return;
        }

        if activated {
            *sched.received.entry(to.to_string()).or_insert(0) += 1;
        }

        let entry = sched.remaining.entry(to.to_string()).or_insert(info.dependencies as i64);
        *entry -= 1;
        if *entry < 0 {
            *entry = 0;
        }
        let remaining = *entry;

        if remaining != 0 || sched.in_flight.contains(to) {
            return;
        }

        let received = *sched.received.get(to).unwrap_or(&0);
        sched.dirty = true;

        if received == 0 {
            sched.visited.insert(to.to_string());
            sched.received.remove(to);
            let successors: Vec<String> = info.out_edges.iter().map(|e| e.to.clone()).collect();
            drop(sched);
            self.notify.notify_one();
            for succ in successors {
                self.satisfy(&succ, false);
            }
        } else {
            sched.ready.push_back(to.to_string());
            drop(sched);
            self.notify.notify_one();
        }
    }

    fn node_done(&self, node: &str) {
        let mut sched = self.scheduler.lock();
        sched.in_flight.remove(node);
        drop(sched);
        self.notify.notify_one();
    }

    fn fail(&self, err: GraphError) {
        let mut sched = self.scheduler.lock();
        if sched.err.is_none() {
            sched.err = Some(err);
        }
        drop(sched);
        self.notify.notify_one();
    }
}
