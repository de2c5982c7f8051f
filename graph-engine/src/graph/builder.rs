//! The fluent, error-accumulating graph builder.

use std::collections::{HashMap, HashSet};

use super::edge::Edge;
use super::node_info::NodeInfo;
use super::validate;
use crate::error::CompilationError;
use crate::executor::{Executor, ExecutorInner};
use crate::handler::{Condition, Handler, Middleware};
use crate::middleware::compose;

/// Builds a DAG of named nodes and edges, then validates and freezes it into
/// an [`Executor`] via [`Graph::compile`].
///
/// Mirrors the fluent `&mut self -> &mut Self` chaining style: most
/// mutations are cheap to detect as invalid immediately, but the first such
/// problem is only surfaced at `compile`, not at the call site. This keeps
/// the builder infallible to use and lets callers build a graph in whatever
/// order is convenient.
pub struct Graph {
    nodes: HashMap<String, Handler>,
    edges: HashMap<String, Vec<Edge>>,
    entry: Option<String>,
    finish: Option<String>,
    parallel: bool,
    middleware: Vec<Middleware>,
    pending_error: Option<CompilationError>,
}

impl Graph {
    /// Creates an empty graph. Parallel dispatch is enabled by default.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            finish: None,
            parallel: true,
            middleware: Vec::new(),
            pending_error: None,
        }
    }

    fn record_error(&mut self, err: CompilationError) {
        if self.pending_error.is_none() {
            self.pending_error = Some(err);
        }
    }

    /// Registers a node's handler under `name`. Duplicate or empty names are
    /// recorded as a deferred `InvalidGraph` error, surfaced at `compile`.
    pub fn add_node(&mut self, name: impl Into<String>, handler: Handler) -> &mut Self {
        let name = name.into();
        if name.is_empty() {
            self.record_error(CompilationError::InvalidGraph("node name must not be empty".into()));
            return self;
        }
        if self.nodes.contains_key(&name) {
            self.record_error(CompilationError::InvalidGraph(format!("duplicate node '{name}'")));
            return self;
        }
        self.nodes.insert(name, handler);
        self
    }

    /// Adds an unconditional edge from `from` to `to`.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.push_edge(from.into(), Edge::unconditional(to))
    }

    /// Adds a conditional edge from `from` to `to`, guarded by `condition`.
    pub fn add_conditional_edge(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        condition: Condition,
    ) -> &mut Self {
        self.push_edge(from.into(), Edge::conditional(to, condition))
    }

    fn push_edge(&mut self, from: String, edge: Edge) -> &mut Self {
        let existing = self.edges.entry(from.clone()).or_default();
        if existing.iter().any(|e| e.to == edge.to) {
            self.record_error(CompilationError::InvalidGraph(format!(
                "duplicate edge '{from}' -> '{}'",
                edge.to
            )));
            return self;
        }
        existing.push(edge);
        self
    }

    /// Designates the single entry node. Calling this more than once
    /// records a deferred error.
    pub fn set_entry_point(&mut self, name: impl Into<String>) -> &mut Self {
        if self.entry.is_some() {
            self.record_error(CompilationError::InvalidGraph("entry point already set".into()));
            return self;
        }
        self.entry = Some(name.into());
        self
    }

    /// Designates the single finish node. Calling this more than once
    /// records a deferred error.
    pub fn set_finish_point(&mut self, name: impl Into<String>) -> &mut Self {
        if self.finish.is_some() {
            self.record_error(CompilationError::InvalidGraph("finish point already set".into()));
            return self;
        }
        self.finish = Some(name.into());
        self
    }

    /// Selects serial (`false`) or parallel (`true`, the default) dispatch
    /// of ready nodes.
    pub fn with_parallel(&mut self, parallel: bool) -> &mut Self {
        self.parallel = parallel;
        self
    }

    /// Registers one middleware. Middleware registered first wraps
    /// outermost around every node's handler.
    pub fn with_middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Registers several middleware at once, preserving order.
    pub fn with_middlewares(&mut self, middlewares: impl IntoIterator<Item = Middleware>) -> &mut Self {
        self.middleware.extend(middlewares);
        self
    }

    /// Validates the graph and, on success, freezes it into an immutable
    /// [`Executor`] with precomputed per-node scheduling facts.
    ///
    /// Validation order: any error deferred from the builder methods, then
    /// structural checks (entry/finish presence and existence, dangling
    /// edge endpoints), then acyclicity, then reachability of `finish` from
    /// `entry`. The first failure short-circuits the rest.
    pub fn compile(self) -> Result<Executor, CompilationError> {
        if let Some(err) = self.pending_error {
            return Err(err);
        }

        let entry = self
            .entry
            .clone()
            .ok_or_else(|| CompilationError::InvalidGraph("no entry point set".into()))?;
        let finish = self
            .finish
            .clone()
            .ok_or_else(|| CompilationError::InvalidGraph("no finish point set".into()))?;

        if !self.nodes.contains_key(&entry) {
            return Err(CompilationError::InvalidGraph(format!(
                "entry point '{entry}' is not a registered node"
            )));
        }
        if !self.nodes.contains_key(&finish) {
            return Err(CompilationError::InvalidGraph(format!(
                "finish point '{finish}' is not a registered node"
            )));
        }

        for (from, out) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(CompilationError::InvalidGraph(format!(
                    "edge source '{from}' is not a registered node"
                )));
            }
            for edge in out {
                if !self.nodes.contains_key(&edge.to) {
                    return Err(CompilationError::InvalidGraph(format!(
                        "edge destination '{}' is not a registered node",
                        edge.to
                    )));
                }
            }
        }

        let node_names: HashSet<String> = self.nodes.keys().cloned().collect();
        validate::detect_cycle(&node_names, &self.edges)?;
        validate::check_reachable(&entry, &finish, &self.edges)?;

        let mut in_degree: HashMap<String, u64> = node_names.iter().map(|n| (n.clone(), 0)).collect();
        for out in self.edges.values() {
            for edge in out {
                *in_degree.entry(edge.to.clone()).or_insert(0) += 1;
            }
        }

        let mut predecessors: HashMap<String, Vec<String>> = HashMap::new();
        for (from, out) in &self.edges {
            for edge in out {
                predecessors.entry(edge.to.clone()).or_default().push(from.clone());
            }
        }

        let mut node_info = HashMap::with_capacity(self.nodes.len());
        let mut compiled_nodes = HashMap::with_capacity(self.nodes.len());

        for (name, handler) in self.nodes {
            let out_edges = self.edges.get(&name).cloned().unwrap_or_default();
            let unconditional_dests = out_edges
                .iter()
                .filter(|e| e.condition.is_none())
                .map(|e| e.to.clone())
                .collect();
            let has_conditions = out_edges.iter().any(|e| e.condition.is_some());
            let dependencies = *in_degree.get(&name).unwrap_or(&0);
            let is_finish = name == finish;

            node_info.insert(
                name.clone(),
                NodeInfo {
                    out_edges,
                    unconditional_dests,
                    has_conditions,
                    dependencies,
                    is_finish,
                },
            );

            let wrapped = compose(&self.middleware, handler);
            compiled_nodes.insert(name, wrapped);
        }

        Ok(Executor::new(ExecutorInner {
            nodes: compiled_nodes,
            node_info,
            predecessors,
            entry,
            finish,
            parallel: self.parallel,
        }))
    }
}
