//! Compile-time structural validation: acyclicity and reachability.
//!
//! Run in the fixed order the scheduler relies on for its own invariants to
//! hold: structural checks, then acyclicity (3-color DFS), then
//! reachability (BFS), short-circuiting on the first failure.

use std::collections::{HashMap, HashSet};

use super::edge::Edge;
use crate::error::CompilationError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Detects a directed cycle anywhere in the graph (every edge counts,
/// conditional or not: a cycle is a structural property, independent of
/// which branch runs at execution time).
pub(crate) fn detect_cycle(
    nodes: &HashSet<String>,
    edges: &HashMap<String, Vec<Edge>>,
) -> Result<(), CompilationError> {
    let mut color: HashMap<&str, Color> = nodes.iter().map(|n| (n.as_str(), Color::White)).collect();
    let mut path: Vec<String> = Vec::new();

    for start in nodes {
        if color[start.as_str()] == Color::White {
            visit(start, nodes, edges, &mut color, &mut path)?;
        }
    }
    Ok(())
}

fn visit<'a>(
    node: &'a str,
    nodes: &'a HashSet<String>,
    edges: &'a HashMap<String, Vec<Edge>>,
    color: &mut HashMap<&'a str, Color>,
    path: &mut Vec<String>,
) -> Result<(), CompilationError> {
    color.insert(node, Color::Gray);
    path.push(node.to_string());

    if let Some(out) = edges.get(node) {
        for edge in out {
            match color.get(edge.to.as_str()) {
                Some(Color::Gray) => {
                    path.push(edge.to.clone());
                    return Err(CompilationError::CycleDetected(path.join(" -> ")));
                }
                Some(Color::White) => {
                    visit(edge.to.as_str(), nodes, edges, color, path)?;
                }
                _ => {}
            }
        }
    }

    path.pop();
    color.insert(node, Color::Black);
    Ok(())
}

/// Checks that `finish` is reachable from `entry` ignoring conditions,
/// structural reachability only. A conditionally-unreachable finish (every
/// path to it is gated) is a run-time concern (`NoConditionMatched`), not a
/// compile-time one.
pub(crate) fn check_reachable(
    entry: &str,
    finish: &str,
    edges: &HashMap<String, Vec<Edge>>,
) -> Result<(), CompilationError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(entry);
    seen.insert(entry);

    while let Some(node) = queue.pop_front() {
        if node == finish {
            return Ok(());
        }
        if let Some(out) = edges.get(node) {
            for edge in out {
                if seen.insert(edge.to.as_str()) {
                    queue.push_back(edge.to.as_str());
                }
            }
        }
    }

    Err(CompilationError::UnreachableFinish(format!(
        "no path from '{entry}' to '{finish}'"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> HashMap<String, Vec<Edge>> {
        let mut map: HashMap<String, Vec<Edge>> = HashMap::new();
        for (from, to) in pairs {
            map.entry(from.to_string()).or_default().push(Edge::unconditional(*to));
        }
        map
    }

    #[test]
    fn acyclic_graph_passes() {
        let nodes = set(&["a", "b", "c"]);
        let edges = edges(&[("a", "b"), ("b", "c")]);
        assert!(detect_cycle(&nodes, &edges).is_ok());
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let nodes = set(&["a"]);
        let edges = edges(&[("a", "a")]);
        assert!(matches!(
            detect_cycle(&nodes, &edges),
            Err(CompilationError::CycleDetected(_))
        ));
    }

    #[test]
    fn longer_cycle_is_detected() {
        let nodes = set(&["a", "b", "c"]);
        let edges = edges(&[("a", "b"), ("b", "c"), ("c", "a")]);
        assert!(matches!(
            detect_cycle(&nodes, &edges),
            Err(CompilationError::CycleDetected(_))
        ));
    }

    #[test]
    fn reachable_finish_passes() {
        let edges = edges(&[("a", "b"), ("b", "c")]);
        assert!(check_reachable("a", "c", &edges).is_ok());
    }

    #[test]
    fn unreachable_finish_fails() {
        let edges = edges(&[("a", "b")]);
        assert!(matches!(
            check_reachable("a", "c", &edges),
            Err(CompilationError::UnreachableFinish(_))
        ));
    }
}
