//! Checkpoint value type: a quiescent snapshot sufficient to resume a run.
//!
//! A checkpoint is produced by the scheduler only at a quiescent point (no
//! handler in flight), so it is always a consistent cut of the run (see
//! `graph_engine::task` for the emission side). It is intentionally
//! value-semantic and serialization-format-agnostic: sinks may encode it
//! however they like (JSON, bincode, a database row, ...).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A value-semantic, cloneable snapshot of one quiescent point in a run.
///
/// - `id` and `created_at` identify this snapshot, stamped the way
///   checkpoint metadata tags every saved tuple.
/// - `received` mirrors the scheduler's `received` map: the count of active
///   (non-skipped) incoming contributions observed per node so far.
/// - `visited` mirrors the scheduler's `visited` set: nodes that have either
///   completed or been fully skipped.
/// - `state` is the flat snapshot of the shared run state at the moment the
///   checkpoint was taken (see `State::snapshot`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    /// Unique identifier for this checkpoint.
    pub id: Uuid,
    /// When this checkpoint was taken.
    pub created_at: DateTime<Utc>,
    /// Active-contribution counts per node name.
    pub received: HashMap<String, u64>,
    /// Nodes that have completed or been fully skipped.
    pub visited: HashSet<String>,
    /// Snapshot of the shared run state.
    pub state: HashMap<String, serde_json::Value>,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self::new(HashMap::new(), HashSet::new(), HashMap::new())
    }
}

impl Checkpoint {
    /// Builds a checkpoint from its three constituent parts, stamping it
    /// with a fresh id and the current time.
    pub fn new(
        received: HashMap<String, u64>,
        visited: HashSet<String>,
        state: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            received,
            visited,
            state,
        }
    }

    /// Whether `node` had completed or been skipped at the time of this snapshot.
    pub fn has_visited(&self, node: &str) -> bool {
        self.visited.contains(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_identity_on_received_visited_state() {
        let mut received = HashMap::new();
        received.insert("a".to_string(), 1u64);
        let mut visited = HashSet::new();
        visited.insert("a".to_string());
        let mut state = HashMap::new();
        state.insert("x".to_string(), serde_json::json!(1));

        let cp = Checkpoint::new(received.clone(), visited.clone(), state.clone());
        let encoded = serde_json::to_string(&cp).expect("serialize");
        let decoded: Checkpoint = serde_json::from_str(&encoded).expect("deserialize");

        assert_eq!(decoded.received, received);
        assert_eq!(decoded.visited, visited);
        assert_eq!(decoded.state, state);
    }

    #[test]
    fn has_visited_reflects_visited_set() {
        let cp = Checkpoint::new(HashMap::new(), HashSet::from(["n".to_string()]), HashMap::new());
        assert!(cp.has_visited("n"));
        assert!(!cp.has_visited("other"));
    }
}
