//! Shared mutable run state.
//!
//! `State` is a cheaply-clonable handle (an `Arc` around a
//! `parking_lot::RwLock<HashMap<String, Value>>`), passed by value to every
//! node handler. Cloning a `State` never copies the underlying map; it hands
//! out another reference to the same run's data, the way a channel's
//! values are shared across concurrent readers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

/// Handle to a run's shared key/value state.
///
/// All clones of a `State` observe each other's writes; there is no
/// copy-on-write or branching. Node handlers are expected not to retain a
/// `State` beyond the call in which it was handed to them.
#[derive(Debug, Clone)]
pub struct State {
    inner: Arc<RwLock<HashMap<String, Value>>>,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Builds a fresh `State` handle seeded from `map`. Used both by callers
    /// constructing an initial state and by the scheduler when rehydrating
    /// from a checkpoint.
    pub fn restore(map: HashMap<String, Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Reads the value stored under `key`, if any.
    pub fn load(&self, key: &str) -> Option<Value> {
        self.inner.read().get(key).cloned()
    }

    /// Writes `value` under `key`, overwriting any previous value.
    pub fn store(&self, key: impl Into<String>, value: Value) {
        self.inner.write().insert(key.into(), value);
    }

    /// Removes `key`, returning its prior value if present.
    pub fn delete(&self, key: &str) -> Option<Value> {
        self.inner.write().remove(key)
    }

    /// A flat, point-in-time copy of the entire state map.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.inner.read().clone()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the state currently holds no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn store_then_load_round_trips() {
        let state = State::new();
        state.store("count", json!(1));
        assert_eq!(state.load("count"), Some(json!(1)));
    }

    #[test]
    fn clones_share_the_same_backing_map() {
        let state = State::new();
        let clone = state.clone();
        clone.store("k", json!("v"));
        assert_eq!(state.load("k"), Some(json!("v")));
    }

    #[test]
    fn delete_removes_and_returns_prior_value() {
        let state = State::new();
        state.store("k", json!(1));
        assert_eq!(state.delete("k"), Some(json!(1)));
        assert_eq!(state.load("k"), None);
        assert_eq!(state.delete("k"), None);
    }

    #[test]
    fn snapshot_is_a_detached_copy() {
        let state = State::new();
        state.store("k", json!(1));
        let snap = state.snapshot();
        state.store("k", json!(2));
        assert_eq!(snap.get("k"), Some(&json!(1)));
        assert_eq!(state.load("k"), Some(json!(2)));
    }

    #[test]
    fn restore_seeds_from_a_map() {
        let mut map = HashMap::new();
        map.insert("k".to_string(), json!(42));
        let state = State::restore(map);
        assert_eq!(state.load("k"), Some(json!(42)));
    }
}
