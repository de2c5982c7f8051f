//! Edge representation.

use crate::handler::Condition;

/// A single outgoing edge from some source node (the source is the key in
/// `Graph::edges`, not stored redundantly here).
#[derive(Clone)]
pub struct Edge {
    /// Destination node name.
    pub to: String,
    /// `None` for an unconditional edge; `Some` for a conditional one.
    pub condition: Option<Condition>,
}

impl Edge {
    pub fn unconditional(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            condition: None,
        }
    }

    pub fn conditional(to: impl Into<String>, condition: Condition) -> Self {
        Self {
            to: to.into(),
            condition: Some(condition),
        }
    }
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Edge")
            .field("to", &self.to)
            .field(
                "condition",
                &self.condition.as_ref().map(|_| "<condition>").unwrap_or("<none>"),
            )
            .finish()
    }
}
