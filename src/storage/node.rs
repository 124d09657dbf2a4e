//! Storage node implementation
//!
//! A node holds at most one fragment. Failing a node makes its fragment
//! unreadable without discarding it, so a later reset brings it back.

use crate::erasure::Fragment;
use serde::{Deserialize, Serialize};

/// Unique identifier for a storage node, equal to its position in the cluster
pub type NodeId = usize;

/// State of a storage node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// Node is serving reads
    Alive,
    /// Node has failed and is not accessible
    Dead,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeState::Alive => write!(f, "Alive"),
            NodeState::Dead => write!(f, "Dead"),
        }
    }
}

/// A storage node that can hold one fragment
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,
    state: NodeState,
    fragment: Option<Fragment>,
}

impl Node {
    /// Create a new empty, alive node
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            state: NodeState::Alive,
            fragment: None,
        }
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state == NodeState::Alive
    }

    /// Place a fragment on this node, replacing any previous one
    pub fn store(&mut self, fragment: Fragment) {
        self.fragment = Some(fragment);
    }

    /// The stored fragment, if the node is alive and holds one
    pub fn fragment(&self) -> Option<&Fragment> {
        if self.is_alive() {
            self.fragment.as_ref()
        } else {
            None
        }
    }

    /// Whether a fragment is placed here, regardless of node state
    pub fn holds_fragment(&self) -> bool {
        self.fragment.is_some()
    }

    /// Drop the stored fragment
    pub fn clear(&mut self) {
        self.fragment = None;
    }

    /// Simulate node failure
    pub fn fail(&mut self) {
        self.state = NodeState::Dead;
    }

    /// Simulate node recovery
    pub fn recover(&mut self) {
        self.state = NodeState::Alive;
    }
}
