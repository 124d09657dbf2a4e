//! Storage simulation module
//!
//! In-memory nodes and the cluster that places fragments on them and
//! injects node failures.

pub mod cluster;
pub mod node;

pub use cluster::{Cluster, ClusterHealth};
pub use node::{Node, NodeId, NodeState};
