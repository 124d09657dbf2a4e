//! Cluster management for coordinating multiple storage nodes
//!
//! The cluster is the sole owner of its nodes. Fragments are placed with the
//! identity mapping (fragment `i` on node `i`), and callers change node
//! state only through `fail_*` and `reset`.

use crate::erasure::Fragment;
use crate::storage::{Node, NodeId};
use crate::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// A cluster of storage nodes
#[derive(Debug, Clone, Default)]
pub struct Cluster {
    nodes: Vec<Node>,
}

impl Cluster {
    /// Create a new empty cluster
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cluster with a specified number of alive nodes
    pub fn with_nodes(node_count: usize) -> Self {
        Self {
            nodes: (0..node_count).map(Node::new).collect(),
        }
    }

    /// Get the number of nodes in the cluster
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get a reference to a specific node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Place fragment `i` on node `i`.
    ///
    /// Every node is cleared first so nothing from an earlier phase lingers.
    pub fn distribute(&mut self, fragments: Vec<Fragment>) -> Result<()> {
        if fragments.len() > self.nodes.len() {
            return Err(Error::Configuration(format!(
                "Not enough nodes: need {}, have {}",
                fragments.len(),
                self.nodes.len()
            )));
        }

        for node in &mut self.nodes {
            node.clear();
        }
        let count = fragments.len();
        for (node, fragment) in self.nodes.iter_mut().zip(fragments) {
            node.store(fragment);
        }

        debug!(fragments = count, nodes = self.nodes.len(), "distributed fragments");
        Ok(())
    }

    /// Fail `count` distinct alive nodes chosen uniformly at random.
    ///
    /// Returns the failed node ids in ascending order.
    pub fn fail_random<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<NodeId>> {
        let alive = self.alive_nodes();
        if count > alive.len() {
            return Err(Error::Configuration(format!(
                "cannot fail {} nodes, only {} are alive",
                count,
                alive.len()
            )));
        }

        let mut chosen: Vec<NodeId> = alive.choose_multiple(rng, count).copied().collect();
        chosen.sort_unstable();
        for &id in &chosen {
            self.nodes[id].fail();
        }

        debug!(failed = ?chosen, "failed random nodes");
        Ok(chosen)
    }

    /// Fail exactly the given nodes.
    ///
    /// Duplicate ids are collapsed; failing an already dead node is a no-op.
    pub fn fail_nodes(&mut self, ids: &[NodeId]) -> Result<Vec<NodeId>> {
        let ids: BTreeSet<NodeId> = ids.iter().copied().collect();
        if let Some(&unknown) = ids.iter().find(|&&id| id >= self.nodes.len()) {
            return Err(Error::Configuration(format!(
                "Node {} not found in a cluster of {}",
                unknown,
                self.nodes.len()
            )));
        }

        for &id in &ids {
            self.nodes[id].fail();
        }

        debug!(failed = ?ids, "failed directed nodes");
        Ok(ids.into_iter().collect())
    }

    /// Mark every node alive again
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.recover();
        }
    }

    /// Ids of alive nodes, ascending
    pub fn alive_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.is_alive())
            .map(|n| n.id)
            .collect()
    }

    /// Ids of dead nodes, ascending
    pub fn dead_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| !n.is_alive())
            .map(|n| n.id)
            .collect()
    }

    /// Readable fragments for layout positions `0..total`, `None` where the
    /// node is dead, empty or missing
    pub fn collect(&self, total: usize) -> Vec<Option<Fragment>> {
        (0..total)
            .map(|i| self.nodes.get(i).and_then(Node::fragment).cloned())
            .collect()
    }

    /// Layout positions in `0..total` that cannot be read
    pub fn erasure_pattern(&self, total: usize) -> BTreeSet<usize> {
        (0..total)
            .filter(|&i| self.nodes.get(i).and_then(Node::fragment).is_none())
            .collect()
    }

    /// Get cluster health status
    pub fn health(&self) -> ClusterHealth {
        let alive = self.nodes.iter().filter(|n| n.is_alive()).count();
        ClusterHealth {
            total_nodes: self.nodes.len(),
            alive_nodes: alive,
            dead_nodes: self.nodes.len() - alive,
            stored_fragments: self.nodes.iter().filter(|n| n.holds_fragment()).count(),
            readable_fragments: self.nodes.iter().filter(|n| n.fragment().is_some()).count(),
        }
    }
}

/// Health status of the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterHealth {
    pub total_nodes: usize,
    pub alive_nodes: usize,
    pub dead_nodes: usize,
    /// Nodes holding a fragment, dead or alive
    pub stored_fragments: usize,
    /// Fragments currently readable
    pub readable_fragments: usize,
}

impl ClusterHealth {
    /// Whether any stored fragment is unreadable
    pub fn is_degraded(&self) -> bool {
        self.readable_fragments < self.stored_fragments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erasure::FragmentKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fragments(n: usize) -> Vec<Fragment> {
        (0..n)
            .map(|i| Fragment::new(i, FragmentKind::Data, vec![i as u8; 4]))
            .collect()
    }

    #[test]
    fn test_cluster_creation() {
        let cluster = Cluster::with_nodes(5);
        assert_eq!(cluster.node_count(), 5);
        assert_eq!(cluster.alive_nodes(), vec![0, 1, 2, 3, 4]);
        assert!(cluster.dead_nodes().is_empty());
    }

    #[test]
    fn test_distribute_identity_mapping() {
        let mut cluster = Cluster::with_nodes(6);
        cluster.distribute(fragments(4)).unwrap();

        for i in 0..4 {
            assert_eq!(cluster.node(i).and_then(Node::fragment).map(|f| f.index), Some(i));
        }
        assert!(!cluster.node(4).unwrap().holds_fragment());
        assert_eq!(cluster.health().stored_fragments, 4);
    }

    #[test]
    fn test_distribute_rejects_too_many_fragments() {
        let mut cluster = Cluster::with_nodes(3);
        assert!(matches!(
            cluster.distribute(fragments(4)),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_distribute_clears_previous_phase() {
        let mut cluster = Cluster::with_nodes(6);
        cluster.distribute(fragments(6)).unwrap();
        cluster.distribute(fragments(3)).unwrap();
        assert_eq!(cluster.health().stored_fragments, 3);
        assert_eq!(cluster.collect(6).iter().flatten().count(), 3);
    }

    #[test]
    fn test_fail_nodes_and_collect() {
        let mut cluster = Cluster::with_nodes(5);
        cluster.distribute(fragments(5)).unwrap();

        let failed = cluster.fail_nodes(&[3, 1, 3]).unwrap();
        assert_eq!(failed, vec![1, 3]);
        assert_eq!(cluster.dead_nodes(), vec![1, 3]);

        let collected = cluster.collect(5);
        assert!(collected[1].is_none() && collected[3].is_none());
        assert_eq!(collected.iter().flatten().count(), 3);
        assert_eq!(
            cluster.erasure_pattern(5).into_iter().collect::<Vec<_>>(),
            vec![1, 3]
        );

        let health = cluster.health();
        assert_eq!(health.dead_nodes, 2);
        assert!(health.is_degraded());
    }

    #[test]
    fn test_fail_unknown_node() {
        let mut cluster = Cluster::with_nodes(3);
        assert!(matches!(
            cluster.fail_nodes(&[3]),
            Err(Error::Configuration(_))
        ));
        assert!(cluster.dead_nodes().is_empty());
    }

    #[test]
    fn test_fail_random_is_seeded() {
        let mut a = Cluster::with_nodes(10);
        let mut b = Cluster::with_nodes(10);

        let first = a.fail_random(3, &mut StdRng::seed_from_u64(7)).unwrap();
        let second = b.fail_random(3, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(a.dead_nodes(), first);
    }

    #[test]
    fn test_fail_random_only_alive_nodes() {
        let mut cluster = Cluster::with_nodes(4);
        cluster.fail_nodes(&[0, 1]).unwrap();

        let failed = cluster
            .fail_random(2, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(failed, vec![2, 3]);
        assert!(cluster
            .fail_random(1, &mut StdRng::seed_from_u64(1))
            .is_err());
    }

    #[test]
    fn test_reset_restores_all_nodes() {
        let mut cluster = Cluster::with_nodes(4);
        cluster.distribute(fragments(4)).unwrap();
        cluster.fail_nodes(&[0, 2]).unwrap();

        cluster.reset();
        assert!(cluster.dead_nodes().is_empty());
        assert!(cluster.erasure_pattern(4).is_empty());
        assert!(!cluster.health().is_degraded());
    }

    #[test]
    fn test_collect_beyond_cluster() {
        let mut cluster = Cluster::with_nodes(2);
        cluster.distribute(fragments(2)).unwrap();
        let collected = cluster.collect(3);
        assert_eq!(collected.len(), 3);
        assert!(collected[2].is_none());
    }
}
