//! Failure injection
//!
//! A run resolves its failure set once. Random plans draw from a seeded
//! generator when a seed is given, so a whole run can be replayed.

use crate::storage::{Cluster, NodeId};
use crate::Result;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Which nodes a phase fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePlan {
    /// Fail `count` distinct alive nodes chosen uniformly at random
    Random { count: usize },
    /// Fail exactly these nodes
    Directed(Vec<NodeId>),
}

impl FailurePlan {
    /// Number of nodes the plan fails, duplicates included
    pub fn count(&self) -> usize {
        match self {
            FailurePlan::Random { count } => *count,
            FailurePlan::Directed(ids) => ids.len(),
        }
    }
}

impl std::fmt::Display for FailurePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePlan::Random { count } => write!(f, "Random Failures ({})", count),
            FailurePlan::Directed(ids) => write!(f, "Directed Failures {:?}", ids),
        }
    }
}

/// Applies failure plans to a cluster
pub struct FailureSimulator {
    rng: StdRng,
}

impl FailureSimulator {
    /// Seeded simulator; `None` draws the seed from the OS
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Apply `plan` to `cluster` and return the failed node ids, ascending
    pub fn inject(&mut self, cluster: &mut Cluster, plan: &FailurePlan) -> Result<Vec<NodeId>> {
        let failed = match plan {
            FailurePlan::Random { count } => cluster.fail_random(*count, &mut self.rng)?,
            FailurePlan::Directed(ids) => cluster.fail_nodes(ids)?,
        };

        info!(plan = %plan, failed = ?failed, "injected node failures");
        Ok(failed)
    }
}

impl Default for FailureSimulator {
    fn default() -> Self {
        Self::new(None)
    }
}
