//! Repair strategy selection
//!
//! The planner is a pure function of the scheme parameters and the erasure
//! pattern. Scheme decoders call it and follow its decision, and the
//! metrics layer reads its fragment set to report the repair bandwidth.
//!
//! LRC branch order:
//!
//! 1. nothing erased: read the stored data fragments directly
//! 2. exactly one fragment erased, it is a data fragment, and its group's
//!    local parity survives: local XOR repair inside that group
//! 3. anything else: global repair. Every group left with exactly one
//!    missing data fragment and a surviving local parity is first rebuilt
//!    by XOR; the global code over `[data | global parity]` only corrects
//!    what is still missing after that.
//!
//! Flat RS only has branches 1 and 3, and has no groups to rebuild.

use crate::erasure::{SchemeConfig, SchemeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How an erasure pattern gets repaired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairStrategy {
    /// No repair needed; data fragments are read as stored
    Direct,
    /// XOR repair within one local group
    Local,
    /// Erasure decoding with the global linear code
    Global,
}

impl std::fmt::Display for RepairStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepairStrategy::Direct => write!(f, "Direct"),
            RepairStrategy::Local => write!(f, "Local"),
            RepairStrategy::Global => write!(f, "Global"),
        }
    }
}

/// Output of the planner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairPlan {
    pub strategy: RepairStrategy,
    /// Erased layout positions the planner considered
    pub erased: BTreeSet<usize>,
    /// Minimal set of fragments the repair reads
    pub fragments_to_read: BTreeSet<usize>,
    /// Group repaired by a local plan
    pub local_group: Option<usize>,
    /// Groups rebuilt by XOR before a global plan runs the linear code
    pub xor_groups: Vec<usize>,
    /// Erased positions the linear code has to correct; 0 when every data
    /// fragment is present or rebuilt by XOR
    pub codeword_erasures: usize,
    /// Erasures the strategy's code corrects
    pub capacity: usize,
}

impl RepairPlan {
    /// Whether the plan can succeed
    pub fn is_recoverable(&self) -> bool {
        self.codeword_erasures <= self.capacity
    }

    pub fn reads(&self) -> usize {
        self.fragments_to_read.len()
    }
}

/// Decides the repair strategy for one scheme
#[derive(Debug, Clone, Copy)]
pub struct RepairPlanner<'a> {
    config: &'a SchemeConfig,
}

impl<'a> RepairPlanner<'a> {
    pub fn new(config: &'a SchemeConfig) -> Self {
        Self { config }
    }

    /// Plan the repair of `erased`. Positions outside the scheme layout are
    /// ignored (a failed node holding no fragment costs nothing).
    pub fn plan(&self, erased: &BTreeSet<usize>) -> RepairPlan {
        let total = self.config.total_fragments();
        let erased: BTreeSet<usize> = erased.iter().copied().filter(|&i| i < total).collect();

        if erased.is_empty() {
            return self.direct(erased);
        }

        if self.config.kind == SchemeKind::Lrc && erased.len() == 1 {
            if let Some(plan) = self.local(&erased) {
                return plan;
            }
        }

        self.global(erased)
    }

    fn direct(&self, erased: BTreeSet<usize>) -> RepairPlan {
        RepairPlan {
            strategy: RepairStrategy::Direct,
            erased,
            fragments_to_read: (0..self.config.k).collect(),
            local_group: None,
            xor_groups: Vec::new(),
            codeword_erasures: 0,
            capacity: 0,
        }
    }

    fn local(&self, erased: &BTreeSet<usize>) -> Option<RepairPlan> {
        let &lost = erased.iter().next()?;
        let group = self.config.group_of(lost)?;
        let parity = self.config.local_parity_index(group);
        if erased.contains(&parity) {
            return None;
        }

        let fragments_to_read = self
            .config
            .group_members(group)
            .filter(|&i| i != lost)
            .chain(std::iter::once(parity))
            .collect();

        Some(RepairPlan {
            strategy: RepairStrategy::Local,
            erased: erased.clone(),
            fragments_to_read,
            local_group: Some(group),
            xor_groups: Vec::new(),
            codeword_erasures: 1,
            capacity: 1,
        })
    }

    fn global(&self, erased: BTreeSet<usize>) -> RepairPlan {
        let config = self.config;
        let mut fragments_to_read = BTreeSet::new();
        let mut rebuilt = BTreeSet::new();

        let xor_groups: Vec<usize> = (0..config.num_groups())
            .filter(|&group| {
                let parity = config.local_parity_index(group);
                let lost = config.group_members(group).filter(|i| erased.contains(i));
                lost.count() == 1 && !erased.contains(&parity)
            })
            .collect();
        for &group in &xor_groups {
            for i in config.group_members(group) {
                if erased.contains(&i) {
                    rebuilt.insert(i);
                } else {
                    fragments_to_read.insert(i);
                }
            }
            fragments_to_read.insert(config.local_parity_index(group));
        }

        let missing_data = (0..config.k)
            .filter(|i| erased.contains(i) && !rebuilt.contains(i))
            .count();
        fragments_to_read.extend((0..config.k).filter(|i| !erased.contains(i)));
        fragments_to_read.extend(
            config
                .global_parity_range()
                .filter(|i| !erased.contains(i))
                .take(missing_data),
        );

        let codeword_erasures = if missing_data == 0 {
            0
        } else {
            missing_data
                + config
                    .global_parity_range()
                    .filter(|i| erased.contains(i))
                    .count()
        };

        RepairPlan {
            strategy: RepairStrategy::Global,
            erased,
            fragments_to_read,
            local_group: None,
            xor_groups,
            codeword_erasures,
            capacity: config.global_parity_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[usize]) -> BTreeSet<usize> {
        items.iter().copied().collect()
    }

    fn lrc() -> SchemeConfig {
        SchemeConfig::lrc(6, 3, 1, 2)
    }

    #[test]
    fn test_no_erasure_is_direct() {
        let config = lrc();
        let plan = RepairPlanner::new(&config).plan(&set(&[]));
        assert_eq!(plan.strategy, RepairStrategy::Direct);
        assert_eq!(plan.fragments_to_read, set(&[0, 1, 2, 3, 4, 5]));
        assert!(plan.is_recoverable());
    }

    #[test]
    fn test_single_data_failure_is_local() {
        let config = lrc();
        let plan = RepairPlanner::new(&config).plan(&set(&[1]));
        assert_eq!(plan.strategy, RepairStrategy::Local);
        assert_eq!(plan.local_group, Some(0));
        assert_eq!(plan.fragments_to_read, set(&[0, 2, 6]));
        assert_eq!(plan.reads(), 3);
    }

    #[test]
    fn test_single_failure_in_second_group() {
        let config = lrc();
        let plan = RepairPlanner::new(&config).plan(&set(&[5]));
        assert_eq!(plan.strategy, RepairStrategy::Local);
        assert_eq!(plan.local_group, Some(1));
        assert_eq!(plan.fragments_to_read, set(&[3, 4, 7]));
    }

    #[test]
    fn test_short_last_group_reads_fewer() {
        let config = SchemeConfig::lrc(7, 3, 1, 2);
        let plan = RepairPlanner::new(&config).plan(&set(&[6]));
        assert_eq!(plan.strategy, RepairStrategy::Local);
        // Group 2 holds only fragment 6, so only its parity is read
        assert_eq!(plan.fragments_to_read, set(&[9]));
    }

    #[test]
    fn test_data_and_local_parity_failure_is_global() {
        let config = lrc();
        let plan = RepairPlanner::new(&config).plan(&set(&[1, 6]));
        assert_eq!(plan.strategy, RepairStrategy::Global);
        assert_eq!(plan.codeword_erasures, 1);
        assert_eq!(plan.capacity, 2);
        assert!(plan.is_recoverable());
        assert_eq!(plan.fragments_to_read, set(&[0, 2, 3, 4, 5, 8]));
    }

    #[test]
    fn test_parity_only_failures_are_global() {
        let config = lrc();

        let plan = RepairPlanner::new(&config).plan(&set(&[6]));
        assert_eq!(plan.strategy, RepairStrategy::Global);
        assert_eq!(plan.codeword_erasures, 0);

        let plan = RepairPlanner::new(&config).plan(&set(&[9]));
        assert_eq!(plan.strategy, RepairStrategy::Global);
        // All data survives, so the linear code has nothing to correct
        assert_eq!(plan.codeword_erasures, 0);
        assert_eq!(plan.fragments_to_read, set(&[0, 1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_two_failures_in_different_groups_are_global() {
        let config = lrc();
        let plan = RepairPlanner::new(&config).plan(&set(&[0, 4]));
        assert_eq!(plan.strategy, RepairStrategy::Global);
        assert_eq!(plan.xor_groups, vec![0, 1]);
        assert_eq!(plan.codeword_erasures, 0);
        assert!(plan.is_recoverable());
        assert_eq!(plan.fragments_to_read, set(&[1, 2, 3, 5, 6, 7]));
    }

    #[test]
    fn test_two_failures_in_one_group_use_the_code() {
        let config = lrc();
        let plan = RepairPlanner::new(&config).plan(&set(&[0, 1]));
        assert!(plan.xor_groups.is_empty());
        assert_eq!(plan.codeword_erasures, 2);
        assert!(plan.is_recoverable());
        assert_eq!(plan.fragments_to_read, set(&[2, 3, 4, 5, 8, 9]));
    }

    #[test]
    fn test_xor_rebuild_covers_lost_global_parity() {
        let config = lrc();
        let plan = RepairPlanner::new(&config).plan(&set(&[0, 8, 9]));
        assert_eq!(plan.strategy, RepairStrategy::Global);
        assert_eq!(plan.xor_groups, vec![0]);
        assert_eq!(plan.codeword_erasures, 0);
        assert!(plan.is_recoverable());
        assert_eq!(plan.fragments_to_read, set(&[1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn test_xor_rebuild_shrinks_codeword_erasures() {
        let config = lrc();
        // Group 1 rebuilds fragment 3; group 0 still needs the code
        let plan = RepairPlanner::new(&config).plan(&set(&[0, 1, 3]));
        assert_eq!(plan.xor_groups, vec![1]);
        assert_eq!(plan.codeword_erasures, 2);
        assert!(plan.is_recoverable());

        let plan = RepairPlanner::new(&config).plan(&set(&[0, 1, 3, 8]));
        assert_eq!(plan.codeword_erasures, 3);
        assert!(!plan.is_recoverable());
    }

    #[test]
    fn test_three_data_failures_exceed_capacity() {
        let config = lrc();
        let plan = RepairPlanner::new(&config).plan(&set(&[0, 1, 2]));
        assert_eq!(plan.strategy, RepairStrategy::Global);
        assert!(!plan.is_recoverable());
        assert_eq!(plan.reads(), 5);
    }

    #[test]
    fn test_flat_rs_never_local() {
        let config = SchemeConfig::flat_rs(6, 3);
        let plan = RepairPlanner::new(&config).plan(&set(&[1]));
        assert_eq!(plan.strategy, RepairStrategy::Global);
        assert_eq!(plan.fragments_to_read, set(&[0, 2, 3, 4, 5, 6]));
        assert_eq!(plan.capacity, 3);
    }

    #[test]
    fn test_positions_outside_layout_ignored() {
        let config = SchemeConfig::flat_rs(6, 3);
        let plan = RepairPlanner::new(&config).plan(&set(&[9]));
        assert_eq!(plan.strategy, RepairStrategy::Direct);
        assert!(plan.erased.is_empty());
    }
}
