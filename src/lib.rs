//! Erasure Coding Comparison
//!
//! Compares flat Reed-Solomon against Local Reconstruction Codes by encoding
//! a payload, failing storage nodes in an in-memory cluster and rebuilding
//! the payload under each scheme. The repair planner decides, per erasure
//! pattern, whether a cheap local XOR repair suffices or the global code has
//! to run, and the metrics layer turns that decision into bandwidth and
//! computation figures.

pub mod erasure;
pub mod error;
pub mod metrics;
pub mod simulation;
pub mod storage;
pub mod ui;

pub use erasure::{ErasureScheme, Fragment, FragmentKind, RepairStrategy, SchemeConfig};
pub use error::{Error, Result};
pub use metrics::{MetricsCollector, MetricsSummary};
pub use simulation::scenario::{ScenarioOverrides, ScenarioRunner};
pub use simulation::Simulator;
pub use storage::{Cluster, Node};

use serde::{Deserialize, Serialize};

/// Run-level configuration, one value per environment setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    /// Total number of storage nodes
    pub num_nodes: usize,
    /// Nodes failed in each phase
    pub failure_count: usize,
    /// Reed-Solomon data fragments
    pub rs_k: usize,
    /// Reed-Solomon parity fragments
    pub rs_r: usize,
    /// LRC data fragments
    pub lrc_k: usize,
    /// Data fragments per LRC local group
    pub lrc_group_size: usize,
    /// Local parity fragments per LRC group
    pub lrc_local_parity: usize,
    /// LRC global parity fragments
    pub lrc_global_parity: usize,
    /// Pause between the RS and LRC phases, in milliseconds
    pub phase_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_nodes: 10,
            failure_count: 1,
            rs_k: 6,
            rs_r: 3,
            lrc_k: 6,
            lrc_group_size: 3,
            lrc_local_parity: 1,
            lrc_global_parity: 2,
            phase_delay_ms: 10,
        }
    }
}

impl Config {
    pub fn rs_scheme(&self) -> SchemeConfig {
        SchemeConfig::flat_rs(self.rs_k, self.rs_r)
    }

    pub fn lrc_scheme(&self) -> SchemeConfig {
        SchemeConfig::lrc(
            self.lrc_k,
            self.lrc_group_size,
            self.lrc_local_parity,
            self.lrc_global_parity,
        )
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("NUM_NODES", self.num_nodes),
            ("FAILURE_COUNT", self.failure_count),
            ("RS_K", self.rs_k),
            ("RS_R", self.rs_r),
            ("LRC_K", self.lrc_k),
            ("LRC_GROUP_SIZE", self.lrc_group_size),
            ("LRC_LOCAL_PARITY", self.lrc_local_parity),
            ("LRC_GLOBAL_PARITY", self.lrc_global_parity),
        ];
        if let Some((name, _)) = counts.iter().find(|(_, value)| *value == 0) {
            return Err(Error::Configuration(format!(
                "{} must be greater than 0",
                name
            )));
        }

        self.rs_scheme().validate(self.num_nodes)?;
        self.lrc_scheme().validate(self.num_nodes)?;

        if self.failure_count > self.num_nodes {
            return Err(Error::Configuration(format!(
                "cannot fail {} of {} nodes",
                self.failure_count, self.num_nodes
            )));
        }
        Ok(())
    }

    /// This configuration with every set field of `overrides` applied
    pub fn with_overrides(&self, overrides: &ScenarioOverrides) -> Self {
        Self {
            num_nodes: overrides.num_nodes.unwrap_or(self.num_nodes),
            failure_count: overrides.failure_count.unwrap_or(self.failure_count),
            rs_k: overrides.rs_k.unwrap_or(self.rs_k),
            rs_r: overrides.rs_r.unwrap_or(self.rs_r),
            lrc_k: overrides.lrc_k.unwrap_or(self.lrc_k),
            lrc_group_size: overrides.lrc_group_size.unwrap_or(self.lrc_group_size),
            lrc_local_parity: overrides.lrc_local_parity.unwrap_or(self.lrc_local_parity),
            lrc_global_parity: overrides.lrc_global_parity.unwrap_or(self.lrc_global_parity),
            phase_delay_ms: overrides.phase_delay_ms.unwrap_or(self.phase_delay_ms),
        }
    }
}
