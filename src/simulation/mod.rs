//! Simulation module for orchestrating comparison runs
//!
//! One run encodes the same payload with both schemes on the same cluster.
//! The RS phase resolves the failure set; the cluster is reset and the LRC
//! phase replays exactly those node failures, so both schemes see the same
//! conditions.

pub mod failure;
pub mod recovery;
pub mod scenario;

pub use failure::{FailurePlan, FailureSimulator};
pub use recovery::{run_phase, PhaseOutcome};

use crate::erasure::create_scheme;
use crate::metrics::{MetricsCollector, MetricsSummary};
use crate::storage::{Cluster, NodeId};
use crate::{Config, Result};
use std::time::Duration;
use tracing::{info, instrument};

/// Payload used when the caller supplies none
pub const DEFAULT_PAYLOAD: &str = "We have ceased to be Men,\nA generation of weaklings.\n\n\
In the name of equality,\nWe have long lost chivalry,\nBirthing a hateful mentality,";

/// A simulation coordinator for one scenario
pub struct Simulator {
    config: Config,
    scenario_id: usize,
    /// The storage cluster shared by both phases
    pub cluster: Cluster,
    failures: FailureSimulator,
    directed: Option<Vec<NodeId>>,
}

impl Simulator {
    /// Validate `config` and build a cluster of `num_nodes` nodes
    pub fn new(config: Config, scenario_id: usize) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cluster: Cluster::with_nodes(config.num_nodes),
            config,
            scenario_id,
            failures: FailureSimulator::default(),
            directed: None,
        })
    }

    /// Draw random failures from a seeded generator
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.failures = FailureSimulator::new(Some(seed));
        self
    }

    /// Fail exactly these nodes instead of `failure_count` random ones
    pub fn with_failed_nodes(mut self, nodes: Vec<NodeId>) -> Self {
        self.directed = Some(nodes);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the RS phase, reset, then the LRC phase with the same failures
    #[instrument(skip(self, payload), fields(scenario = self.scenario_id))]
    pub async fn run(&mut self, payload: &[u8]) -> Result<MetricsSummary> {
        let rs = create_scheme(&self.config.rs_scheme())?;
        let lrc = create_scheme(&self.config.lrc_scheme())?;
        let mut collector = MetricsCollector::new(self.scenario_id, self.config.clone());

        let plan = match &self.directed {
            Some(nodes) => FailurePlan::Directed(nodes.clone()),
            None => FailurePlan::Random {
                count: self.config.failure_count,
            },
        };

        info!(scheme = %rs.config(), "starting RS phase");
        let rs_outcome = run_phase(
            rs.as_ref(),
            &mut self.cluster,
            &mut self.failures,
            &plan,
            payload,
        )?;
        collector.record(&rs_outcome);

        self.pace().await;

        let replay = FailurePlan::Directed(rs_outcome.failed_nodes.clone());
        info!(scheme = %lrc.config(), failed = ?rs_outcome.failed_nodes, "starting LRC phase");
        let lrc_outcome = run_phase(
            lrc.as_ref(),
            &mut self.cluster,
            &mut self.failures,
            &replay,
            payload,
        )?;
        collector.record(&lrc_outcome);

        collector.compare()?;
        Ok(collector.summary())
    }

    async fn pace(&self) {
        if self.config.phase_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.phase_delay_ms)).await;
        }
    }
}
