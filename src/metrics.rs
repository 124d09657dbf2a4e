//! Comparative cost figures for the two schemes
//!
//! Operation counts are estimates in bits touched (bytes * 8), following the
//! repair path the planner chose:
//!
//! | path        | XOR                      | GF(256) mult   |
//! |-------------|--------------------------|----------------|
//! | direct      | 0                        | 0              |
//! | local       | (group_size - 1) * fs * 8 | 0             |
//! | RS global   | r * fs * 8               | k * fs * 8     |
//! | LRC global  | xor groups + k * fs * 8  | k * fs * 8     |
//!
//! An LRC global repair first rebuilds its XOR groups at the local cost of
//! each group; the `k * fs * 8` terms apply only when the linear code still
//! has erasures to correct.

use crate::erasure::{RepairStrategy, SchemeKind};
use crate::simulation::recovery::PhaseOutcome;
use crate::{Config, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Metrics for one scheme's recovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryMetrics {
    pub scheme_name: String,
    pub total_fragments: usize,
    pub data_fragments: usize,
    pub parity_fragments: usize,
    pub fragments_required: usize,
    pub fragments_used: usize,
    pub failed_fragments: usize,
    pub failed_nodes: Vec<usize>,

    // Bandwidth (bytes)
    pub original_data_size: usize,
    pub total_fragment_size: usize,
    pub fragments_accessed_bytes: usize,
    pub bandwidth_efficiency: f64,

    // Computation (bit operations)
    pub xor_operations: u64,
    pub multiplication_operations: u64,

    // I/O
    pub nodes_contacted: usize,
    pub fragments_accessed: usize,

    // Time (ms)
    pub encoding_time: f64,
    pub recovery_time: f64,
    pub total_time: f64,

    pub reconstruction_success: bool,
    pub data_integrity: bool,
    pub strategy: RepairStrategy,
    pub local_repair_used: bool,
    pub global_repair_used: bool,
}

impl RecoveryMetrics {
    pub fn from_outcome(outcome: &PhaseOutcome) -> Self {
        let config = &outcome.scheme;
        let fs = outcome.fragment_size;
        let total = config.total_fragments();
        let total_fragment_size = total * fs;
        let fragments_used = outcome.plan.reads();

        let bits = |fragments: usize| (fragments * fs * 8) as u64;
        let (xor_operations, multiplication_operations) = match (outcome.plan.strategy, config.kind)
        {
            (RepairStrategy::Direct, _) => (0, 0),
            (RepairStrategy::Local, _) => (bits(config.group_size.saturating_sub(1)), 0),
            (RepairStrategy::Global, SchemeKind::FlatRs) => {
                (bits(config.global_parity_count), bits(config.k))
            }
            (RepairStrategy::Global, SchemeKind::Lrc) => {
                let xor_groups: usize = outcome
                    .plan
                    .xor_groups
                    .iter()
                    .map(|&g| config.group_members(g).len().saturating_sub(1))
                    .sum();
                let code = if outcome.plan.codeword_erasures > 0 {
                    config.k
                } else {
                    0
                };
                (bits(xor_groups + code), bits(code))
            }
        };

        let encoding_time = outcome.encoding_time.as_secs_f64() * 1000.0;
        let recovery_time = outcome.recovery_time.as_secs_f64() * 1000.0;

        Self {
            scheme_name: outcome.scheme_name.clone(),
            total_fragments: total,
            data_fragments: config.k,
            parity_fragments: total - config.k,
            fragments_required: config.k,
            fragments_used,
            failed_fragments: outcome.plan.erased.len(),
            failed_nodes: outcome.failed_nodes.clone(),
            original_data_size: outcome.payload_len,
            total_fragment_size,
            fragments_accessed_bytes: fragments_used * fs,
            bandwidth_efficiency: outcome.payload_len as f64 / total_fragment_size.max(1) as f64
                * 100.0,
            xor_operations,
            multiplication_operations,
            nodes_contacted: fragments_used,
            fragments_accessed: fragments_used,
            encoding_time,
            recovery_time,
            total_time: encoding_time + recovery_time,
            reconstruction_success: outcome.success,
            data_integrity: outcome.integrity,
            strategy: outcome.plan.strategy,
            local_repair_used: outcome.plan.strategy == RepairStrategy::Local,
            global_repair_used: outcome.plan.strategy == RepairStrategy::Global,
        }
    }
}

/// A saving of LRC over RS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Saving {
    pub value: f64,
    pub unit: String,
    pub percentage: f64,
}

impl Saving {
    fn new(rs: f64, lrc: f64, unit: &str, floor: f64) -> Self {
        Self {
            value: rs - lrc,
            unit: unit.to_string(),
            percentage: (rs - lrc) / rs.max(floor) * 100.0,
        }
    }
}

/// LRC relative to RS for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub scenario_id: usize,
    pub local_repair_used: bool,
    pub global_repair_used: bool,
    pub nodes_saved: Saving,
    pub bandwidth_saved: Saving,
    /// LRC XOR operations over RS XOR operations
    pub xor_reduction_ratio: f64,
    /// LRC multiplications over RS multiplications
    pub multiplication_reduction_ratio: f64,
    pub recovery_time_improvement: Saving,
}

/// Everything recorded for one scenario, as written to its result file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub scenario_id: usize,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    pub scenario_config: Config,
    pub rs_metrics: Option<RecoveryMetrics>,
    pub lrc_metrics: Option<RecoveryMetrics>,
    pub comparison: Option<Comparison>,
}

/// Collects both phases of a scenario and compares them
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    scenario_id: usize,
    scenario_config: Config,
    timestamp: f64,
    rs: Option<RecoveryMetrics>,
    lrc: Option<RecoveryMetrics>,
    comparison: Option<Comparison>,
}

impl MetricsCollector {
    pub fn new(scenario_id: usize, scenario_config: Config) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();

        Self {
            scenario_id,
            scenario_config,
            timestamp,
            rs: None,
            lrc: None,
            comparison: None,
        }
    }

    /// Record a phase under the scheme it ran
    pub fn record(&mut self, outcome: &PhaseOutcome) -> &RecoveryMetrics {
        let metrics = RecoveryMetrics::from_outcome(outcome);
        debug!(
            scheme = %metrics.scheme_name,
            fragments_used = metrics.fragments_used,
            bytes = metrics.fragments_accessed_bytes,
            "recorded metrics"
        );
        let slot = match outcome.scheme.kind {
            SchemeKind::FlatRs => &mut self.rs,
            SchemeKind::Lrc => &mut self.lrc,
        };
        slot.insert(metrics)
    }

    pub fn rs_metrics(&self) -> Option<&RecoveryMetrics> {
        self.rs.as_ref()
    }

    pub fn lrc_metrics(&self) -> Option<&RecoveryMetrics> {
        self.lrc.as_ref()
    }

    /// Compare LRC against RS; both phases must be recorded
    pub fn compare(&mut self) -> Result<&Comparison> {
        let (Some(rs), Some(lrc)) = (&self.rs, &self.lrc) else {
            return Err(Error::Configuration(
                "both RS and LRC metrics must be collected first".into(),
            ));
        };

        let comparison = Comparison {
            scenario_id: self.scenario_id,
            local_repair_used: lrc.local_repair_used,
            global_repair_used: lrc.global_repair_used,
            nodes_saved: Saving::new(
                rs.nodes_contacted as f64,
                lrc.nodes_contacted as f64,
                "nodes",
                1.0,
            ),
            bandwidth_saved: Saving::new(
                rs.fragments_accessed_bytes as f64,
                lrc.fragments_accessed_bytes as f64,
                "bytes",
                1.0,
            ),
            xor_reduction_ratio: round4(
                lrc.xor_operations as f64 / rs.xor_operations.max(1) as f64,
            ),
            multiplication_reduction_ratio: round4(
                lrc.multiplication_operations as f64 / rs.multiplication_operations.max(1) as f64,
            ),
            recovery_time_improvement: Saving::new(
                rs.recovery_time,
                lrc.recovery_time,
                "ms",
                0.001,
            ),
        };

        Ok(&*self.comparison.insert(comparison))
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            scenario_id: self.scenario_id,
            timestamp: self.timestamp,
            scenario_config: self.scenario_config.clone(),
            rs_metrics: self.rs.clone(),
            lrc_metrics: self.lrc.clone(),
            comparison: self.comparison.clone(),
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
