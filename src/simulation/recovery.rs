//! One scheme phase of a simulation run
//!
//! encode → distribute → fail → plan → reconstruct, in that order, on a
//! cluster that is reset first.

use crate::erasure::{erasure_pattern, fragmenter, ErasureScheme, RepairPlan, SchemeConfig};
use crate::simulation::failure::{FailurePlan, FailureSimulator};
use crate::storage::{Cluster, NodeId};
use crate::Result;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// What happened during one phase
#[derive(Debug, Clone)]
pub struct PhaseOutcome {
    pub scheme: SchemeConfig,
    pub scheme_name: String,
    pub payload_len: usize,
    pub fragment_size: usize,
    /// Nodes failed in this phase, ascending
    pub failed_nodes: Vec<NodeId>,
    /// Repair decision for the observed erasure pattern
    pub plan: RepairPlan,
    pub encoding_time: Duration,
    pub recovery_time: Duration,
    /// The payload was rebuilt
    pub success: bool,
    /// The rebuilt payload equals the original
    pub integrity: bool,
    /// Data-loss error reported by the decoder
    pub error: Option<String>,
}

/// Run one phase of `scheme` against `cluster`.
///
/// Data loss (too few fragments, uncorrectable pattern) is an outcome, not
/// an error; configuration and codec failures propagate.
#[instrument(skip_all, fields(scheme = %scheme.config()))]
pub fn run_phase(
    scheme: &dyn ErasureScheme,
    cluster: &mut Cluster,
    failures: &mut FailureSimulator,
    plan: &FailurePlan,
    payload: &[u8],
) -> Result<PhaseOutcome> {
    cluster.reset();

    let started = Instant::now();
    let fragments = scheme.encode(payload)?;
    let encoding_time = started.elapsed();

    let total = fragments.len();
    cluster.distribute(fragments)?;
    let failed_nodes = failures.inject(cluster, plan)?;

    let collected = cluster.collect(total);
    let repair_plan = scheme.plan(&erasure_pattern(&collected));

    let started = Instant::now();
    let decoded = scheme.decode_exact(&collected, payload.len());
    let recovery_time = started.elapsed();

    let (success, integrity, error) = match decoded {
        Ok(bytes) => (true, bytes == payload, None),
        Err(e) if e.is_data_loss() => {
            warn!(error = %e, "reconstruction failed");
            (false, false, Some(e.to_string()))
        }
        Err(e) => return Err(e),
    };

    info!(
        strategy = %repair_plan.strategy,
        reads = repair_plan.reads(),
        success,
        integrity,
        "phase complete"
    );

    Ok(PhaseOutcome {
        scheme: *scheme.config(),
        scheme_name: scheme.name(),
        payload_len: payload.len(),
        fragment_size: fragmenter::fragment_size(payload.len(), scheme.config().k),
        failed_nodes,
        plan: repair_plan,
        encoding_time,
        recovery_time,
        success,
        integrity,
        error,
    })
}
