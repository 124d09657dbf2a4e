//! Scenario sets and result files
//!
//! A scenario is a set of overrides on the base configuration. The runner
//! validates each one, runs it and writes `scenario_{i}.json` into the
//! results directory.

use crate::metrics::MetricsSummary;
use crate::simulation::Simulator;
use crate::storage::NodeId;
use crate::{Config, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Per-scenario changes to the base configuration.
///
/// JSON keys use the environment spelling, e.g. `{"FAILURE_COUNT": 2}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct ScenarioOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_nodes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rs_k: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rs_r: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lrc_k: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lrc_group_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lrc_local_parity: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lrc_global_parity: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_delay_ms: Option<u64>,
}

/// The default comparison set
pub fn builtin_scenarios() -> Vec<ScenarioOverrides> {
    vec![
        // Good locality, one failure
        ScenarioOverrides {
            failure_count: Some(1),
            lrc_group_size: Some(3),
            lrc_global_parity: Some(2),
            ..Default::default()
        },
        // Stronger cross-group protection
        ScenarioOverrides {
            failure_count: Some(1),
            lrc_group_size: Some(3),
            lrc_global_parity: Some(3),
            num_nodes: Some(11),
            ..Default::default()
        },
        // One group of six, worst locality
        ScenarioOverrides {
            failure_count: Some(1),
            lrc_group_size: Some(6),
            lrc_global_parity: Some(2),
            ..Default::default()
        },
        // Two failures exercise the global parity
        ScenarioOverrides {
            failure_count: Some(2),
            lrc_group_size: Some(3),
            lrc_global_parity: Some(2),
            ..Default::default()
        },
    ]
}

/// Read a JSON array of scenario overrides
pub fn load_scenarios(path: impl AsRef<Path>) -> Result<Vec<ScenarioOverrides>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Path of the result file for scenario `id`
pub fn result_path(dir: impl AsRef<Path>, id: usize) -> PathBuf {
    dir.as_ref().join(format!("scenario_{}.json", id))
}

/// Read every `scenario_*.json` in `dir`, ordered by scenario id
pub fn load_results(dir: impl AsRef<Path>) -> Result<Vec<MetricsSummary>> {
    let mut results = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_result = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("scenario_") && n.ends_with(".json"));
        if !is_result {
            continue;
        }
        let contents = std::fs::read_to_string(&path)?;
        results.push(serde_json::from_str::<MetricsSummary>(&contents)?);
    }

    results.sort_by_key(|r| r.scenario_id);
    Ok(results)
}

/// Runs a list of scenarios and writes one result file per scenario
pub struct ScenarioRunner {
    base: Config,
    scenarios: Vec<ScenarioOverrides>,
    results_dir: PathBuf,
    payload: Vec<u8>,
    seed: Option<u64>,
    failed_nodes: Option<Vec<NodeId>>,
}

impl ScenarioRunner {
    pub fn new(base: Config, scenarios: Vec<ScenarioOverrides>, payload: Vec<u8>) -> Self {
        Self {
            base,
            scenarios,
            results_dir: PathBuf::from("results"),
            payload,
            seed: None,
            failed_nodes: None,
        }
    }

    pub fn results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    /// Seed for random failures; scenario `i` uses `seed + i`
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Fail exactly these nodes in every scenario
    pub fn failed_nodes(mut self, nodes: Option<Vec<NodeId>>) -> Self {
        self.failed_nodes = nodes;
        self
    }

    /// Configuration each scenario runs with
    pub fn configs(&self) -> Vec<Config> {
        self.scenarios
            .iter()
            .map(|s| self.base.with_overrides(s))
            .collect()
    }

    /// Run every scenario in order.
    ///
    /// Each configuration is validated before its run; the first invalid one
    /// stops the runner with a configuration error.
    #[instrument(skip(self), fields(scenarios = self.scenarios.len()))]
    pub async fn run(&self) -> Result<Vec<MetricsSummary>> {
        tokio::fs::create_dir_all(&self.results_dir).await?;

        let mut results = Vec::with_capacity(self.scenarios.len());
        for (i, config) in self.configs().into_iter().enumerate() {
            config.validate()?;

            let mut sim = Simulator::new(config, i)?;
            if let Some(seed) = self.seed {
                sim = sim.with_seed(seed.wrapping_add(i as u64));
            }
            if let Some(nodes) = &self.failed_nodes {
                sim = sim.with_failed_nodes(nodes.clone());
            }

            let summary = sim.run(&self.payload).await?;

            let path = result_path(&self.results_dir, i);
            tokio::fs::write(&path, serde_json::to_string_pretty(&summary)?).await?;
            info!(path = %path.display(), "wrote scenario results");

            results.push(summary);
        }
        Ok(results)
    }
}
