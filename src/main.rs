//! Erasure Coding Comparison - Main Application
//!
//! Runs flat Reed-Solomon and LRC side by side over a set of failure
//! scenarios, writes one JSON result file per scenario and prints a report.
//! `--dashboard` opens the results in a terminal chart afterwards.

use clap::Parser;
use erasure_compare::simulation::scenario::{self, ScenarioOverrides, ScenarioRunner};
use erasure_compare::simulation::DEFAULT_PAYLOAD;
use erasure_compare::ui::{report, ResultsDashboard};
use erasure_compare::{Config, Result};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Compare flat Reed-Solomon with Local Reconstruction Codes
#[derive(Parser, Debug)]
#[command(name = "erasure-compare", version, about, long_about = None)]
struct Args {
    /// Total number of storage nodes
    #[arg(long, env = "NUM_NODES", default_value = "10")]
    num_nodes: usize,

    /// Nodes failed in each phase
    #[arg(long, env = "FAILURE_COUNT", default_value = "1")]
    failure_count: usize,

    /// Reed-Solomon data fragments
    #[arg(long, env = "RS_K", default_value = "6")]
    rs_k: usize,

    /// Reed-Solomon parity fragments
    #[arg(long, env = "RS_R", default_value = "3")]
    rs_r: usize,

    /// LRC data fragments
    #[arg(long, env = "LRC_K", default_value = "6")]
    lrc_k: usize,

    /// Data fragments per LRC local group
    #[arg(long, env = "LRC_GROUP_SIZE", default_value = "3")]
    lrc_group_size: usize,

    /// Local parity fragments per LRC group
    #[arg(long, env = "LRC_LOCAL_PARITY", default_value = "1")]
    lrc_local_parity: usize,

    /// LRC global parity fragments
    #[arg(long, env = "LRC_GLOBAL_PARITY", default_value = "2")]
    lrc_global_parity: usize,

    /// Pause between the RS and LRC phases (0 disables it)
    #[arg(long, env = "PHASE_DELAY_MS", default_value = "10")]
    phase_delay_ms: u64,

    /// Run only the base configuration instead of the scenario set
    #[arg(long, conflicts_with = "scenarios")]
    single: bool,

    /// JSON file with an array of scenario overrides
    #[arg(long, env = "SCENARIOS_FILE")]
    scenarios: Option<PathBuf>,

    /// Directory for scenario_{i}.json result files
    #[arg(long, env = "RESULTS_DIR", default_value = "results")]
    results_dir: PathBuf,

    /// Load existing result files instead of running scenarios
    #[arg(long, conflicts_with_all = ["single", "scenarios"])]
    from_results: bool,

    /// Seed for random node failures
    #[arg(long, env = "SEED")]
    seed: Option<u64>,

    /// Fail exactly these nodes, comma separated
    #[arg(long, env = "FAILED_NODES", value_delimiter = ',')]
    failed_nodes: Vec<usize>,

    /// Payload text to encode
    #[arg(long, conflicts_with = "payload_file")]
    payload: Option<String>,

    /// File whose bytes are encoded
    #[arg(long)]
    payload_file: Option<PathBuf>,

    /// Open the results dashboard after the run
    #[arg(long)]
    dashboard: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            num_nodes: self.num_nodes,
            failure_count: self.failure_count,
            rs_k: self.rs_k,
            rs_r: self.rs_r,
            lrc_k: self.lrc_k,
            lrc_group_size: self.lrc_group_size,
            lrc_local_parity: self.lrc_local_parity,
            lrc_global_parity: self.lrc_global_parity,
            phase_delay_ms: self.phase_delay_ms,
        }
    }

    fn payload(&self) -> Result<Vec<u8>> {
        if let Some(path) = &self.payload_file {
            return Ok(std::fs::read(path)?);
        }
        Ok(self
            .payload
            .as_deref()
            .unwrap_or(DEFAULT_PAYLOAD)
            .as_bytes()
            .to_vec())
    }

    fn scenarios(&self) -> Result<Vec<ScenarioOverrides>> {
        if self.single {
            return Ok(vec![ScenarioOverrides::default()]);
        }
        match &self.scenarios {
            Some(path) => scenario::load_scenarios(path),
            None => Ok(scenario::builtin_scenarios()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let results = if args.from_results {
        scenario::load_results(&args.results_dir)?
    } else {
        let config = args.config();
        config.validate()?;
        info!(?config, "starting erasure coding comparison");

        let failed_nodes = (!args.failed_nodes.is_empty()).then(|| args.failed_nodes.clone());
        ScenarioRunner::new(config, args.scenarios()?, args.payload()?)
            .results_dir(&args.results_dir)
            .seed(args.seed)
            .failed_nodes(failed_nodes)
            .run()
            .await?
    };

    report::print_summaries(&results);

    if args.dashboard {
        let mut dashboard = ResultsDashboard::new(results)?;
        dashboard.run().await?;
    }

    Ok(())
}

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
