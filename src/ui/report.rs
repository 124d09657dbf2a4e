//! Plain-text scenario report

use crate::metrics::{MetricsSummary, RecoveryMetrics};

/// One line per scheme with its repair path and costs
pub fn scheme_line(metrics: &RecoveryMetrics) -> String {
    let status = match (metrics.reconstruction_success, metrics.data_integrity) {
        (true, true) => "OK",
        (true, false) => "CORRUPT",
        (false, _) => "FAILED",
    };
    format!(
        "{:<34} {:<6} reads {:>2}/{:<2} bytes {:>6}  xor {:>7}  mult {:>7}  {:>8.3} ms  [{}]",
        metrics.scheme_name,
        metrics.strategy.to_string(),
        metrics.fragments_used,
        metrics.total_fragments,
        metrics.fragments_accessed_bytes,
        metrics.xor_operations,
        metrics.multiplication_operations,
        metrics.recovery_time,
        status
    )
}

/// Report block for one scenario
pub fn summary_lines(summary: &MetricsSummary) -> Vec<String> {
    let config = &summary.scenario_config;
    // Directed runs fail a fixed node list, not `failure_count` nodes
    let failures = summary
        .rs_metrics
        .as_ref()
        .map_or(config.failure_count, |rs| rs.failed_nodes.len());
    let mut lines = vec![format!(
        "Scenario {}: {} nodes, {} failure(s), RS({}, {}) vs LRC(k={}, group={}, global={})",
        summary.scenario_id,
        config.num_nodes,
        failures,
        config.rs_k,
        config.rs_r,
        config.lrc_k,
        config.lrc_group_size,
        config.lrc_global_parity
    )];

    if let Some(rs) = &summary.rs_metrics {
        lines.push(format!("  failed nodes {:?}", rs.failed_nodes));
    }
    for metrics in [&summary.rs_metrics, &summary.lrc_metrics].into_iter().flatten() {
        lines.push(format!("  {}", scheme_line(metrics)));
    }

    if let Some(comparison) = &summary.comparison {
        lines.push(format!(
            "  LRC saves {} nodes ({:.1}%), {} bytes ({:.1}%); xor ratio {:.4}, mult ratio {:.4}",
            comparison.nodes_saved.value,
            comparison.nodes_saved.percentage,
            comparison.bandwidth_saved.value,
            comparison.bandwidth_saved.percentage,
            comparison.xor_reduction_ratio,
            comparison.multiplication_reduction_ratio
        ));
    }
    lines
}

/// Print the report for every scenario to stdout
pub fn print_summaries(summaries: &[MetricsSummary]) {
    for summary in summaries {
        for line in summary_lines(summary) {
            println!("{}", line);
        }
        println!();
    }
    println!("Got results of {} scenarios", summaries.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{Simulator, DEFAULT_PAYLOAD};
    use crate::Config;

    async fn summary(failed_nodes: Vec<usize>) -> MetricsSummary {
        let config = Config {
            phase_delay_ms: 0,
            ..Config::default()
        };
        Simulator::new(config, 0)
            .unwrap()
            .with_failed_nodes(failed_nodes)
            .run(DEFAULT_PAYLOAD.as_bytes())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_header_counts_failed_nodes() {
        let lines = summary_lines(&summary(vec![0, 1, 2, 3]).await);
        assert!(lines[0].contains("10 nodes, 4 failure(s)"), "{}", lines[0]);
        assert!(lines[1].contains("[0, 1, 2, 3]"));
    }

    #[tokio::test]
    async fn test_summary_lines() {
        let lines = summary_lines(&summary(vec![1]).await);
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Scenario 0: 10 nodes, 1 failure(s), RS(6, 3)"));
        assert!(lines[1].contains("[1]"));
        assert!(lines[2].contains("Reed-Solomon (RS)") && lines[2].contains("Global"));
        assert!(lines[3].contains("Local") && lines[3].ends_with("[OK]"));
        assert!(lines[4].starts_with("  LRC saves 3 nodes (50.0%)"));
    }
}
