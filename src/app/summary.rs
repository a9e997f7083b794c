use crate::error::AppResult;
use crate::metrics::{RunStats, StatsSummary};

/// Prints the final statistics to stdout, as text lines or one JSON document.
pub(super) fn print_summary(stats: &RunStats, json: bool) -> AppResult<()> {
    let summary = stats.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    for line in summary_lines(&summary) {
        println!("{}", line);
    }
    Ok(())
}

fn summary_lines(summary: &StatsSummary) -> Vec<String> {
    let mut lines = vec![
        format!("Started: {}", summary.started_at.to_rfc3339()),
        format!("Duration: {:.2}s", summary.elapsed_secs),
        format!("Total Requests: {}", summary.total_requests),
        format!(
            "Successful: {} ({:.2}%)",
            summary.successful_requests,
            (1.0 - summary.error_rate) * 100.0
        ),
        format!(
            "Failed: {} ({:.2}%)",
            summary.failed_requests,
            summary.error_rate * 100.0
        ),
    ];

    if summary.failed_requests > 0 {
        let kinds = summary.failures_by_kind;
        lines.push(format!(
            "Failures: network {} / timeout {} / tls {} / protocol {} / other {}",
            kinds.network, kinds.timeout, kinds.tls, kinds.protocol, kinds.other
        ));
    }

    lines.push(format!("Avg RPS: {:.2}", summary.requests_per_sec));
    if let (Some(min), Some(avg), Some(max)) = (
        summary.latency_min_ms,
        summary.latency_avg_ms,
        summary.latency_max_ms,
    ) {
        lines.push(format!(
            "Latency min/avg/max: {:.1}ms / {:.1}ms / {:.1}ms",
            min, avg, max
        ));
    } else {
        lines.push("Latency: n/a (no successful requests)".to_owned());
    }
    lines.push(format!("Bytes Received: {}", summary.bytes_received));
    lines
}
